/* Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

use crate::client::{ConfigClient, LogClient, ProduceRequest, RecordAck};
use bytes::Bytes;
use loupe_common::{LoupeError, cleanup_policy_compacts};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Acknowledgement of a tombstone append.
///
/// `effective` is false when the topic's cleanup policy does not compact:
/// the broker accepted the record, but it will never actually remove the
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TombstoneAck {
    pub partition: u32,
    pub offset: u64,
    pub effective: bool,
}

impl fmt::Display for TombstoneAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.effective {
            write!(
                f,
                "tombstone appended to partition {} at offset {}; the key will be removed on the next compaction",
                self.partition, self.offset
            )
        } else {
            write!(
                f,
                "tombstone appended to partition {} at offset {}, but the topic's cleanup policy does not compact: the key will not be removed",
                self.partition, self.offset
            )
        }
    }
}

/// Appends records and tombstones, one synchronous round trip at a time.
///
/// Write failures are surfaced verbatim and never retried; the caller
/// decides whether to resubmit.
pub struct RecordWriter<C, K>
where
    C: LogClient + ?Sized,
    K: ConfigClient + ?Sized,
{
    log: Arc<C>,
    configs: Arc<K>,
}

impl<C, K> RecordWriter<C, K>
where
    C: LogClient + ?Sized,
    K: ConfigClient + ?Sized,
{
    pub fn new(log: Arc<C>, configs: Arc<K>) -> Self {
        Self { log, configs }
    }

    /// Append one record. An unset partition delegates placement to the
    /// broker's own partitioning (key hash, or round-robin without a key).
    pub async fn produce(&self, mut request: ProduceRequest) -> Result<RecordAck, LoupeError> {
        request
            .headers
            .retain(|key, value| !key.is_empty() && !value.is_empty());
        let ack = self.log.produce(request).await?;
        debug!("{ack}");
        Ok(ack)
    }

    /// Append a null-value record for the key so that compaction removes it.
    /// When the topic's cleanup policy does not compact, the append still
    /// succeeds at the protocol level and the returned ack says so.
    pub async fn tombstone(
        &self,
        topic: &str,
        partition: u32,
        key: Bytes,
    ) -> Result<TombstoneAck, LoupeError> {
        let entries = self.configs.find_by_topic(topic).await?;
        let effective = cleanup_policy_compacts(&entries);
        if !effective {
            warn!(
                "tombstoning a key on topic '{topic}' whose cleanup policy does not compact; the delete will not take effect"
            );
        }
        let ack = self
            .log
            .produce(ProduceRequest::tombstone(topic, partition, key))
            .await?;
        Ok(TombstoneAck {
            partition: ack.partition,
            offset: ack.offset,
            effective,
        })
    }
}
