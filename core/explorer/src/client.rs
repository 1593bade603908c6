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

use async_trait::async_trait;
use bytes::Bytes;
use loupe_common::{ConfigEntry, LogDirEntry, LoupeError, Partition, Record};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use strum::{Display, EnumString};

/// Which side of the anchor a fetch window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FetchDirection {
    /// Read `[anchor, min(anchor + max, latest))`.
    Forward,
    /// Read `[max(earliest, anchor - max), anchor)`.
    Backward,
}

/// One record to append, with the broker free to pick the partition when
/// none is given (key hash, or round-robin for key-less records).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceRequest {
    pub topic: String,
    pub partition: Option<u32>,
    pub key: Option<Bytes>,
    /// `None` produces a tombstone.
    pub value: Option<Bytes>,
    pub headers: HashMap<String, String>,
    /// Overrides the broker-assigned timestamp when set (ms since epoch).
    pub timestamp: Option<u64>,
}

impl ProduceRequest {
    pub fn new(topic: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            key: None,
            value: Some(value.into()),
            headers: HashMap::new(),
            timestamp: None,
        }
    }

    pub fn tombstone(topic: impl Into<String>, partition: u32, key: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            partition: Some(partition),
            key: Some(key.into()),
            value: None,
            headers: HashMap::new(),
            timestamp: None,
        }
    }

    pub fn with_partition(mut self, partition: u32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Broker acknowledgement of a single append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordAck {
    pub partition: u32,
    pub offset: u64,
}

impl fmt::Display for RecordAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record appended to partition {} at offset {}",
            self.partition, self.offset
        )
    }
}

/// The broker's fetch, produce and offset-lookup primitives.
///
/// Implementations map these onto whatever wire protocol the broker speaks;
/// the engine only relies on the window semantics documented per method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Partition set with current offset bounds, fixed for one request.
    async fn list_partitions(&self, topic: &str) -> Result<Vec<Partition>, LoupeError>;

    async fn earliest_offset(&self, topic: &str, partition: u32) -> Result<u64, LoupeError> {
        let partitions = self.list_partitions(topic).await?;
        partitions
            .iter()
            .find(|p| p.id == partition)
            .map(|p| p.earliest_offset)
            .ok_or_else(|| LoupeError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            })
    }

    async fn latest_offset(&self, topic: &str, partition: u32) -> Result<u64, LoupeError> {
        let partitions = self.list_partitions(topic).await?;
        partitions
            .iter()
            .find(|p| p.id == partition)
            .map(|p| p.latest_offset)
            .ok_or_else(|| LoupeError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            })
    }

    /// Offset of the first record whose timestamp is `>= timestamp_ms`, or
    /// `None` when every record in the partition is older.
    async fn offset_for_timestamp(
        &self,
        topic: &str,
        partition: u32,
        timestamp_ms: u64,
    ) -> Result<Option<u64>, LoupeError>;

    /// Fetch up to `max_records` contiguous records on the given side of
    /// `anchor`, always returned in ascending offset order. An anchor outside
    /// the valid range is clamped by the implementation, never an error.
    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        anchor: u64,
        direction: FetchDirection,
        max_records: usize,
    ) -> Result<Vec<Record>, LoupeError>;

    /// Append one record. Synchronous round trip, no local batching.
    async fn produce(&self, request: ProduceRequest) -> Result<RecordAck, LoupeError>;
}

/// Topic configuration lookup, consumed only to decide whether a tombstone
/// will actually remove its key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigClient: Send + Sync {
    async fn find_by_topic(&self, topic: &str) -> Result<Vec<ConfigEntry>, LoupeError>;
}

/// Broker log-directory listing, consumed for size display only.
#[async_trait]
pub trait LogDirClient: Send + Sync {
    async fn list(&self) -> Result<Vec<LogDirEntry>, LoupeError>;

    async fn find_by_topic(&self, topic: &str) -> Result<Vec<LogDirEntry>, LoupeError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|entry| entry.topic == topic)
            .collect())
    }

    async fn find_by_broker(&self, broker_id: i32) -> Result<Vec<LogDirEntry>, LoupeError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|entry| entry.broker_id == broker_id)
            .collect())
    }
}
