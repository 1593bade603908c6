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

use thiserror::Error;

/// The error type for every operation the explorer exposes.
///
/// Read-side anomalies that can be recovered (an offset outside the valid
/// range, a corrupt cursor token) are not surfaced through this enum at all;
/// callers only ever see the variants below when an operation actually
/// failed.
#[derive(Debug, Error)]
pub enum LoupeError {
    /// Topic does not exist on the broker.
    #[error("topic '{0}' was not found")]
    TopicNotFound(String),
    /// Partition does not exist within the topic.
    #[error("partition {partition} was not found in topic '{topic}'")]
    PartitionNotFound { topic: String, partition: u32 },
    /// Requested offset lies outside the partition's current range. Paging
    /// clamps instead of failing, so this surfaces only from client
    /// implementations that refuse to clamp themselves.
    #[error("offset {offset} is out of range [{earliest}, {latest}) for partition {partition}")]
    OffsetOutOfRange {
        partition: u32,
        offset: u64,
        earliest: u64,
        latest: u64,
    },
    /// The broker could not be reached. Transient: reads retry this with
    /// bounded backoff, writes surface it immediately.
    #[error("broker is unavailable: {0}")]
    BrokerUnavailable(String),
    /// Cursor token could not be decoded. Recovered by resetting to the
    /// default cursor; kept in the taxonomy for callers that decode strictly.
    #[error("invalid cursor token")]
    InvalidCursor,
    /// A write was rejected by the broker. Reported verbatim, never retried.
    #[error("failed to produce record: {0}")]
    Produce(String),
    /// The search event consumer fell behind the bounded output buffer.
    #[error("search consumer cannot keep up with the event stream")]
    SearchBackpressure,
    /// A single partition's scan failed after exhausting its retries. The
    /// search session continues with reduced coverage.
    #[error("search worker for partition {partition} failed: {source}")]
    SearchWorkerFailed {
        partition: u32,
        #[source]
        source: Box<LoupeError>,
    },
}

impl LoupeError {
    /// Transient errors are worth retrying on the read path.
    pub fn is_transient(&self) -> bool {
        matches!(self, LoupeError::BrokerUnavailable(_))
    }
}
