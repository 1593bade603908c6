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

use serde::{Deserialize, Serialize};

/// One independently-offset, append-only sub-log of a topic.
///
/// Offsets form the half-open range `[earliest_offset, latest_offset)`:
/// `latest_offset` is exclusive and only ever grows as records are appended,
/// while `earliest_offset` can move forward when retention deletes from the
/// front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub id: u32,
    pub earliest_offset: u64,
    pub latest_offset: u64,
    pub size_bytes: u64,
}

impl Partition {
    pub fn record_count(&self) -> u64 {
        self.latest_offset.saturating_sub(self.earliest_offset)
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Clamp an offset into `[earliest, latest]`. The upper bound is
    /// inclusive here on purpose: `latest` is a valid scan frontier (nothing
    /// below it remains unread when descending).
    pub fn clamp_offset(&self, offset: u64) -> u64 {
        offset.clamp(self.earliest_offset, self.latest_offset)
    }
}

/// A topic as seen at query time: the partition set is fixed for the
/// lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub partitions: Vec<Partition>,
}

impl Topic {
    pub fn new(name: impl Into<String>, partitions: Vec<Partition>) -> Self {
        Self {
            name: name.into(),
            partitions,
        }
    }

    pub fn partition(&self, id: u32) -> Option<&Partition> {
        self.partitions.iter().find(|partition| partition.id == id)
    }

    pub fn record_count(&self) -> u64 {
        self.partitions.iter().map(Partition::record_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.partitions.iter().map(|partition| partition.size_bytes).sum()
    }
}
