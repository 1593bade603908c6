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
use std::time::Duration;

/// Read-path tuning shared by paging and search chunk fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound on a single broker round trip; an elapsed timeout counts
    /// as the broker being unavailable.
    pub fetch_timeout: Duration,
    /// Additional attempts after the first transient failure.
    pub max_fetch_retries: u32,
    /// Base delay between attempts, grows linearly per attempt.
    pub retry_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            max_fetch_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Which record fields the search predicate inspects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFields {
    pub key: bool,
    pub value: bool,
    pub headers: bool,
}

impl Default for SearchFields {
    fn default() -> Self {
        Self {
            key: true,
            value: true,
            headers: true,
        }
    }
}

/// Tuning for one search session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Records per chunk fetch; cancellation is observed between chunks, so
    /// this also bounds how long a worker keeps running after a cancel.
    pub chunk_size: usize,
    pub fetch: FetchConfig,
    /// Progress events are coalesced and emitted at most once per interval.
    pub progress_interval: Duration,
    /// Capacity of the bounded event buffers; overflowing the output buffer
    /// fails the session instead of buffering without bound.
    pub buffer_capacity: usize,
    /// Stop after this many matches. `None` scans to the end of the log.
    pub match_limit: Option<u64>,
    /// Wall-clock limit for the whole session.
    pub deadline: Option<Duration>,
    pub fields: SearchFields,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            fetch: FetchConfig::default(),
            progress_interval: Duration::from_millis(500),
            buffer_capacity: 64,
            match_limit: None,
            deadline: None,
            fields: SearchFields::default(),
        }
    }
}
