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

use loupe_common::Record;
use serde::Serialize;
use std::collections::BTreeMap;

/// How far one partition's scan has progressed. `percent` is monotonically
/// non-decreasing until the worker for the partition terminates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartitionProgress {
    pub current_offset: u64,
    pub percent: f64,
}

/// Coalesced progress across every partition in scope: the most recent value
/// per partition wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchProgress {
    pub partitions: BTreeMap<u32, PartitionProgress>,
}

/// One matching record, tagged with the per-partition offsets at the time of
/// the match — enough cursor state to resume or bound a follow-up scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub record: Record,
    pub offsets: BTreeMap<u32, u64>,
}

/// Terminal state of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Every worker reached the end of its range.
    Completed,
    /// The session was cancelled: explicitly, by consumer disconnect, or by
    /// a configured match/time limit.
    Cancelled,
    /// Every worker failed. Partial failures leave the session Completed or
    /// Cancelled, with the affected partitions listed in `failed_partitions`.
    Failed,
}

/// The single terminal event of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEnd {
    pub outcome: SearchOutcome,
    pub offsets: BTreeMap<u32, u64>,
    pub progress: SearchProgress,
    pub matches: u64,
    pub failed_partitions: Vec<u32>,
}

/// Typed events pushed to the search consumer, in order. `End` is
/// session-terminal: nothing follows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    Progress(SearchProgress),
    Match(SearchMatch),
    End(SearchEnd),
}
