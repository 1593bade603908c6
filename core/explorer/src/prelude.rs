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

//! Prelude module for the loupe explorer.
//!
//! Re-exports the most common types and traits so that one import brings in
//! everything needed to browse, produce and search.
//!
//! # Examples
//!
//! ```
//! use loupe::prelude::*;
//! ```

pub use loupe_common::{
    CLEANUP_POLICY_KEY, ConfigEntry, LogDirEntry, LoupeError, Partition, Record, Topic,
    cleanup_policy_compacts, now_ms,
};

pub use crate::{
    ConfigClient, Cursor, Direction, FetchConfig, FetchDirection, LogClient, LogDirClient, Page,
    PageFetcher, PageNotice, PartitionProgress, ProduceRequest, RecordAck, RecordWriter,
    SearchConfig, SearchEnd, SearchEvent, SearchExecutor, SearchFields, SearchMatch,
    SearchOutcome, SearchProgress, SearchSession, SortOrder, TombstoneAck, broker_size_bytes,
    partition_sizes, topic_size_bytes,
};
