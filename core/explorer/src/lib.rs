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

mod client;
mod configs;
mod cursor;
mod log_dirs;
mod page;
pub mod prelude;
mod retry;
mod search;
mod writer;

// Boundaries
pub use client::{ConfigClient, FetchDirection, LogClient, LogDirClient, ProduceRequest, RecordAck};
// Configuration
pub use configs::{FetchConfig, SearchConfig, SearchFields};
// Cursor & paging
pub use cursor::{Cursor, Direction, SortOrder};
pub use page::{Page, PageFetcher, PageNotice};
// Writes
pub use writer::{RecordWriter, TombstoneAck};
// Search
pub use search::{
    PartitionProgress, SearchEnd, SearchEvent, SearchExecutor, SearchMatch, SearchOutcome,
    SearchProgress, SearchSession,
};
// Size display plumbing
pub use log_dirs::{broker_size_bytes, partition_sizes, topic_size_bytes};
