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

//! Cursor-driven paging over a set of independently-offset partitions.
//!
//! One page is assembled by fetching a bounded window per selected
//! partition, merging the windows in global (timestamp, partition, offset)
//! order and trimming to the page size. Because the merge always consumes a
//! contiguous prefix of each partition window, the outgoing cursors describe
//! the page boundary exactly: walking a topic page by page visits every
//! record exactly once, in order, with no gaps and no duplicates.

use crate::client::{FetchDirection, LogClient};
use crate::configs::FetchConfig;
use crate::cursor::{Cursor, Direction, SortOrder};
use crate::retry::read_with_retries;
use ahash::AHashMap;
use futures::future::try_join_all;
use loupe_common::{LoupeError, Partition, Record};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Non-fatal anomaly observed while serving a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageNotice {
    /// The cursor pointed outside the partition's current offset range,
    /// typically after retention deleted from the front of the log. The scan
    /// continued from the nearest valid bound.
    OffsetClamped {
        partition: u32,
        requested: u64,
        clamped_to: u64,
    },
}

/// One page of records plus the cursors bounding it.
#[derive(Debug, Clone)]
pub struct Page {
    /// Fully ordered according to the cursor's sort order.
    pub records: Vec<Record>,
    /// Re-opens the records immediately preceding this page.
    pub prev: Cursor,
    /// Continues immediately after this page.
    pub next: Cursor,
    pub notices: Vec<PageNotice>,
}

/// The partition set and per-partition frontiers a cursor resolves to for
/// one topic, shared between paging and search.
pub(crate) struct ResolvedScan {
    pub partitions: Vec<Partition>,
    pub frontiers: AHashMap<u32, u64>,
    pub notices: Vec<PageNotice>,
}

/// Resolve the cursor against the topic's current partition bounds: apply
/// the partition filter, then turn stored positions, a timestamp seek or the
/// sort order default into one clamped frontier per partition.
pub(crate) async fn resolve_scan<C>(
    client: &C,
    config: &FetchConfig,
    topic: &str,
    cursor: &Cursor,
) -> Result<ResolvedScan, LoupeError>
where
    C: LogClient + ?Sized,
{
    let all_partitions = read_with_retries(config, || client.list_partitions(topic)).await?;
    if let Some(filtered) = cursor.partition {
        if !all_partitions.iter().any(|p| p.id == filtered) {
            return Err(LoupeError::PartitionNotFound {
                topic: topic.to_string(),
                partition: filtered,
            });
        }
    }
    let partitions: Vec<Partition> = all_partitions
        .into_iter()
        .filter(|p| cursor.selects(p.id))
        .collect();

    let mut frontiers = AHashMap::with_capacity(partitions.len());
    let mut notices = Vec::new();
    for partition in &partitions {
        let id = partition.id;
        let frontier = match cursor.positions.get(&id) {
            Some(&requested) => {
                let clamped = partition.clamp_offset(requested);
                if clamped != requested {
                    let error = LoupeError::OffsetOutOfRange {
                        partition: id,
                        offset: requested,
                        earliest: partition.earliest_offset,
                        latest: partition.latest_offset,
                    };
                    warn!("{error}; continuing from {clamped}");
                    notices.push(PageNotice::OffsetClamped {
                        partition: id,
                        requested,
                        clamped_to: clamped,
                    });
                }
                clamped
            }
            None => match cursor.timestamp {
                Some(timestamp) => {
                    let seeked = read_with_retries(config, || {
                        client.offset_for_timestamp(topic, id, timestamp)
                    })
                    .await?;
                    // Past-the-end timestamps land on the latest frontier:
                    // nothing newer exists for Oldest, everything is older
                    // for Newest.
                    partition.clamp_offset(seeked.unwrap_or(partition.latest_offset))
                }
                None => match cursor.sort {
                    SortOrder::Newest => partition.latest_offset,
                    SortOrder::Oldest => partition.earliest_offset,
                },
            },
        };
        frontiers.insert(id, frontier);
    }

    Ok(ResolvedScan {
        partitions,
        frontiers,
        notices,
    })
}

/// The offset direction a scan walks in, given the presentation order and
/// whether the cursor continues forward or re-opens the previous page.
pub(crate) fn scan_direction(sort: SortOrder, direction: Direction) -> FetchDirection {
    match (sort, direction) {
        (SortOrder::Oldest, Direction::Forward) | (SortOrder::Newest, Direction::Backward) => {
            FetchDirection::Forward
        }
        (SortOrder::Newest, Direction::Forward) | (SortOrder::Oldest, Direction::Backward) => {
            FetchDirection::Backward
        }
    }
}

/// Global record order: timestamp, ties broken by partition id, then offset.
pub(crate) fn sort_key(record: &Record) -> (u64, u32, u64) {
    (record.timestamp, record.partition, record.offset)
}

/// Merge per-partition windows (each in ascending offset order) into one
/// page in global scan order, consuming a contiguous prefix of every window.
/// Returns the merged records and the inclusive consumed offset range per
/// partition.
fn merge_windows(
    windows: Vec<(u32, Vec<Record>)>,
    scan: FetchDirection,
    page_size: usize,
) -> (Vec<Record>, AHashMap<u32, (u64, u64)>) {
    let mut buffers: Vec<VecDeque<Record>> = windows
        .into_iter()
        .map(|(_, mut window)| {
            if scan == FetchDirection::Backward {
                window.reverse();
            }
            VecDeque::from(window)
        })
        .collect();

    let mut records = Vec::with_capacity(page_size);
    let mut consumed: AHashMap<u32, (u64, u64)> = AHashMap::new();
    while records.len() < page_size {
        let mut best: Option<(usize, (u64, u32, u64))> = None;
        for (index, buffer) in buffers.iter().enumerate() {
            if let Some(head) = buffer.front() {
                let key = sort_key(head);
                let better = match best {
                    None => true,
                    Some((_, best_key)) => match scan {
                        FetchDirection::Forward => key < best_key,
                        FetchDirection::Backward => key > best_key,
                    },
                };
                if better {
                    best = Some((index, key));
                }
            }
        }
        let Some((index, _)) = best else {
            break;
        };
        let Some(record) = buffers[index].pop_front() else {
            break;
        };
        consumed
            .entry(record.partition)
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(record.offset);
                *hi = (*hi).max(record.offset);
            })
            .or_insert((record.offset, record.offset));
        records.push(record);
    }
    (records, consumed)
}

/// Pulls one page of records merged across the partitions a cursor selects.
///
/// Stateless across requests: every page independently re-fetches through
/// the client, and a failed fetch aborts the whole page with no partial
/// cursor advance.
pub struct PageFetcher<C: LogClient + ?Sized> {
    client: Arc<C>,
    config: FetchConfig,
}

impl<C: LogClient + ?Sized> PageFetcher<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_config(client, FetchConfig::default())
    }

    pub fn with_config(client: Arc<C>, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch_page(
        &self,
        topic: &str,
        cursor: &Cursor,
        page_size: usize,
    ) -> Result<Page, LoupeError> {
        let resolved = resolve_scan(self.client.as_ref(), &self.config, topic, cursor).await?;
        if page_size == 0 {
            return Ok(Page {
                records: Vec::new(),
                prev: cursor.clone(),
                next: cursor.clone(),
                notices: resolved.notices,
            });
        }

        let scan = scan_direction(cursor.sort, cursor.direction);
        let fetches = resolved.partitions.iter().map(|partition| {
            let id = partition.id;
            let anchor = resolved.frontiers[&id];
            async move {
                let window = read_with_retries(&self.config, || {
                    self.client.fetch(topic, id, anchor, scan, page_size)
                })
                .await?;
                Ok::<_, LoupeError>((id, window))
            }
        });
        let windows = try_join_all(fetches).await?;

        let (mut records, consumed) = merge_windows(windows, scan, page_size);
        debug!(
            "fetched page of {} records from topic '{topic}' across {} partitions",
            records.len(),
            resolved.partitions.len()
        );

        if records.is_empty() {
            // Exhausted in this direction; both cursors stay put so repeated
            // calls are stable.
            return Ok(Page {
                records,
                prev: cursor.clone(),
                next: cursor.clone(),
                notices: resolved.notices,
            });
        }

        let mut next = Cursor {
            positions: Default::default(),
            sort: cursor.sort,
            direction: Direction::Forward,
            partition: cursor.partition,
            timestamp: cursor.timestamp,
            query: cursor.query.clone(),
        };
        let mut prev = Cursor {
            direction: Direction::Backward,
            ..next.clone()
        };
        for partition in &resolved.partitions {
            let frontier = resolved.frontiers[&partition.id];
            let (next_frontier, prev_frontier) = match consumed.get(&partition.id) {
                Some(&(lo, hi)) => match cursor.sort {
                    SortOrder::Oldest => (hi + 1, lo),
                    SortOrder::Newest => (lo, hi + 1),
                },
                None => (frontier, frontier),
            };
            next.positions.insert(partition.id, next_frontier);
            prev.positions.insert(partition.id, prev_frontier);
        }

        match cursor.sort {
            SortOrder::Oldest => records.sort_by_key(|record| sort_key(record)),
            SortOrder::Newest => records.sort_by(|a, b| sort_key(b).cmp(&sort_key(a))),
        }

        Ok(Page {
            records,
            prev,
            next,
            notices: resolved.notices,
        })
    }
}
