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

use crate::client::{FetchDirection, LogClient};
use crate::configs::SearchConfig;
use crate::cursor::SortOrder;
use crate::retry::read_with_retries;
use crate::search::matcher::RecordMatcher;
use loupe_common::{LoupeError, Partition, Record};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerStatus {
    Completed,
    Cancelled,
    Failed,
}

/// What a worker reports to the aggregation point.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Progress {
        partition: u32,
        current_offset: u64,
        percent: f64,
    },
    Match {
        record: Record,
    },
    Done {
        partition: u32,
        status: WorkerStatus,
    },
}

/// One partition's sequential scan: bounded chunks, predicate evaluation,
/// progress after every chunk. Cancellation is observed between chunk
/// fetches, never mid-fetch, so a cancelled worker stops within one chunk
/// fetch latency.
pub(crate) struct SearchWorker<C: LogClient + ?Sized> {
    pub client: Arc<C>,
    pub config: Arc<SearchConfig>,
    pub matcher: Arc<RecordMatcher>,
    pub topic: String,
    pub partition: Partition,
    pub frontier: u64,
    pub sort: SortOrder,
    pub events: mpsc::Sender<WorkerEvent>,
    pub cancel: CancellationToken,
}

impl<C: LogClient + ?Sized> SearchWorker<C> {
    pub async fn run(mut self) {
        let partition = self.partition.id;
        let status = match self.scan().await {
            Ok(status) => status,
            Err(error) => {
                let failure = LoupeError::SearchWorkerFailed {
                    partition,
                    source: Box::new(error),
                };
                error!("{failure}");
                WorkerStatus::Failed
            }
        };
        debug!("search worker for partition {partition} finished: {status:?}");
        // The aggregator may already be gone when the session was dropped.
        let _ = self
            .events
            .send(WorkerEvent::Done { partition, status })
            .await;
    }

    async fn scan(&mut self) -> Result<WorkerStatus, LoupeError> {
        let partition = self.partition.id;
        let direction = match self.sort {
            SortOrder::Oldest => FetchDirection::Forward,
            SortOrder::Newest => FetchDirection::Backward,
        };
        // Bounds are snapshotted once: the denominator stays fixed while
        // producers append, which keeps percentages monotonic.
        let start = self.frontier;
        let (lower, upper) = match direction {
            FetchDirection::Forward => (start, self.partition.latest_offset),
            FetchDirection::Backward => (self.partition.earliest_offset, start),
        };
        let total = upper.saturating_sub(lower);

        loop {
            if self.cancel.is_cancelled() {
                return Ok(WorkerStatus::Cancelled);
            }
            let remaining = match direction {
                FetchDirection::Forward => upper.saturating_sub(self.frontier),
                FetchDirection::Backward => self.frontier.saturating_sub(lower),
            };
            if remaining == 0 {
                if !self.report_progress(partition, 100.0).await {
                    return Ok(WorkerStatus::Cancelled);
                }
                return Ok(WorkerStatus::Completed);
            }

            let chunk_size = (self.config.chunk_size as u64).min(remaining) as usize;
            let anchor = self.frontier;
            let chunk = read_with_retries(&self.config.fetch, || {
                self.client
                    .fetch(&self.topic, partition, anchor, direction, chunk_size)
            })
            .await?;
            if chunk.is_empty() {
                // The range shrank under us (retention); nothing left here.
                self.frontier = match direction {
                    FetchDirection::Forward => upper,
                    FetchDirection::Backward => lower,
                };
                continue;
            }

            match direction {
                FetchDirection::Forward => {
                    for record in chunk.iter() {
                        if !self.inspect(record).await {
                            return Ok(WorkerStatus::Cancelled);
                        }
                    }
                }
                FetchDirection::Backward => {
                    for record in chunk.iter().rev() {
                        if !self.inspect(record).await {
                            return Ok(WorkerStatus::Cancelled);
                        }
                    }
                }
            }

            self.frontier = match direction {
                FetchDirection::Forward => chunk.last().map(|r| r.offset + 1).unwrap_or(upper),
                FetchDirection::Backward => chunk.first().map(|r| r.offset).unwrap_or(lower),
            };
            let scanned = match direction {
                FetchDirection::Forward => self.frontier.saturating_sub(start),
                FetchDirection::Backward => start.saturating_sub(self.frontier),
            };
            let percent = ((scanned as f64 / total as f64) * 100.0).min(100.0);
            if !self.report_progress(partition, percent).await {
                return Ok(WorkerStatus::Cancelled);
            }
        }
    }

    /// False when the aggregation point is gone, which only happens on
    /// session teardown.
    async fn inspect(&self, record: &Record) -> bool {
        if !self.matcher.matches(record) {
            return true;
        }
        self.events
            .send(WorkerEvent::Match {
                record: record.clone(),
            })
            .await
            .is_ok()
    }

    async fn report_progress(&self, partition: u32, percent: f64) -> bool {
        self.events
            .send(WorkerEvent::Progress {
                partition,
                current_offset: self.frontier,
                percent,
            })
            .await
            .is_ok()
    }
}
