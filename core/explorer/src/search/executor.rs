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

//! The concurrent multi-partition search executor.
//!
//! One worker task per partition scans bounded chunks and reports into a
//! single aggregator task, which coalesces progress, tags matches with the
//! offsets map at time of match, enforces match/time limits and emits
//! exactly one terminal `End` event once every worker finished. The caller
//! consumes everything through a bounded [`SearchSession`] stream; a
//! consumer that falls behind fails the session instead of buffering without
//! bound.

use crate::client::LogClient;
use crate::configs::SearchConfig;
use crate::cursor::Cursor;
use crate::page::resolve_scan;
use crate::search::events::{
    PartitionProgress, SearchEnd, SearchEvent, SearchMatch, SearchOutcome, SearchProgress,
};
use crate::search::matcher::RecordMatcher;
use crate::search::worker::{SearchWorker, WorkerEvent, WorkerStatus};
use ahash::AHashMap;
use futures::Stream;
use loupe_common::LoupeError;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct ScopeEntry {
    session_id: u64,
    token: CancellationToken,
}

type ScopeRegistry = Arc<Mutex<AHashMap<String, ScopeEntry>>>;

/// Runs cancellable keyword scans over a topic, one session at a time per
/// logical scope: starting a scope's search cancels the scope's previous
/// session first.
pub struct SearchExecutor<C: LogClient + ?Sized> {
    client: Arc<C>,
    config: SearchConfig,
    scopes: ScopeRegistry,
    session_ids: AtomicU64,
}

impl<C: LogClient + ?Sized + 'static> SearchExecutor<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self::with_config(client, SearchConfig::default())
    }

    pub fn with_config(client: Arc<C>, config: SearchConfig) -> Self {
        Self {
            client,
            config,
            scopes: Arc::new(Mutex::new(AHashMap::new())),
            session_ids: AtomicU64::new(0),
        }
    }

    /// Start a session scanning every partition the cursor selects, from the
    /// cursor's frontiers in the cursor's sort direction, matching the
    /// cursor's query.
    pub async fn start(
        &self,
        scope: &str,
        topic: &str,
        cursor: &Cursor,
    ) -> Result<SearchSession, LoupeError> {
        let resolved = resolve_scan(self.client.as_ref(), &self.config.fetch, topic, cursor).await?;
        let matcher = Arc::new(RecordMatcher::new(
            cursor.query.as_deref().unwrap_or(""),
            self.config.fields,
        ));

        let token = CancellationToken::new();
        let session_id = self.session_ids.fetch_add(1, Ordering::Relaxed);
        {
            let mut scopes = self.scopes.lock().expect("scope registry lock");
            let entry = ScopeEntry {
                session_id,
                token: token.clone(),
            };
            if let Some(previous) = scopes.insert(scope.to_string(), entry) {
                debug!("cancelling previous search session for scope '{scope}'");
                previous.token.cancel();
            }
        }

        let capacity = self.config.buffer_capacity.max(1);
        let (worker_tx, worker_rx) = mpsc::channel(capacity);
        let (out_tx, out_rx) = mpsc::channel(capacity);
        let config = Arc::new(self.config.clone());

        let mut offsets = BTreeMap::new();
        let mut progress = SearchProgress::default();
        for partition in &resolved.partitions {
            let frontier = resolved.frontiers[&partition.id];
            offsets.insert(partition.id, frontier);
            progress.partitions.insert(
                partition.id,
                PartitionProgress {
                    current_offset: frontier,
                    percent: 0.0,
                },
            );
            let worker = SearchWorker {
                client: Arc::clone(&self.client),
                config: Arc::clone(&config),
                matcher: Arc::clone(&matcher),
                topic: topic.to_string(),
                partition: *partition,
                frontier,
                sort: cursor.sort,
                events: worker_tx.clone(),
                cancel: token.clone(),
            };
            tokio::spawn(worker.run());
        }
        // Closing the last sender lets the aggregator observe worker exits
        // even if a Done message got lost.
        drop(worker_tx);

        debug!(
            "search session {session_id} started on topic '{topic}' with {} workers",
            resolved.partitions.len()
        );

        let aggregator = Aggregator {
            worker_rx,
            out_tx,
            token: token.clone(),
            config,
            scopes: Arc::clone(&self.scopes),
            scope: scope.to_string(),
            session_id,
            worker_count: resolved.partitions.len(),
            remaining_workers: resolved.partitions.len(),
            offsets,
            progress,
            matches: 0,
            failed_partitions: Vec::new(),
        };
        tokio::spawn(aggregator.run());

        Ok(SearchSession {
            events: out_rx,
            token,
        })
    }
}

/// Single consumer of all worker outputs, producing the caller-facing event
/// stream.
struct Aggregator {
    worker_rx: mpsc::Receiver<WorkerEvent>,
    out_tx: mpsc::Sender<Result<SearchEvent, LoupeError>>,
    token: CancellationToken,
    config: Arc<SearchConfig>,
    scopes: ScopeRegistry,
    scope: String,
    session_id: u64,
    worker_count: usize,
    remaining_workers: usize,
    offsets: BTreeMap<u32, u64>,
    progress: SearchProgress,
    matches: u64,
    failed_partitions: Vec<u32>,
}

impl Aggregator {
    async fn run(mut self) {
        self.drive().await;
        self.token.cancel();
        let mut scopes = self.scopes.lock().expect("scope registry lock");
        if let Some(entry) = scopes.get(&self.scope) {
            if entry.session_id == self.session_id {
                scopes.remove(&self.scope);
            }
        }
    }

    async fn drive(&mut self) {
        let mut ticker = interval(self.config.progress_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut deadline = self.config.deadline.map(|limit| Instant::now() + limit);
        let mut progress_dirty = false;

        while self.remaining_workers > 0 {
            tokio::select! {
                event = self.worker_rx.recv() => {
                    let Some(event) = event else { break };
                    match event {
                        WorkerEvent::Progress { partition, current_offset, percent } => {
                            self.offsets.insert(partition, current_offset);
                            let entry = self
                                .progress
                                .partitions
                                .entry(partition)
                                .or_insert(PartitionProgress { current_offset, percent: 0.0 });
                            entry.current_offset = current_offset;
                            entry.percent = entry.percent.max(percent);
                            progress_dirty = true;
                        }
                        WorkerEvent::Match { record } => {
                            let limit = self.config.match_limit;
                            if limit.is_some_and(|limit| self.matches >= limit) {
                                // Matches already queued when the limit was
                                // hit are dropped, keeping the cap exact.
                                continue;
                            }
                            self.offsets.insert(record.partition, record.offset);
                            self.matches += 1;
                            let event = SearchEvent::Match(SearchMatch {
                                record,
                                offsets: self.offsets.clone(),
                            });
                            if !self.emit(event).await {
                                return;
                            }
                            if limit.is_some_and(|limit| self.matches >= limit) {
                                debug!("match limit reached, cancelling search session {}", self.session_id);
                                self.token.cancel();
                            }
                        }
                        WorkerEvent::Done { partition, status } => {
                            self.remaining_workers -= 1;
                            if status == WorkerStatus::Failed {
                                self.failed_partitions.push(partition);
                            }
                        }
                    }
                }
                _ = ticker.tick(), if progress_dirty => {
                    progress_dirty = false;
                    if !self.emit(SearchEvent::Progress(self.progress.clone())).await {
                        return;
                    }
                }
                _ = async {
                    match deadline {
                        Some(at) => sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                }, if deadline.is_some() => {
                    debug!("deadline reached, cancelling search session {}", self.session_id);
                    deadline = None;
                    self.token.cancel();
                }
            }
        }

        self.failed_partitions.sort_unstable();
        let outcome = if self.worker_count > 0 && self.failed_partitions.len() == self.worker_count
        {
            SearchOutcome::Failed
        } else if self.token.is_cancelled() {
            SearchOutcome::Cancelled
        } else {
            SearchOutcome::Completed
        };
        let end = SearchEnd {
            outcome,
            offsets: std::mem::take(&mut self.offsets),
            progress: std::mem::take(&mut self.progress),
            matches: self.matches,
            failed_partitions: std::mem::take(&mut self.failed_partitions),
        };
        // The terminal event is delivered with a blocking send: it must not
        // be lost to a momentarily full buffer.
        let _ = self.out_tx.send(Ok(SearchEvent::End(end))).await;
    }

    /// False when emission must stop: the consumer fell behind (session
    /// failed with a terminal error) or went away entirely.
    async fn emit(&mut self, event: SearchEvent) -> bool {
        match self.out_tx.try_send(Ok(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    "search session {} consumer fell behind, failing the stream",
                    self.session_id
                );
                self.token.cancel();
                let _ = self.out_tx.send(Err(LoupeError::SearchBackpressure)).await;
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.token.cancel();
                false
            }
        }
    }
}

/// One live search session. Dropping it cancels every worker; the workers
/// observe the cancellation at their next chunk boundary.
pub struct SearchSession {
    events: mpsc::Receiver<Result<SearchEvent, LoupeError>>,
    token: CancellationToken,
}

impl SearchSession {
    /// Next event, or `None` once the stream is finished. An `Err` item is
    /// terminal, like `End`.
    pub async fn recv(&mut self) -> Option<Result<SearchEvent, LoupeError>> {
        self.events.recv().await
    }

    /// Cooperatively stop every worker. The terminal `End` event is still
    /// delivered.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Stream for SearchSession {
    type Item = Result<SearchEvent, LoupeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
