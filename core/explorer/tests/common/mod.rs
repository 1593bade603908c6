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

#![allow(dead_code)]

//! In-process broker fake shared by the scenario tests. Behaves like a real
//! broker over the client boundaries: contiguous offsets per partition,
//! half-open ranges, key-hash partitioning, clamped fetch windows, plus
//! knobs for injecting latency, outages and retention.

use async_trait::async_trait;
use bytes::Bytes;
use loupe::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Default)]
struct PartitionLog {
    earliest: u64,
    next_offset: u64,
    records: Vec<Record>,
}

#[derive(Default)]
pub struct FakeBroker {
    topics: Mutex<HashMap<String, Vec<PartitionLog>>>,
    round_robin: Mutex<u64>,
    /// Added before every fetch, for cancellation-latency tests.
    fetch_delay: Mutex<Option<Duration>>,
    /// Partitions whose fetches always fail.
    failing_partitions: Mutex<HashSet<u32>>,
    /// Fail this many fetches before recovering.
    unavailable_fetches: Mutex<u32>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_topic(&self, topic: &str, partition_count: u32) {
        let mut topics = self.topics.lock().unwrap();
        topics.insert(
            topic.to_string(),
            (0..partition_count).map(|_| PartitionLog::default()).collect(),
        );
    }

    /// Append one record with an explicit timestamp, returning its offset.
    pub fn append_at(
        &self,
        topic: &str,
        partition: u32,
        key: Option<&str>,
        value: &str,
        timestamp: u64,
    ) -> u64 {
        let mut topics = self.topics.lock().unwrap();
        let log = &mut topics.get_mut(topic).unwrap()[partition as usize];
        let offset = log.next_offset;
        log.records.push(Record {
            partition,
            offset,
            timestamp,
            key: key.map(|k| Bytes::copy_from_slice(k.as_bytes())),
            value: Some(Bytes::copy_from_slice(value.as_bytes())),
            headers: HashMap::new(),
        });
        log.next_offset += 1;
        offset
    }

    /// Simulate retention deleting from the front of a partition.
    pub fn advance_earliest(&self, topic: &str, partition: u32, new_earliest: u64) {
        let mut topics = self.topics.lock().unwrap();
        let log = &mut topics.get_mut(topic).unwrap()[partition as usize];
        log.records.retain(|record| record.offset >= new_earliest);
        log.earliest = new_earliest.min(log.next_offset);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_partition(&self, partition: u32) {
        self.failing_partitions.lock().unwrap().insert(partition);
    }

    pub fn fail_next_fetches(&self, count: u32) {
        *self.unavailable_fetches.lock().unwrap() = count;
    }

    fn pick_partition(&self, request: &ProduceRequest, partition_count: u64) -> u32 {
        if let Some(partition) = request.partition {
            return partition;
        }
        match &request.key {
            Some(key) => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                (hasher.finish() % partition_count) as u32
            }
            None => {
                let mut counter = self.round_robin.lock().unwrap();
                *counter += 1;
                ((*counter - 1) % partition_count) as u32
            }
        }
    }
}

#[async_trait]
impl LogClient for FakeBroker {
    async fn list_partitions(&self, topic: &str) -> Result<Vec<Partition>, LoupeError> {
        let topics = self.topics.lock().unwrap();
        let logs = topics
            .get(topic)
            .ok_or_else(|| LoupeError::TopicNotFound(topic.to_string()))?;
        Ok(logs
            .iter()
            .enumerate()
            .map(|(id, log)| Partition {
                id: id as u32,
                earliest_offset: log.earliest,
                latest_offset: log.next_offset,
                size_bytes: log
                    .records
                    .iter()
                    .map(|r| r.value.as_ref().map(|v| v.len() as u64).unwrap_or(0))
                    .sum(),
            })
            .collect())
    }

    async fn offset_for_timestamp(
        &self,
        topic: &str,
        partition: u32,
        timestamp_ms: u64,
    ) -> Result<Option<u64>, LoupeError> {
        let topics = self.topics.lock().unwrap();
        let logs = topics
            .get(topic)
            .ok_or_else(|| LoupeError::TopicNotFound(topic.to_string()))?;
        let log = logs
            .get(partition as usize)
            .ok_or_else(|| LoupeError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            })?;
        Ok(log
            .records
            .iter()
            .find(|record| record.timestamp >= timestamp_ms)
            .map(|record| record.offset))
    }

    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        anchor: u64,
        direction: FetchDirection,
        max_records: usize,
    ) -> Result<Vec<Record>, LoupeError> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        {
            let mut unavailable = self.unavailable_fetches.lock().unwrap();
            if *unavailable > 0 {
                *unavailable -= 1;
                return Err(LoupeError::BrokerUnavailable("injected outage".into()));
            }
        }
        if self.failing_partitions.lock().unwrap().contains(&partition) {
            return Err(LoupeError::BrokerUnavailable(format!(
                "partition {partition} is down"
            )));
        }

        let topics = self.topics.lock().unwrap();
        let logs = topics
            .get(topic)
            .ok_or_else(|| LoupeError::TopicNotFound(topic.to_string()))?;
        let log = logs
            .get(partition as usize)
            .ok_or_else(|| LoupeError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            })?;

        let anchor = anchor.clamp(log.earliest, log.next_offset);
        let (low, high) = match direction {
            FetchDirection::Forward => (
                anchor,
                anchor.saturating_add(max_records as u64).min(log.next_offset),
            ),
            FetchDirection::Backward => (
                anchor.saturating_sub(max_records as u64).max(log.earliest),
                anchor,
            ),
        };
        Ok(log
            .records
            .iter()
            .filter(|record| record.offset >= low && record.offset < high)
            .cloned()
            .collect())
    }

    async fn produce(&self, request: ProduceRequest) -> Result<RecordAck, LoupeError> {
        let partition_count = {
            let topics = self.topics.lock().unwrap();
            topics
                .get(&request.topic)
                .ok_or_else(|| LoupeError::TopicNotFound(request.topic.clone()))?
                .len() as u64
        };
        let partition = self.pick_partition(&request, partition_count);

        let mut topics = self.topics.lock().unwrap();
        let logs = topics.get_mut(&request.topic).unwrap();
        let log = logs
            .get_mut(partition as usize)
            .ok_or(LoupeError::PartitionNotFound {
                topic: request.topic.clone(),
                partition,
            })?;
        let offset = log.next_offset;
        log.records.push(Record {
            partition,
            offset,
            timestamp: request.timestamp.unwrap_or_else(now_ms),
            key: request.key,
            value: request.value,
            headers: request.headers,
        });
        log.next_offset += 1;
        Ok(RecordAck { partition, offset })
    }
}

#[derive(Default)]
pub struct FakeConfigs {
    entries: Mutex<HashMap<String, Vec<ConfigEntry>>>,
}

impl FakeConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, topic: &str, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .entry(topic.to_string())
            .or_default()
            .push(ConfigEntry::new(key, value));
    }
}

#[async_trait]
impl ConfigClient for FakeConfigs {
    async fn find_by_topic(&self, topic: &str) -> Result<Vec<ConfigEntry>, LoupeError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(topic)
            .cloned()
            .unwrap_or_default())
    }
}

pub struct FakeLogDirs {
    pub entries: Vec<LogDirEntry>,
}

#[async_trait]
impl LogDirClient for FakeLogDirs {
    async fn list(&self) -> Result<Vec<LogDirEntry>, LoupeError> {
        Ok(self.entries.clone())
    }
}

pub const ORDERS_TOPIC: &str = "orders";

/// Two partitions with 10 records each. Timestamps strictly interleave the
/// partitions so the global (timestamp) order alternates between them:
/// p0/r0, p1/r0, p0/r1, p1/r1, ...
pub fn seeded_orders_broker() -> FakeBroker {
    let broker = FakeBroker::new();
    broker.create_topic(ORDERS_TOPIC, 2);
    for index in 0..10u64 {
        for partition in 0..2u32 {
            broker.append_at(
                ORDERS_TOPIC,
                partition,
                Some(&format!("k{partition}-{index}")),
                &format!("v{partition}-{index}"),
                1_000 + (index * 2 + partition as u64) * 10,
            );
        }
    }
    broker
}

/// Every record of the seeded topic in ascending (timestamp, partition,
/// offset) order.
pub fn seeded_orders_ascending() -> Vec<(u32, u64)> {
    let mut expected = Vec::new();
    for index in 0..10u64 {
        for partition in 0..2u32 {
            expected.push((partition, index));
        }
    }
    expected
}
