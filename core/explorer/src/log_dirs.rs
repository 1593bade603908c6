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

//! Disk-usage rollups over the broker's log-directory listing, for topic and
//! partition size display. Replica footprints for the same partition are
//! summed.

use crate::client::LogDirClient;
use loupe_common::LoupeError;
use std::collections::BTreeMap;

pub async fn topic_size_bytes<C>(client: &C, topic: &str) -> Result<u64, LoupeError>
where
    C: LogDirClient + ?Sized,
{
    Ok(client
        .find_by_topic(topic)
        .await?
        .iter()
        .map(|entry| entry.size_bytes)
        .sum())
}

pub async fn broker_size_bytes<C>(client: &C, broker_id: i32) -> Result<u64, LoupeError>
where
    C: LogDirClient + ?Sized,
{
    Ok(client
        .find_by_broker(broker_id)
        .await?
        .iter()
        .map(|entry| entry.size_bytes)
        .sum())
}

/// Per-partition on-disk size for one topic, replicas summed.
pub async fn partition_sizes<C>(client: &C, topic: &str) -> Result<BTreeMap<u32, u64>, LoupeError>
where
    C: LogDirClient + ?Sized,
{
    let mut sizes = BTreeMap::new();
    for entry in client.find_by_topic(topic).await? {
        *sizes.entry(entry.partition).or_insert(0) += entry.size_bytes;
    }
    Ok(sizes)
}
