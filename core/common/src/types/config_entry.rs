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

/// One topic configuration entry as returned by the broker's metadata API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

pub const CLEANUP_POLICY_KEY: &str = "cleanup.policy";

/// Whether the topic's cleanup policy includes compaction.
///
/// A tombstone only ever removes its key on a compacted topic; on a
/// delete-only policy the broker accepts the tombstone and then never honors
/// it. The policy value can name several policies separated by commas.
pub fn cleanup_policy_compacts(entries: &[ConfigEntry]) -> bool {
    entries
        .iter()
        .find(|entry| entry.key == CLEANUP_POLICY_KEY)
        .map(|entry| entry.value.split(',').any(|policy| policy.trim() == "compact"))
        .unwrap_or(false)
}
