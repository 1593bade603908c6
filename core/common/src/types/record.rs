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

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;
use std::collections::HashMap;

/// A single record as fetched from a partition. Immutable once fetched.
///
/// `value == None` is a tombstone: under a compacting cleanup policy it marks
/// the key for removal. Key and value are serialized as base64 so that event
/// payloads stay valid JSON for arbitrary binary content.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub partition: u32,
    /// Partition-local sequence number, assigned by the broker, unique and
    /// monotonically increasing within the partition.
    pub offset: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    #[serde_as(as = "Option<Base64>")]
    pub key: Option<Bytes>,
    #[serde_as(as = "Option<Base64>")]
    pub value: Option<Bytes>,
    pub headers: HashMap<String, String>,
}

impl Record {
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}
