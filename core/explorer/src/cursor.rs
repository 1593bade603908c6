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

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use loupe_common::LoupeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use tracing::warn;

/// Presentation order of a page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recent records first; pages descend toward the earliest offset.
    #[default]
    Newest,
    /// Pages ascend from the earliest offset toward the head of the log.
    Oldest,
}

impl SortOrder {
    pub fn opposite(self) -> Self {
        match self {
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::Newest,
        }
    }
}

/// Whether the next fetch continues past this cursor in the sort order
/// (`Forward`, the "next page" link) or re-opens the records just before it
/// (`Backward`, the "previous page" link).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Scan position over a set of independently-offset partitions.
///
/// `positions` stores one frontier per partition: every ascending scan reads
/// `[frontier, latest)` and every descending scan reads `[earliest,
/// frontier)`, so a single number per partition describes the boundary
/// between pages exactly, in both directions. Partitions absent from the map
/// have their frontier resolved from `timestamp` or the sort order before
/// the first fetch.
///
/// A cursor is an immutable per-request value; paging produces new cursors
/// instead of mutating this one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub positions: BTreeMap<u32, u64>,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub direction: Direction,
    /// Restrict the scan to one partition.
    #[serde(default)]
    pub partition: Option<u32>,
    /// Seek target in ms since epoch, used only for partitions without an
    /// explicit position yet.
    #[serde(default)]
    pub timestamp: Option<u64>,
    /// Keyword carried along for search sessions.
    #[serde(default)]
    pub query: Option<String>,
}

impl Cursor {
    pub fn new(sort: SortOrder) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn with_partition(mut self, partition: u32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Whether the cursor's partition filter selects the given partition.
    pub fn selects(&self, partition: u32) -> bool {
        self.partition.is_none_or(|selected| selected == partition)
    }

    /// Opaque, URL-safe token that round-trips losslessly through
    /// [`Cursor::decode`].
    pub fn encode(&self) -> String {
        let body = serde_json::to_vec(self).expect("cursor serializes to json");
        URL_SAFE_NO_PAD.encode(body)
    }

    /// Decode a token, falling back to the default cursor (latest-first, all
    /// partitions, no filters) on anything missing or malformed. A corrupt
    /// token degrades the request instead of failing it.
    pub fn decode(token: Option<&str>) -> Self {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Self::default();
        };
        match Self::try_decode(token) {
            Ok(cursor) => cursor,
            Err(_) => {
                warn!("invalid cursor token, resetting to the default cursor");
                Self::default()
            }
        }
    }

    fn try_decode(token: &str) -> Result<Self, LoupeError> {
        let body = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| LoupeError::InvalidCursor)?;
        serde_json::from_slice(&body).map_err(|_| LoupeError::InvalidCursor)
    }
}
