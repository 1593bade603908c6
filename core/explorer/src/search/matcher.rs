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

use crate::configs::SearchFields;
use loupe_common::Record;

/// Case-insensitive substring predicate over the configured record fields.
/// Binary key/value content is matched through a lossy UTF-8 view.
#[derive(Debug, Clone)]
pub(crate) struct RecordMatcher {
    query: String,
    fields: SearchFields,
}

impl RecordMatcher {
    pub fn new(query: &str, fields: SearchFields) -> Self {
        Self {
            query: query.to_lowercase(),
            fields,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.query.is_empty() {
            return true;
        }
        if self.fields.key
            && record
                .key
                .as_deref()
                .is_some_and(|key| self.contains(key))
        {
            return true;
        }
        if self.fields.value
            && record
                .value
                .as_deref()
                .is_some_and(|value| self.contains(value))
        {
            return true;
        }
        if self.fields.headers {
            return record.headers.iter().any(|(key, value)| {
                key.to_lowercase().contains(&self.query)
                    || value.to_lowercase().contains(&self.query)
            });
        }
        false
    }

    fn contains(&self, haystack: &[u8]) -> bool {
        String::from_utf8_lossy(haystack)
            .to_lowercase()
            .contains(&self.query)
    }
}
