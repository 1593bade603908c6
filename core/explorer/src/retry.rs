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

use crate::configs::FetchConfig;
use loupe_common::LoupeError;
use std::future::Future;
use tokio::time::{sleep, timeout};
use tracing::warn;

/// Run a read against the broker with a per-attempt timeout and bounded
/// retries on transient failures. An elapsed timeout counts as the broker
/// being unavailable; non-transient errors are returned on the first hit.
pub(crate) async fn read_with_retries<T, Fut>(
    config: &FetchConfig,
    mut operation: impl FnMut() -> Fut,
) -> Result<T, LoupeError>
where
    Fut: Future<Output = Result<T, LoupeError>>,
{
    let mut attempt: u32 = 0;
    loop {
        let outcome = match timeout(config.fetch_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(LoupeError::BrokerUnavailable(format!(
                "read timed out after {:?}",
                config.fetch_timeout
            ))),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < config.max_fetch_retries => {
                attempt += 1;
                warn!("transient read failure (attempt {attempt}): {error}");
                sleep(config.retry_backoff * attempt).await;
            }
            Err(error) => return Err(error),
        }
    }
}
