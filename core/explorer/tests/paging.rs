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

mod common;

use common::{FakeBroker, ORDERS_TOPIC, seeded_orders_ascending, seeded_orders_broker};
use loupe::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn fetcher(broker: FakeBroker) -> PageFetcher<FakeBroker> {
    PageFetcher::new(Arc::new(broker))
}

fn fast_fetcher(broker: FakeBroker) -> PageFetcher<FakeBroker> {
    let config = FetchConfig {
        fetch_timeout: Duration::from_secs(1),
        max_fetch_retries: 3,
        retry_backoff: Duration::from_millis(1),
    };
    PageFetcher::with_config(Arc::new(broker), config)
}

fn identities(page: &Page) -> Vec<(u32, u64)> {
    page.records
        .iter()
        .map(|record| (record.partition, record.offset))
        .collect()
}

/// Page through the whole topic in the cursor's sort order, asserting the
/// walk terminates with a stable empty page.
async fn collect_walk(
    fetcher: &PageFetcher<FakeBroker>,
    mut cursor: Cursor,
    page_size: usize,
) -> Vec<(u32, u64)> {
    let mut seen = Vec::new();
    for _ in 0..50 {
        let page = fetcher
            .fetch_page(ORDERS_TOPIC, &cursor, page_size)
            .await
            .expect("page fetch");
        if page.records.is_empty() {
            assert_eq!(page.prev, page.next, "empty page must be stable");
            return seen;
        }
        seen.extend(identities(&page));
        cursor = page.next;
    }
    panic!("walk did not terminate");
}

#[tokio::test]
async fn test_newest_walk_over_two_partitions() {
    let fetcher = fetcher(seeded_orders_broker());
    let cursor = Cursor::default();

    let first = fetcher
        .fetch_page(ORDERS_TOPIC, &cursor, 5)
        .await
        .expect("first page");
    // The five most recent records across both partitions, merged by
    // timestamp.
    assert_eq!(
        identities(&first),
        vec![(1, 9), (0, 9), (1, 8), (0, 8), (1, 7)]
    );

    let second = fetcher
        .fetch_page(ORDERS_TOPIC, &first.next, 5)
        .await
        .expect("second page");
    assert_eq!(
        identities(&second),
        vec![(0, 7), (1, 6), (0, 6), (1, 5), (0, 5)]
    );

    let third = fetcher
        .fetch_page(ORDERS_TOPIC, &second.next, 5)
        .await
        .expect("third page");
    let fourth = fetcher
        .fetch_page(ORDERS_TOPIC, &third.next, 5)
        .await
        .expect("fourth page");
    assert_eq!(third.records.len(), 5);
    assert_eq!(fourth.records.len(), 5);

    // Exhausted: the fifth page is empty and its cursors coincide.
    let fifth = fetcher
        .fetch_page(ORDERS_TOPIC, &fourth.next, 5)
        .await
        .expect("fifth page");
    assert!(fifth.records.is_empty());
    assert_eq!(fifth.next, fifth.prev);
    assert_eq!(fifth.next, fourth.next);
}

#[tokio::test]
async fn test_oldest_walk_visits_every_record_exactly_once() {
    let fetcher = fetcher(seeded_orders_broker());
    let walk = collect_walk(&fetcher, Cursor::new(SortOrder::Oldest), 3).await;

    assert_eq!(walk, seeded_orders_ascending());
    let distinct: HashSet<_> = walk.iter().collect();
    assert_eq!(distinct.len(), walk.len(), "no duplicates across pages");
}

#[tokio::test]
async fn test_newest_then_oldest_visit_the_same_records_in_reverse() {
    let fetcher = fetcher(seeded_orders_broker());
    let newest = collect_walk(&fetcher, Cursor::new(SortOrder::Newest), 7).await;
    let oldest = collect_walk(&fetcher, Cursor::new(SortOrder::Oldest), 7).await;

    let mut reversed = oldest.clone();
    reversed.reverse();
    assert_eq!(newest, reversed);
}

#[tokio::test]
async fn test_partition_filter_restricts_the_walk() {
    let fetcher = fetcher(seeded_orders_broker());
    let cursor = Cursor::new(SortOrder::Oldest).with_partition(1);
    let walk = collect_walk(&fetcher, cursor, 4).await;

    let expected: Vec<(u32, u64)> = (0..10).map(|offset| (1, offset)).collect();
    assert_eq!(walk, expected);
}

#[tokio::test]
async fn test_unknown_partition_filter_fails() {
    let fetcher = fetcher(seeded_orders_broker());
    let cursor = Cursor::default().with_partition(9);
    let error = fetcher
        .fetch_page(ORDERS_TOPIC, &cursor, 5)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        LoupeError::PartitionNotFound { partition: 9, .. }
    ));
}

#[tokio::test]
async fn test_unknown_topic_fails() {
    let fetcher = fetcher(seeded_orders_broker());
    let error = fetcher
        .fetch_page("missing", &Cursor::default(), 5)
        .await
        .unwrap_err();
    assert!(matches!(error, LoupeError::TopicNotFound(topic) if topic == "missing"));
}

#[tokio::test]
async fn test_timestamp_seek_oldest_starts_at_the_instant() {
    let fetcher = fetcher(seeded_orders_broker());
    // Timestamp of p0/r5; p1's first record at or after it is r5 as well.
    let cursor = Cursor::new(SortOrder::Oldest).with_timestamp(1_100);
    let walk = collect_walk(&fetcher, cursor, 5).await;

    let expected: Vec<(u32, u64)> = (5..10).flat_map(|offset| [(0, offset), (1, offset)]).collect();
    assert_eq!(walk, expected);
}

#[tokio::test]
async fn test_timestamp_seek_newest_shows_records_before_the_instant() {
    let fetcher = fetcher(seeded_orders_broker());
    let cursor = Cursor::new(SortOrder::Newest).with_timestamp(1_100);

    let page = fetcher
        .fetch_page(ORDERS_TOPIC, &cursor, 5)
        .await
        .expect("page");
    assert_eq!(
        identities(&page),
        vec![(1, 4), (0, 4), (1, 3), (0, 3), (1, 2)]
    );
    assert!(page.records.iter().all(|record| record.timestamp < 1_100));
}

#[tokio::test]
async fn test_backward_cursor_reopens_the_previous_page() {
    let fetcher = fetcher(seeded_orders_broker());
    let first = fetcher
        .fetch_page(ORDERS_TOPIC, &Cursor::default(), 5)
        .await
        .expect("first page");
    let second = fetcher
        .fetch_page(ORDERS_TOPIC, &first.next, 5)
        .await
        .expect("second page");

    let reopened = fetcher
        .fetch_page(ORDERS_TOPIC, &second.prev, 5)
        .await
        .expect("previous page");
    assert_eq!(identities(&reopened), identities(&first));

    // And its forward cursor lands back on the second page.
    let forward_again = fetcher
        .fetch_page(ORDERS_TOPIC, &reopened.next, 5)
        .await
        .expect("second page again");
    assert_eq!(identities(&forward_again), identities(&second));
}

#[tokio::test]
async fn test_retention_rollback_clamps_with_a_notice() {
    let broker = Arc::new(seeded_orders_broker());
    let fetcher = PageFetcher::new(Arc::clone(&broker));

    let first = fetcher
        .fetch_page(ORDERS_TOPIC, &Cursor::new(SortOrder::Oldest), 5)
        .await
        .expect("first page");
    assert!(first.notices.is_empty());

    // Retention removes offsets 0..5 of partition 0; the stored position 3
    // now lies outside the valid range.
    broker.advance_earliest(ORDERS_TOPIC, 0, 5);

    let page = fetcher
        .fetch_page(ORDERS_TOPIC, &first.next, 5)
        .await
        .expect("page after retention");
    assert_eq!(
        page.notices,
        vec![PageNotice::OffsetClamped {
            partition: 0,
            requested: 3,
            clamped_to: 5,
        }]
    );
    // Partition 0 resumes from its new earliest offset.
    assert!(
        page.records
            .iter()
            .filter(|record| record.partition == 0)
            .all(|record| record.offset >= 5)
    );
}

#[tokio::test]
async fn test_transient_outage_is_retried_within_one_page() {
    let broker = seeded_orders_broker();
    broker.fail_next_fetches(2);
    let fetcher = fast_fetcher(broker);

    let page = fetcher
        .fetch_page(ORDERS_TOPIC, &Cursor::default(), 5)
        .await
        .expect("page despite transient outage");
    assert_eq!(page.records.len(), 5);
}

#[tokio::test]
async fn test_persistent_outage_fails_the_page_without_advancing() {
    let broker = seeded_orders_broker();
    broker.fail_partition(0);
    let fetcher = fast_fetcher(broker);

    let error = fetcher
        .fetch_page(ORDERS_TOPIC, &Cursor::default(), 5)
        .await
        .unwrap_err();
    assert!(matches!(error, LoupeError::BrokerUnavailable(_)));
}

#[tokio::test]
async fn test_zero_page_size_is_stable() {
    let fetcher = fetcher(seeded_orders_broker());
    let cursor = Cursor::default();
    let page = fetcher
        .fetch_page(ORDERS_TOPIC, &cursor, 0)
        .await
        .expect("empty page");
    assert!(page.records.is_empty());
    assert_eq!(page.prev, cursor);
    assert_eq!(page.next, cursor);
}
