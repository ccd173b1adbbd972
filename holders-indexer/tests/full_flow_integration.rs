//! Full flow integration tests: decode → aggregate → store → query, against
//! a real `PostgreSQL` instance.
//!
//! Exercises the worked examples from the holders-listing scenarios: a
//! mint, a transfer, a burn, a negative-balance quarantine, and paging
//! through the query engine with its cache.

mod common;

use common::fixtures::TestDb;
use common::fixtures::token_fixtures::{holder_address, token_address};
use holders_indexer::indexer::{aggregate, enqueue_reindex};
use holders_indexer::ports::{CursorStore, HolderStore};
use holders_indexer::query;
use holders_indexer::store::TtlHoldersCache;
use holders_indexer::types::entities::Transfer;
use holders_indexer::types::primitives::{BlockNumber, EthAddress, TokenAmount};

const CHAIN_ID: u64 = 1;

fn transfer(token: EthAddress, from: EthAddress, to: EthAddress, value: &str, block: u64) -> Transfer {
    Transfer {
        token,
        from,
        to,
        value: TokenAmount::parse(value).unwrap(),
        block_number: BlockNumber::new(block),
        log_index: 0,
    }
}

#[tokio::test]
async fn mint_transfer_burn_flow_settles_to_correct_balances() {
    let db = TestDb::new().await;
    let cache = TtlHoldersCache::new();
    let token = token_address(1);
    let alice = holder_address(1);
    let bob = holder_address(2);

    db.store.enqueue_reindex(CHAIN_ID, token, Some(BlockNumber::new(1))).await.unwrap();

    // Block 1: mint 1000 to alice.
    let mint = vec![transfer(token, EthAddress::ZERO, alice, "1000", 1)];
    let deltas = aggregate(&mint);
    let mut tx = db.pool.begin().await.unwrap();
    db.store.apply_deltas(&mut tx, CHAIN_ID, token, &deltas).await.unwrap();
    db.store.upsert_cursor(&mut tx, CHAIN_ID, token, BlockNumber::new(1)).await.unwrap();
    tx.commit().await.unwrap();

    // Block 2: alice sends 400 to bob.
    let send = vec![transfer(token, alice, bob, "400", 2)];
    let deltas = aggregate(&send);
    let mut tx = db.pool.begin().await.unwrap();
    db.store.apply_deltas(&mut tx, CHAIN_ID, token, &deltas).await.unwrap();
    db.store.upsert_cursor(&mut tx, CHAIN_ID, token, BlockNumber::new(2)).await.unwrap();
    tx.commit().await.unwrap();

    // Block 3: bob burns 100.
    let burn = vec![transfer(token, bob, EthAddress::ZERO, "100", 3)];
    let deltas = aggregate(&burn);
    let mut tx = db.pool.begin().await.unwrap();
    db.store.apply_deltas(&mut tx, CHAIN_ID, token, &deltas).await.unwrap();
    db.store.upsert_cursor(&mut tx, CHAIN_ID, token, BlockNumber::new(3)).await.unwrap();
    tx.commit().await.unwrap();

    let tracked = db.store.get_cursor(CHAIN_ID, token).await.unwrap();
    let page = query::get_token_holders(&db.store, &cache, tracked.as_ref(), CHAIN_ID, token, None, Some(10))
        .await
        .unwrap();

    assert_eq!(page.status, "ok");
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].holder, alice);
    assert_eq!(page.items[0].balance, TokenAmount::parse("600").unwrap());
    assert_eq!(page.items[1].holder, bob);
    assert_eq!(page.items[1].balance, TokenAmount::parse("300").unwrap());
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn negative_balance_quarantines_token_without_advancing_cursor() {
    let db = TestDb::new().await;
    let token = token_address(2);
    let alice = holder_address(3);
    db.store.enqueue_reindex(CHAIN_ID, token, Some(BlockNumber::new(1))).await.unwrap();

    // alice tries to send 50 she never received.
    let bad = vec![transfer(token, alice, holder_address(4), "50", 1)];
    let deltas = aggregate(&bad);

    let mut tx = db.pool.begin().await.unwrap();
    let result = db.store.apply_deltas(&mut tx, CHAIN_ID, token, &deltas).await;
    assert!(result.is_err());
    drop(tx);

    let mut quarantine_tx = db.pool.begin().await.unwrap();
    db.store.mark_quarantined(&mut quarantine_tx, CHAIN_ID, token, "negative balance detected").await.unwrap();
    quarantine_tx.commit().await.unwrap();

    let tracked = db.store.get_cursor(CHAIN_ID, token).await.unwrap().unwrap();
    assert!(tracked.is_quarantined());
    assert_eq!(tracked.to_block, None);

    let cache = TtlHoldersCache::new();
    let page = query::get_token_holders(&db.store, &cache, Some(&tracked), CHAIN_ID, token, None, None)
        .await
        .unwrap();
    assert_eq!(page.status, "indexing");
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn admin_reindex_clears_quarantine_for_subsequent_polling() {
    let db = TestDb::new().await;
    let token_hex = "0x0000000000000000000000000000000000000099";
    enqueue_reindex(&db.store, &[CHAIN_ID], CHAIN_ID, token_hex, Some(42)).await.unwrap();

    let token = EthAddress::from_hex(token_hex).unwrap();
    let mut tx = db.pool.begin().await.unwrap();
    db.store.mark_quarantined(&mut tx, CHAIN_ID, token, "bad batch").await.unwrap();
    tx.commit().await.unwrap();
    assert!(db.store.get_cursor(CHAIN_ID, token).await.unwrap().unwrap().is_quarantined());

    enqueue_reindex(&db.store, &[CHAIN_ID], CHAIN_ID, token_hex, None).await.unwrap();
    assert!(!db.store.get_cursor(CHAIN_ID, token).await.unwrap().unwrap().is_quarantined());
}

#[tokio::test]
async fn query_engine_caches_first_page_until_invalidated() {
    let db = TestDb::new().await;
    let cache = TtlHoldersCache::new();
    let token = token_address(3);
    db.store.enqueue_reindex(CHAIN_ID, token, Some(BlockNumber::new(1))).await.unwrap();

    let mint = vec![transfer(token, EthAddress::ZERO, holder_address(9), "500", 1)];
    let deltas = aggregate(&mint);
    let mut tx = db.pool.begin().await.unwrap();
    db.store.apply_deltas(&mut tx, CHAIN_ID, token, &deltas).await.unwrap();
    db.store.upsert_cursor(&mut tx, CHAIN_ID, token, BlockNumber::new(1)).await.unwrap();
    tx.commit().await.unwrap();

    let tracked = db.store.get_cursor(CHAIN_ID, token).await.unwrap();
    let first = query::get_token_holders(&db.store, &cache, tracked.as_ref(), CHAIN_ID, token, None, None)
        .await
        .unwrap();
    assert_eq!(cache.stats().misses, 1);

    let second = query::get_token_holders(&db.store, &cache, tracked.as_ref(), CHAIN_ID, token, None, None)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.stats().hits, 1);
}
