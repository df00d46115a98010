//! Sync client integration tests
//!
//! Drive a real `SyncClient` against the in-process push server.
//!
//! Run with: cargo test -p integration-tests --test sync_tests

use aimem_cache::{create_shared_cache, CacheKey, CacheRead, Collection};
use aimem_core::{MessageType, OutgoingEnvelope, Thought};
use aimem_service::ThoughtQueries;
use aimem_sync::{ConnectionStatus, SendOutcome, ServerFrame, SyncClient};
use integration_tests::*;
use serde_json::json;

fn thoughts_listing() -> CacheKey {
    CacheKey::query(Collection::Thoughts, "all")
}

/// Client connected to `team-design` on a fresh push server
async fn connected_client() -> (PushServer, SyncClient) {
    init_test_tracing();
    let server = PushServer::start().await.expect("Failed to start push server");
    let client = SyncClient::new(&sync_config(&server.endpoint()), create_shared_cache());
    client.set_workspace(Some(workspace(TEAM)));

    wait_for_status(&client, ConnectionStatus::Connected).await.unwrap();
    server.wait_for_joins(1).await.unwrap();
    (server, client)
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn test_team_design_scenario() {
    let (server, client) = connected_client().await;
    let cache = client.cache().clone();
    cache.replace(thoughts_listing(), json!([{"id": "1"}]));
    cache.replace(CacheKey::system_stats(), json!({"total": 1}));

    let connection = &server.connections()[0];
    assert_eq!(connection.query_workspace.as_deref(), Some(TEAM));
    assert_eq!(connection.joins, vec![workspace(TEAM)]);

    server.push(&ServerFrame::UserJoined(user("u1"))).unwrap();
    server
        .push(&message_frame(MessageType::ThoughtCreated, json!({"id": "9"})))
        .unwrap();

    wait_until("listing invalidated", || {
        matches!(cache.read(&thoughts_listing()), CacheRead::Stale(_))
    })
    .await
    .unwrap();

    assert_eq!(client.active_users(), vec![user("u1")]);
    assert!(matches!(cache.read(&CacheKey::system_stats()), CacheRead::Stale(_)));
    assert_eq!(cache.read(&CacheKey::thought(&thought_id("9"))), CacheRead::Unknown);
}

#[tokio::test]
async fn test_envelopes_apply_in_order() {
    let (server, client) = connected_client().await;
    let cache = client.cache().clone();
    let key = CacheKey::thought(&thought_id("5"));

    server
        .push(&message_frame(MessageType::ThoughtUpdated, thought_json("5", "A")))
        .unwrap();
    server
        .push(&message_frame(MessageType::ThoughtUpdated, thought_json("5", "B")))
        .unwrap();
    server
        .push(&message_frame(MessageType::ThoughtUpdated, thought_json("6", "done")))
        .unwrap();

    wait_until("last update applied", || {
        cache.read(&CacheKey::thought(&thought_id("6"))).is_fresh()
    })
    .await
    .unwrap();

    match cache.read(&key) {
        CacheRead::Fresh(value) => assert_eq!(value["title"], "B"),
        other => panic!("Expected fresh thought, got {other:?}"),
    }

    server
        .push(&message_frame(MessageType::ThoughtDeleted, json!({"id": "5"})))
        .unwrap();
    wait_until("thought removed", || cache.read(&key) == CacheRead::Removed)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_and_malformed_messages_are_skipped() {
    let (server, client) = connected_client().await;
    let cache = client.cache().clone();

    server.push(&unknown_frame("thought_archived")).unwrap();
    server.push_raw("this is not json");
    server.push_raw(r#"{"event":"typing","data":{}}"#);
    server
        .push(&message_frame(MessageType::ThoughtUpdated, json!({"title": "no id"})))
        .unwrap();
    server
        .push(&message_frame(MessageType::ThoughtUpdated, thought_json("7", "ok")))
        .unwrap();

    wait_until("valid update applied", || {
        cache.read(&CacheKey::thought(&thought_id("7"))).is_fresh()
    })
    .await
    .unwrap();

    assert_eq!(cache.len(), 1);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_team_sync_invalidates_all_collections() {
    let (server, client) = connected_client().await;
    let cache = client.cache().clone();
    let teams = CacheKey::query(Collection::Teams, "all");
    cache.replace(teams.clone(), json!([]));
    cache.replace(thoughts_listing(), json!([]));

    server.push(&message_frame(MessageType::TeamSync, json!(null))).unwrap();

    wait_until("teams invalidated", || {
        matches!(cache.read(&teams), CacheRead::Stale(_))
    })
    .await
    .unwrap();
    assert!(matches!(cache.read(&thoughts_listing()), CacheRead::Stale(_)));
    assert!(cache.is_invalidated(&Collection::SystemStats));
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_presence_snapshot_and_deltas() {
    let (server, client) = connected_client().await;

    server
        .push(&ServerFrame::UsersUpdated(vec![user("u1"), user("u2")]))
        .unwrap();
    server.push(&ServerFrame::UserJoined(user("u2"))).unwrap();
    server.push(&ServerFrame::UserJoined(user("u3"))).unwrap();
    server.push(&ServerFrame::UserLeft(user("u1"))).unwrap();
    server
        .push(&message_frame(MessageType::UserLeft, json!({"userId": "nobody"})))
        .unwrap();

    wait_until("presence settled", || {
        client.active_users() == vec![user("u2"), user("u3")]
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_padded_presence_ids_are_normalized() {
    let (server, client) = connected_client().await;

    server.push_raw(r#"{"event":"users_updated","data":[" u1 ", "u2"]}"#);
    wait_until("snapshot applied", || client.active_users().len() == 2)
        .await
        .unwrap();
    assert_eq!(client.active_users(), vec![user("u1"), user("u2")]);

    server.push_raw(r#"{"event":"user_left","data":" u1 "}"#);
    wait_until("padded leave applied", || client.active_users() == vec![user("u2")])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_disconnect_clears_presence() {
    let (server, client) = connected_client().await;
    server
        .push(&ServerFrame::UsersUpdated(vec![user("u1"), user("u2")]))
        .unwrap();
    wait_until("presence received", || client.active_users().len() == 2)
        .await
        .unwrap();

    client.disconnect();

    assert!(client.active_users().is_empty());
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    server.wait_for_open(0).await.unwrap();

    client.disconnect();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_server_close_clears_presence() {
    let (server, client) = connected_client().await;
    let mut presence = client.watch_presence();
    server.push(&ServerFrame::UserJoined(user("u1"))).unwrap();
    wait_until("presence received", || client.active_users().len() == 1)
        .await
        .unwrap();

    server.close_all();

    wait_for_status(&client, ConnectionStatus::Disconnected).await.unwrap();
    assert!(client.active_users().is_empty());
    within(presence.wait_for(|users| users.is_empty())).await.unwrap().unwrap();
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn test_same_workspace_does_not_open_second_connection() {
    let (server, client) = connected_client().await;

    client.set_workspace(Some(workspace(TEAM)));
    client.set_enabled(true);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    assert_eq!(server.total_connections(), 1);
    assert_eq!(server.joins().len(), 1);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_workspace_change_replaces_connection() {
    let (server, client) = connected_client().await;

    client.set_workspace(Some(workspace("team-ops")));

    wait_for_status(&client, ConnectionStatus::Connected).await.unwrap();
    server.wait_for_joins(2).await.unwrap();
    server.wait_for_open(1).await.unwrap();

    assert_eq!(server.joins(), vec![workspace(TEAM), workspace("team-ops")]);
    assert_eq!(server.total_connections(), 2);
}

#[tokio::test]
async fn test_reconnect_tears_down_first() {
    let (server, client) = connected_client().await;

    assert!(client.reconnect());

    wait_for_status(&client, ConnectionStatus::Connected).await.unwrap();
    server.wait_for_joins(2).await.unwrap();
    server.wait_for_open(1).await.unwrap();
    assert_eq!(server.total_connections(), 2);
}

#[tokio::test]
async fn test_disabling_closes_connection() {
    let (server, client) = connected_client().await;

    client.set_enabled(false);
    server.wait_for_open(0).await.unwrap();
    assert_eq!(client.status(), ConnectionStatus::Disconnected);

    client.set_enabled(true);
    wait_for_status(&client, ConnectionStatus::Connected).await.unwrap();
    server.wait_for_open(1).await.unwrap();
}

#[tokio::test]
async fn test_handshake_failure_reports_errored() {
    init_test_tracing();
    let server = PushServer::start_rejecting().await.unwrap();
    let client = SyncClient::new(&sync_config(&server.endpoint()), create_shared_cache());
    client.set_workspace(Some(workspace(TEAM)));

    wait_for_status(&client, ConnectionStatus::Errored).await.unwrap();

    assert!(client.last_error().is_some_and(|e| e.contains("Handshake failed")));
    assert!(client.active_users().is_empty());
    assert_eq!(server.total_connections(), 0);

    // Manual retry goes through Connecting and fails the same way
    assert!(client.reconnect());
    wait_for_status(&client, ConnectionStatus::Errored).await.unwrap();

    client.set_workspace(None);
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    assert!(client.last_error().is_none());
}

#[tokio::test]
async fn test_drop_disconnects() {
    let (server, client) = connected_client().await;

    drop(client);

    server.wait_for_open(0).await.unwrap();
    assert_eq!(server.total_connections(), 1);
}

// ============================================================================
// Send path
// ============================================================================

#[tokio::test]
async fn test_send_reaches_server() {
    let (server, client) = connected_client().await;

    let outcome = client.send(OutgoingEnvelope::new(
        MessageType::ThoughtUpdated,
        thought_json("3", "Edited"),
    ));
    assert_eq!(outcome, SendOutcome::Sent);

    server.wait_for_messages(1).await.unwrap();
    let received = &server.messages()[0];
    assert_eq!(received.message_type(), Some(MessageType::ThoughtUpdated));
    assert_eq!(received.workspace_id, Some(workspace(TEAM)));
    assert_eq!(received.data["title"], "Edited");
}

#[tokio::test]
async fn test_send_after_disconnect_is_dropped() {
    let (server, client) = connected_client().await;
    client.disconnect();

    let outcome = client.send(OutgoingEnvelope::new(MessageType::TeamSync, json!(null)));

    assert_eq!(outcome, SendOutcome::Dropped);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(server.messages().is_empty());
}

// ============================================================================
// Queries over the synced cache
// ============================================================================

#[tokio::test]
async fn test_queries_see_pushed_updates() {
    let (server, client) = connected_client().await;
    let store = MemoryStore::with([Thought::new(thought_id("1"), "Original", "body")]);
    let queries = ThoughtQueries::new(store.clone(), client.cache().clone());

    assert_eq!(queries.thought(&thought_id("1")).await.unwrap().title, "Original");

    server
        .push(&message_frame(MessageType::ThoughtUpdated, thought_json("1", "Pushed")))
        .unwrap();
    let cache = client.cache().clone();
    wait_until("push applied", || {
        cache
            .read(&CacheKey::thought(&thought_id("1")))
            .value()
            .is_some_and(|v| v["title"] == "Pushed")
    })
    .await
    .unwrap();

    assert_eq!(queries.thought(&thought_id("1")).await.unwrap().title, "Pushed");
    assert_eq!(store.fetches(), 1);

    // A new thought only stales listings; the cached document is kept
    cache.replace(thoughts_listing(), json!([{"id": "1"}]));
    server
        .push(&message_frame(MessageType::ThoughtCreated, json!({"id": "2"})))
        .unwrap();
    wait_until("listing invalidated", || {
        matches!(cache.read(&thoughts_listing()), CacheRead::Stale(_))
    })
    .await
    .unwrap();

    queries.thought(&thought_id("1")).await.unwrap();
    assert_eq!(store.fetches(), 1);

    server
        .push(&message_frame(MessageType::ThoughtDeleted, json!({"id": "1"})))
        .unwrap();
    wait_until("thought removed", || {
        cache.read(&CacheKey::thought(&thought_id("1"))) == CacheRead::Removed
    })
    .await
    .unwrap();

    queries.thought(&thought_id("1")).await.unwrap();
    assert_eq!(store.fetches(), 2);
}
