//! End-to-end firing tests: real SQLite store on disk, real HTTP email
//! sender pointed at a mock delivery API.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Asia::Kolkata;
use subtrack::config::EmailConfig;
use subtrack::notify::HttpEmailSender;
use subtrack::store::{Category, NewSubscription, OwnerContact};
use subtrack::{
    DailyTrigger, NotificationDispatcher, ReminderEngine, StoreOwnerDirectory, TrackerStore,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Kolkata
        .with_ymd_and_hms(y, mo, d, h, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn trigger() -> DailyTrigger {
    DailyTrigger::new(
        chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        Kolkata,
    )
}

fn seed_store(dir: &tempfile::TempDir) -> Arc<TrackerStore> {
    let store = Arc::new(TrackerStore::open(&dir.path().join("subtrack.db")).unwrap());
    for owner in ["alice", "bob"] {
        store
            .upsert_owner_contact(&OwnerContact {
                owner_id: owner.to_owned(),
                email: format!("{owner}@example.com"),
                display_name: None,
            })
            .unwrap();
    }
    store
}

fn add_sub(store: &TrackerStore, owner: &str, name: &str, renew: DateTime<Utc>) {
    store
        .create_subscription(NewSubscription {
            owner_id: owner.to_owned(),
            name: name.to_owned(),
            cost: 9.99,
            renew_date: Some(renew),
            category: Category::Entertainment,
        })
        .unwrap();
}

fn engine_against(server_uri: &str, store: Arc<TrackerStore>) -> ReminderEngine {
    let email = EmailConfig {
        endpoint: format!("{server_uri}/api/send"),
        ..EmailConfig::default()
    };
    let sender = Arc::new(HttpEmailSender::new(&email));
    let directory = Arc::new(StoreOwnerDirectory::new(store.clone()));
    let dispatcher = Arc::new(NotificationDispatcher::new(directory, sender, Kolkata));
    ReminderEngine::new(store, dispatcher, trigger())
}

#[tokio::test]
async fn firing_delivers_matched_renewals_through_the_email_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = seed_store(&dir);
    // +1, +2, and +3 days from "today"; only +2 and +3 are in the window.
    add_sub(&store, "alice", "plus-one", local(2024, 3, 11, 12));
    add_sub(&store, "alice", "plus-two", local(2024, 3, 12, 12));
    add_sub(&store, "bob", "plus-three", local(2024, 3, 13, 12));

    let engine = engine_against(&server.uri(), store);
    let report = engine.fire_at(local(2024, 3, 10, 9)).await.unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 2);
    assert!(report.failures.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let bodies: Vec<String> = requests
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect();
    assert!(bodies.iter().any(|b| b.contains("plus-two") && b.contains("alice@example.com")));
    assert!(bodies.iter().any(|b| b.contains("plus-three") && b.contains("bob@example.com")));
}

#[tokio::test]
async fn rejected_delivery_does_not_abort_the_firing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send"))
        .and(body_string_contains("bob@example.com"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/send"))
        .and(body_string_contains("alice@example.com"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = seed_store(&dir);
    add_sub(&store, "alice", "alice-sub", local(2024, 3, 12, 12));
    add_sub(&store, "bob", "bob-sub", local(2024, 3, 13, 12));

    let engine = engine_against(&server.uri(), store);
    let report = engine.fire_at(local(2024, 3, 10, 9)).await.unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].1.contains("500"));
}

#[tokio::test]
async fn owner_without_contact_fails_only_their_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/send"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = seed_store(&dir);
    add_sub(&store, "alice", "alice-sub", local(2024, 3, 12, 12));
    // "carol" has no owner record at all.
    add_sub(&store, "carol", "carol-sub", local(2024, 3, 13, 12));

    let engine = engine_against(&server.uri(), store);
    let report = engine.fire_at(local(2024, 3, 10, 9)).await.unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].1.contains("no contact address"));
}
