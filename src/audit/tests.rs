use super::*;
use chrono::Duration;
use std::thread;

fn entry(action: &str, timestamp: DateTime<Utc>) -> AuditEntry {
    AuditEntry::builder()
        .action(action)
        .timestamp(timestamp)
        .build()
}

fn user_entry(action: &str, user_id: &str) -> AuditEntry {
    AuditEntry::builder()
        .action(action)
        .user_id(Some(user_id.to_string()))
        .build()
}

fn actions(entries: &[Arc<AuditEntry>]) -> Vec<&str> {
    entries.iter().map(|entry| entry.action()).collect()
}

#[test]
fn test_append_and_list() {
    let store = AuditStore::new();

    store.append(
        AuditEntry::builder()
            .action("TestAction")
            .controller("TestController")
            .method("GET")
            .path("/test")
            .build(),
    );

    let entries = store.list_all();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action(), "TestAction");
    assert_eq!(store.len(), 1);
    assert!(!store.is_empty());
}

#[test]
fn test_try_append_rejects_missing_entry() {
    let store = AuditStore::new();

    let result = store.try_append(None);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(store.is_empty());

    store.try_append(Some(AuditEntry::default())).unwrap();
    assert_eq!(store.len(), 1);
}

#[test]
fn test_empty_store() {
    let store = AuditStore::new();

    assert!(store.list_all().is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_list_all_most_recent_first() {
    let store = AuditStore::new();
    let now = Utc::now();

    store.append(entry("Action1", now - Duration::minutes(2)));
    store.append(entry("Action2", now - Duration::minutes(1)));
    store.append(entry("Action3", now));

    assert_eq!(
        actions(&store.list_all()),
        vec!["Action3", "Action2", "Action1"]
    );
}

#[test]
fn test_list_all_ignores_append_order() {
    let store = AuditStore::new();
    let now = Utc::now();

    store.append(entry("Middle", now - Duration::minutes(1)));
    store.append(entry("Newest", now));
    store.append(entry("Oldest", now - Duration::minutes(2)));

    assert_eq!(
        actions(&store.list_all()),
        vec!["Newest", "Middle", "Oldest"]
    );
}

#[test]
fn test_equal_timestamps_are_listed_deterministically() {
    let store = AuditStore::new();
    let now = Utc::now();

    store.append(entry("First", now));
    store.append(entry("Second", now));
    store.append(entry("Third", now));

    let listed = actions(&store.list_all())
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    assert_eq!(listed, vec!["Third", "Second", "First"]);
    assert_eq!(actions(&store.list_all()), listed);
}

#[test]
fn test_list_by_time_range() {
    let store = AuditStore::new();
    let now = Utc::now();

    store.append(entry("Action1", now - Duration::hours(3)));
    store.append(entry("Action2", now - Duration::hours(1)));
    store.append(entry("Action3", now));

    let entries = store.list_by_time_range(now - Duration::hours(2), now + Duration::hours(1));

    assert_eq!(actions(&entries), vec!["Action3", "Action2"]);
}

#[test]
fn test_list_by_time_range_is_inclusive() {
    let store = AuditStore::new();
    let now = Utc::now();
    let from = now - Duration::hours(1);

    store.append(entry("Lower", from));
    store.append(entry("Upper", now));
    store.append(entry("Outside", now + Duration::milliseconds(1)));

    let entries = store.list_by_time_range(from, now);

    assert_eq!(actions(&entries), vec!["Upper", "Lower"]);
}

#[test]
fn test_list_by_time_range_without_match() {
    let store = AuditStore::new();
    let now = Utc::now();

    store.append(entry("Action1", now));

    let entries = store.list_by_time_range(now + Duration::hours(1), now + Duration::hours(2));
    assert!(entries.is_empty());
}

#[test]
fn test_list_by_user() {
    let store = AuditStore::new();

    store.append(user_entry("Action1", "user1"));
    store.append(user_entry("Action2", "user2"));
    store.append(user_entry("Action3", "user1"));
    store.append(AuditEntry::builder().action("Anonymous").build());

    let entries = store.list_by_user(Some("user1")).unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.user_id() == Some("user1")));
}

#[test]
fn test_list_by_user_is_exact() {
    let store = AuditStore::new();

    store.append(user_entry("Action1", "User1"));
    store.append(user_entry("Action2", "user10"));

    assert!(store.list_by_user(Some("user1")).unwrap().is_empty());
}

#[test]
fn test_list_by_user_without_match() {
    let store = AuditStore::new();

    store.append(user_entry("Action1", "user1"));

    let entries = store.list_by_user(Some("user2")).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_list_by_user_rejects_blank_user() {
    let store = AuditStore::new();
    store.append(user_entry("Action1", "user1"));

    for user_id in [None, Some(""), Some("   ")] {
        let result = store.list_by_user(user_id);
        assert!(
            matches!(result, Err(Error::InvalidArgument(_))),
            "expected invalid argument for {user_id:?}"
        );
    }
}

#[test]
fn test_concurrent_append() {
    let store = Arc::new(AuditStore::new());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100 {
                    store.append(user_entry(&format!("action-{i}"), &format!("user{worker}")));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 800);
    assert_eq!(store.list_all().len(), 800);
    assert_eq!(store.list_by_user(Some("user3")).unwrap().len(), 100);

    let timestamps: Vec<_> = store.list_all().iter().map(|e| e.timestamp()).collect();
    assert!(timestamps.windows(2).all(|pair| pair[0] >= pair[1]));
}
