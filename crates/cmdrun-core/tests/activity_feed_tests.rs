mod common;

use chrono::Duration;
use common::{create_at, fixed_now, seeded_store};
use cmdrun_core::lifecycle::encode_timestamp;
use cmdrun_core::ops::command_ops;
use cmdrun_core::views::{build_activity_feed, get_last_command};
use cmdrun_core::RunCounters;

#[test]
fn test_feed_is_most_recent_first() {
    let mut store = seeded_store();
    let base = fixed_now() - Duration::hours(1);
    create_at(&mut store, "acme", "ten", base + Duration::seconds(10));
    create_at(&mut store, "acme", "thirty", base + Duration::seconds(30));
    create_at(&mut store, "acme", "twenty", base + Duration::seconds(20));

    let feed = build_activity_feed(&store, "acme").unwrap();
    let commands: Vec<&str> = feed.iter().map(|s| s.command.as_str()).collect();

    assert_eq!(commands, vec!["thirty", "twenty", "ten"]);
}

#[test]
fn test_feed_ties_keep_insertion_order() {
    let mut store = seeded_store();
    let start = fixed_now() - Duration::minutes(3);
    let first = create_at(&mut store, "acme", "first", start);
    let second = create_at(&mut store, "acme", "second", start);

    let feed = build_activity_feed(&store, "acme").unwrap();
    assert_eq!(feed[0].id, first.id);
    assert_eq!(feed[1].id, second.id);

    let last = get_last_command(&store, "acme").unwrap();
    assert_eq!(last.0.unwrap().id, first.id);
}

#[test]
fn test_feed_is_scoped_to_workspace() {
    let mut store = seeded_store();
    create_at(&mut store, "acme", "mine", fixed_now());
    create_at(&mut store, "globex", "theirs", fixed_now());

    let feed = build_activity_feed(&store, "acme").unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].command, "mine");
}

#[test]
fn test_missing_counters_project_as_zero() {
    let mut store = seeded_store();
    create_at(&mut store, "acme", "nmap", fixed_now());

    let json = serde_json::to_value(build_activity_feed(&store, "acme").unwrap()).unwrap();
    let row = &json[0];

    assert_eq!(row["vulnerabilities_count"], 0);
    assert_eq!(row["hosts_count"], 0);
    assert_eq!(row["services_count"], 0);
    assert_eq!(row["criticalIssue"], 0);
}

#[test]
fn test_recorded_counters_and_date_are_projected() {
    let mut store = seeded_store();
    let start = fixed_now() - Duration::minutes(1);
    let record = create_at(&mut store, "acme", "nmap", start);
    command_ops::record_counters(
        &mut store,
        record.id,
        RunCounters {
            vulnerabilities: Some(4),
            hosts: Some(2),
            services: None,
            vulnerability_critical: Some(1),
        },
    )
    .unwrap();

    let last = get_last_command(&store, "acme").unwrap();
    let json = serde_json::to_value(&last).unwrap();

    assert_eq!(json["_id"], record.id);
    assert_eq!(json["vulnerabilities_count"], 4);
    assert_eq!(json["hosts_count"], 2);
    assert_eq!(json["services_count"], 0);
    assert_eq!(json["criticalIssue"], 1);
    assert_eq!(json["date"], encode_timestamp(start));
    assert_eq!(json["tool"], "nmap");
}

#[test]
fn test_last_command_on_empty_workspace_is_empty_object() {
    let store = seeded_store();

    let last = get_last_command(&store, "acme").unwrap();
    assert!(last.is_empty());
    assert_eq!(serde_json::to_string(&last).unwrap(), "{}");
}

#[test]
fn test_unknown_workspace_has_empty_views() {
    let store = seeded_store();

    assert!(build_activity_feed(&store, "nope").unwrap().is_empty());
    assert!(get_last_command(&store, "nope").unwrap().is_empty());
}
