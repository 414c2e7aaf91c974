// Boundary logging emitted by engine handlers.
// Tests share one capture buffer, so each filters on its own request id.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use cmdrun_core::config::LifecycleConfig;
use cmdrun_core::lifecycle::encode_timestamp;
use cmdrun_core::logging_facility::test_capture::{init_test_capture, CapturedEvent};
use cmdrun_core::wire::CommandPayload;
use cmdrun_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_REQUEST_ID, FIELD_TRACE_ID,
};
use cmdrun_core_types::{RequestContext, TraceId};
use cmdrun_engine::commands::command_run::command_create;
use cmdrun_engine::commands::directory::workspace_create;
use cmdrun_engine::commands::summary::last_command;
use rusqlite::Connection;
use tempfile::TempDir;

fn setup_db() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let conn = cmdrun_store::db::open_and_migrate(temp_dir.path().join("log.db")).unwrap();
    (temp_dir, conn)
}

fn for_request<'a>(
    events: &'a [CapturedEvent],
    ctx: &'a RequestContext,
) -> impl Iterator<Item = &'a CapturedEvent> {
    events.iter().filter(move |e| {
        e.fields.get(FIELD_REQUEST_ID).map(String::as_str) == Some(ctx.request_id.as_str())
    })
}

#[test]
fn test_successful_create_logs_start_and_end() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();
    workspace_create(&mut conn, &RequestContext::new(), "acme", Utc::now()).unwrap();

    let ctx = RequestContext::new();
    let payload = CommandPayload::from_json(&format!(
        r#"{{"command": "ls", "itime": {}}}"#,
        encode_timestamp(Utc::now())
    ))
    .unwrap();
    let view = command_create(
        &mut conn,
        &ctx,
        &LifecycleConfig::default(),
        "acme",
        None,
        payload,
        Utc::now(),
    )
    .unwrap();

    let events = capture.find("command_create", EVENT_START);
    assert_eq!(for_request(&events, &ctx).count(), 1);

    let events = capture.find("command_create", EVENT_END);
    let end: Vec<_> = for_request(&events, &ctx).collect();
    assert_eq!(end.len(), 1);
    assert_eq!(end[0].fields.get("command_id"), Some(&view.id.to_string()));
    assert!(end[0].fields.contains_key("duration_ms"));
}

#[test]
fn test_failed_create_logs_error_code() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();

    let ctx = RequestContext::new();
    let payload = CommandPayload::from_json(r#"{"command": "ls", "itime": null}"#).unwrap();
    command_create(
        &mut conn,
        &ctx,
        &LifecycleConfig::default(),
        "acme",
        None,
        payload,
        Utc::now(),
    )
    .unwrap_err();

    let events = capture.find("command_create", EVENT_END_ERROR);
    let errors: Vec<_> = for_request(&events, &ctx).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].fields.get("err_code").map(String::as_str),
        Some("ERR_INVALID_TIMESTAMP")
    );

    let events = capture.find("command_create", EVENT_END);
    assert_eq!(for_request(&events, &ctx).count(), 0);
}

#[test]
fn test_last_command_logs_found_flag() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();
    workspace_create(&mut conn, &RequestContext::new(), "empty", Utc::now()).unwrap();

    let ctx = RequestContext::new();
    last_command(&mut conn, &ctx, "empty").unwrap();

    let events = capture.find("last_command", EVENT_END);
    let end: Vec<_> = for_request(&events, &ctx).collect();
    assert_eq!(end.len(), 1);
    assert_eq!(end[0].fields.get("found"), Some(&"false".to_string()));
}

#[test]
fn test_trace_id_reaches_logs_and_errors() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();

    let trace = TraceId::from_string("trace-from-caller".to_string());
    let ctx = RequestContext::new().with_trace_id(trace.clone());
    let payload = CommandPayload::from_json(&format!(
        r#"{{"command": "ls", "itime": {}}}"#,
        encode_timestamp(Utc::now())
    ))
    .unwrap();
    let err = command_create(
        &mut conn,
        &ctx,
        &LifecycleConfig::default(),
        "missing",
        None,
        payload,
        Utc::now(),
    )
    .unwrap_err();

    assert_eq!(err.code(), "ERR_NOT_FOUND");
    assert_eq!(err.request_id(), Some(&ctx.request_id));
    assert_eq!(err.trace_id(), Some(&trace));
    assert!(err.to_string().contains("trace-from-caller"));

    let events = capture.find("command_create", EVENT_START);
    let start: Vec<_> = for_request(&events, &ctx).collect();
    assert_eq!(start.len(), 1);
    assert_eq!(
        start[0].fields.get(FIELD_TRACE_ID).map(String::as_str),
        Some("trace-from-caller")
    );
}

#[test]
fn test_trace_id_absent_without_caller_trace() {
    let capture = init_test_capture();
    let (_tmp, mut conn) = setup_db();

    let ctx = RequestContext::new();
    workspace_create(&mut conn, &ctx, "acme", Utc::now()).unwrap();

    let events = capture.find("workspace_create", EVENT_START);
    let start: Vec<_> = for_request(&events, &ctx).collect();
    assert_eq!(start.len(), 1);
    assert!(!start[0].fields.contains_key(FIELD_TRACE_ID));
}
