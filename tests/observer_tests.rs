//! Tests for result annotation and observer cleanup
//!
//! Results cross a serialization boundary between the dispatcher and the
//! reporting layer, so these go through JSON the way a report would.

use bootstrap_dispatch::{
    CLEANED_INVOCATION_KEY, InvocationObserver, OptionTree, ResultRecord, annotate,
};
use serde_json::{Value, json};

fn through_json(record: &ResultRecord) -> ResultRecord {
    let text = serde_json::to_string(record).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_side_channel_serialized_under_fixed_key() {
    let record = annotate(
        ResultRecord::ok().with_field("rc", 0),
        Some("shell"),
        Some("ls -la"),
        None,
    );
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(
        value[CLEANED_INVOCATION_KEY],
        json!({"module_name": "shell", "module_args": "ls -la"})
    );
    assert_eq!(value["rc"], json!(0));
    assert_eq!(value["succeeded"], json!(true));
}

#[test]
fn test_ok_result_cleaned_after_transport() {
    let complex: OptionTree = json!({"src": "motd.j2"}).as_object().cloned().unwrap();
    let record = annotate(
        ResultRecord::ok().with_field("changed", true),
        Some("template"),
        Some("src=motd.j2"),
        Some(&complex),
    );

    let mut received = through_json(&record);
    assert!(InvocationObserver::new().on_ok("web1", &mut received));

    let value = serde_json::to_value(&received).unwrap();
    assert!(value.get(CLEANED_INVOCATION_KEY).is_none());
    assert_eq!(
        value["invocation"],
        json!({
            "module_name": "template",
            "module_args": "src=motd.j2",
            "module_complex_args": {"src": "motd.j2"},
        })
    );
    assert_eq!(value["changed"], json!(true));
}

#[test]
fn test_failed_result_cleaned_and_existing_invocation_replaced() {
    let mut received: ResultRecord = serde_json::from_value(json!({
        "succeeded": false,
        "message": "Encountered error in command module: boom",
        "invocation": {
            "module_name": "bootstrap",
            "module_args": "sources='src=/a'",
            "module_complex_args": {"command": "uptime"},
        },
        "cleaned_invocation": {"module_name": "command", "module_args": "uptime"},
    }))
    .unwrap();

    assert!(InvocationObserver::new().on_failed("db1", &mut received));
    let invocation = received.invocation.unwrap();
    assert_eq!(invocation.module_name, "command");
    assert_eq!(invocation.module_args, "uptime");
    // Absent side-channel fields reset to defaults
    assert!(invocation.module_complex_args.is_empty());
    assert_eq!(
        received.message.as_deref(),
        Some("Encountered error in command module: boom")
    );
}

#[test]
fn test_result_without_side_channel_passes_through() {
    let original: ResultRecord = serde_json::from_value(json!({
        "succeeded": true,
        "stdout": "ok",
        "invocation": {"module_name": "ping", "module_args": ""},
    }))
    .unwrap();

    let mut received = original.clone();
    assert!(!InvocationObserver::new().on_ok("web1", &mut received));
    assert_eq!(received, original);
    assert_eq!(received.fields.get("stdout"), Some(&Value::from("ok")));
}

#[test]
fn test_cleaning_twice_is_a_no_op() {
    let mut record = annotate(ResultRecord::ok(), Some("raw"), Some("id"), None);
    let observer = InvocationObserver::new();
    assert!(observer.clean(&mut record));
    let once = record.clone();
    assert!(!observer.clean(&mut record));
    assert_eq!(record, once);
}
