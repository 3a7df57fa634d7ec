use super::*;
use chrono::TimeZone;

#[test]
fn append_keeps_arrival_order_per_channel() {
    let mut sink = OutputSink::new();
    sink.append(Channel::Console, Severity::Info, "one");
    sink.append(Channel::Terminal, Severity::Info, ">>> 1");
    sink.append(Channel::Console, Severity::Error, "two");

    let texts: Vec<_> = sink
        .entries(Channel::Console)
        .iter()
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(texts, vec!["one", "two"]);
    assert_eq!(sink.len(Channel::Terminal), 1);
    assert!(sink.is_empty(Channel::Debug));
    assert_eq!(sink.total_len(), 3);
}

#[test]
fn append_returns_the_stored_entry() {
    let mut sink = OutputSink::new();
    let entry = sink.append(Channel::Debug, Severity::Warning, "careful");
    assert_eq!(entry.channel, Channel::Debug);
    assert_eq!(entry.severity, Severity::Warning);
    assert_eq!(sink.last(Channel::Debug).unwrap().text, "careful");
}

#[test]
fn clear_only_touches_one_channel_and_is_idempotent() {
    let mut sink = OutputSink::new();
    sink.append(Channel::Console, Severity::Info, "a");
    sink.append(Channel::Terminal, Severity::Info, "b");

    assert!(sink.clear(Channel::Console));
    assert!(sink.is_empty(Channel::Console));
    assert_eq!(sink.len(Channel::Terminal), 1);

    assert!(!sink.clear(Channel::Console));
    assert!(sink.is_empty(Channel::Console));
}

#[test]
fn display_line_prefixes_wall_clock_time() {
    let mut sink = OutputSink::new();
    let ts = Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
    let entry = sink.append_at(Channel::Console, Severity::Success, "done", ts);
    assert_eq!(entry.display_line(), "[09:05:07] done");
}

#[test]
fn labels_are_lowercase() {
    assert_eq!(Channel::Terminal.label(), "terminal");
    assert_eq!(Severity::Error.label(), "error");
}
