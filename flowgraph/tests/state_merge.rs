//! Merge-semantics properties of the channelled state store.

use flowgraph::{Message, RunError, StateRecord, StateSchema, StateUpdate};

fn schema() -> StateSchema {
    StateSchema::builder()
        .messages("messages")
        .text("color")
        .counter("remaining_steps")
        .build()
}

/// **Scenario**: per-channel merge is associative — applying updates one
/// batch at a time equals applying them as one combined batch.
#[test]
fn merge_is_associative_per_channel() {
    let s = schema();
    let u1 = StateUpdate::new()
        .with_messages("messages", vec![Message::user("a")])
        .with_text("color", "red");
    let u2 = StateUpdate::new()
        .with_messages("messages", vec![Message::assistant("b")])
        .with_text("color", "blue")
        .with_counter("remaining_steps", 7);
    let u3 = StateUpdate::new().with_messages("messages", vec![Message::user("c")]);

    let stepwise = {
        let s1 = s.merge(&StateRecord::new(), &[u1.clone()]).unwrap();
        let s2 = s.merge(&s1, &[u2.clone()]).unwrap();
        s.merge(&s2, &[u3.clone()]).unwrap()
    };
    let batched = s.merge(&StateRecord::new(), &[u1, u2, u3]).unwrap();

    assert_eq!(stepwise, batched);
    assert_eq!(batched.text("color"), "blue");
    assert_eq!(batched.counter("remaining_steps"), 7);
    let contents: Vec<_> = batched
        .messages("messages")
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["a", "b", "c"]);
}

/// **Scenario**: the last writer wins for scalar channels regardless of how
/// the updates are batched.
#[test]
fn scalar_last_writer_wins_regardless_of_batching() {
    let s = schema();
    let writes: Vec<StateUpdate> = ["one", "two", "three"]
        .iter()
        .map(|v| StateUpdate::new().with_text("color", *v))
        .collect();

    let all_at_once = s.merge(&StateRecord::new(), &writes).unwrap();
    let mut one_by_one = StateRecord::new();
    for w in &writes {
        one_by_one = s.merge(&one_by_one, std::slice::from_ref(w)).unwrap();
    }

    assert_eq!(all_at_once.text("color"), "three");
    assert_eq!(one_by_one.text("color"), "three");
}

/// **Scenario**: re-merging a message list that shares ids with the stored
/// history updates in place — the fold of a sub-graph's state is idempotent.
#[test]
fn remerging_shared_history_does_not_duplicate() {
    let s = schema();
    let m1 = Message::user("hello");
    let m2 = Message::assistant("hi");
    let base = s
        .merge(
            &StateRecord::new(),
            &[StateUpdate::new().with_messages("messages", vec![m1.clone(), m2.clone()])],
        )
        .unwrap();

    // A sub-graph saw [m1, m2], appended m3, and folds back its whole list.
    let m3 = Message::assistant("one more");
    let folded = s
        .merge(
            &base,
            &[StateUpdate::new().with_messages("messages", vec![m1, m2, m3.clone()])],
        )
        .unwrap();
    assert_eq!(folded.messages("messages").len(), 3);
    assert_eq!(folded.messages("messages")[2].id, m3.id);
}

/// **Scenario**: updates naming unknown channels are rejected atomically.
#[test]
fn unknown_channel_is_schema_violation() {
    let s = schema();
    let err = s
        .merge(
            &StateRecord::new(),
            &[StateUpdate::new().with_text("unknownField", "x")],
        )
        .unwrap_err();
    assert!(matches!(err, RunError::SchemaViolation(msg) if msg.contains("unknownField")));
}

/// **Scenario**: reading scalars never fails — absent channels produce zero
/// values so routers can probe fields that are not set yet.
#[test]
fn zero_value_reads_for_unset_channels() {
    let record = StateRecord::new();
    assert_eq!(record.text("color"), "");
    assert_eq!(record.counter("remaining_steps"), 0);
    assert!(record.messages("messages").is_empty());
}
