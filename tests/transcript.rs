use pretty_assertions::assert_eq;
use trip_chat::{Message, Role, Transcript, FAILURE_MESSAGE};

#[test]
fn appended_fragments_concatenate_in_order() {
    let mut transcript = Transcript::new();
    let handle = transcript.begin_turn("plan a trip");
    let parts = ["", "Day 1", ": Lisbon\n", "", "Day 2: \u{1f686} Porto\n", "x"];

    for part in parts {
        assert!(transcript.append_fragment(&handle, part));
    }

    assert_eq!(transcript.assistant_content(&handle), Some(parts.concat().as_str()));
}

#[test]
fn zero_fragments_leave_empty_placeholder() {
    let mut transcript = Transcript::new();
    let handle = transcript.begin_turn("hi");

    assert_eq!(transcript.assistant_content(&handle), Some(""));
    assert_eq!(transcript.len(), 2);
}

#[test]
fn overlapping_turns_keep_their_own_slots() {
    let mut transcript = Transcript::new();
    let first = transcript.begin_turn("one");
    let second = transcript.begin_turn("two");

    transcript.append_fragment(&first, "late reply\n");
    transcript.append_fragment(&second, "second reply\n");
    transcript.append_fragment(&first, "more\n");

    assert_eq!(
        transcript.messages(),
        &[
            Message::user("one"),
            Message::assistant("late reply\nmore\n"),
            Message::user("two"),
            Message::assistant("second reply\n"),
        ]
    );
}

#[test]
fn fail_turn_appends_diagnostic_and_keeps_placeholder() {
    let mut transcript = Transcript::new();
    let handle = transcript.begin_turn("hello");
    let position = transcript.fail_turn("HTTP 503: Service Unavailable");

    assert_eq!(position, 2);
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.messages()[1], Message::assistant(""));
    assert_eq!(transcript.messages()[2].role, Role::Assistant);
    assert_eq!(transcript.messages()[2].content, FAILURE_MESSAGE);
    assert_eq!(transcript.slot(&handle), Some(1));
}

#[test]
fn fragments_after_failure_still_target_their_turn_slot() {
    let mut transcript = Transcript::new();
    let handle = transcript.begin_turn("hello");
    transcript.fail_turn("read error");
    transcript.append_fragment(&handle, "partial\n");

    assert_eq!(transcript.messages()[1].content, "partial\n");
    assert_eq!(transcript.messages()[2].content, FAILURE_MESSAGE);
}

#[test]
fn clear_empties_transcript_and_invalidates_handles() {
    let mut transcript = Transcript::new();
    let handle = transcript.begin_turn("hello");
    transcript.clear();

    assert!(transcript.is_empty());
    assert!(!transcript.append_fragment(&handle, "ignored"));
    assert_eq!(transcript.assistant_content(&handle), None);
}
