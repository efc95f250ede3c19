use agent_stream::decoder::decode_all;
use agent_stream::{is_sentinel, LineDecoder};
use pretty_assertions::assert_eq;

const TRANSCRIPT: &str = concat!(
    "event: message\n",
    "data: Day 1: arrive in Kyoto\n",
    "\n",
    "data: Day 2: Fushimi Inari \u{26e9}\u{fe0f}\n",
    "data: \n",
    "Budget: \u{a5}20,000 per night\n",
    "noise data: trailing payload\n",
    "data: caf\u{e9} \u{1f375}\n",
);

fn decode_with_splits(bytes: &[u8], splits: &[usize]) -> Vec<String> {
    let mut decoder = LineDecoder::new();
    let mut fragments = Vec::new();
    let mut start = 0;
    for &split in splits.iter().chain(std::iter::once(&bytes.len())) {
        let step = decoder.feed(&bytes[start..split]).expect("valid utf-8");
        fragments.extend(step.fragments);
        start = split;
    }
    fragments.extend(decoder.finish().expect("clean end").fragments);
    fragments
}

#[test]
fn framing_tolerance_matches_documented_cases() {
    assert_eq!(decode_all(b"data: hello\n").unwrap(), vec!["hello\n"]);
    assert_eq!(decode_all(b"hello\n").unwrap(), vec!["hello\n"]);
    assert!(decode_all(b"event: ping\n").unwrap().is_empty());
    assert_eq!(decode_all(b"foo data: bar\n").unwrap(), vec!["bar\n"]);
}

#[test]
fn every_single_split_point_yields_identical_output() {
    let bytes = TRANSCRIPT.as_bytes();
    let whole = decode_with_splits(bytes, &[]);
    assert_eq!(
        whole,
        vec![
            "Day 1: arrive in Kyoto\n",
            "Day 2: Fushimi Inari \u{26e9}\u{fe0f}\n",
            "\n",
            "Budget: \u{a5}20,000 per night\n",
            "trailing payload\n",
            "caf\u{e9} \u{1f375}\n",
        ]
    );

    for split in 1..bytes.len() {
        assert_eq!(
            decode_with_splits(bytes, &[split]).concat(),
            whole.concat(),
            "split at byte {split}"
        );
    }
}

#[test]
fn byte_at_a_time_delivery_matches_single_chunk() {
    let bytes = TRANSCRIPT.as_bytes();
    let splits: Vec<usize> = (1..bytes.len()).collect();
    assert_eq!(decode_with_splits(bytes, &splits), decode_with_splits(bytes, &[]));
}

#[test]
fn multibyte_character_split_across_chunks_decodes_identically() {
    let line = "data: \u{1f30d} travel\n".as_bytes();
    let emoji_start = "data: ".len();
    for offset in 1..4 {
        let fragments = decode_with_splits(line, &[emoji_start + offset]);
        assert_eq!(fragments, vec!["\u{1f30d} travel\n"]);
    }
}

#[test]
fn sentinel_variants_are_never_emitted() {
    for sentinel in ["data: [DONE]", "data: done", "DONE", "[done]", "data:  [Done]  "] {
        let input = format!("data: before\n{sentinel}\ndata: after\n");
        let fragments = decode_all(input.as_bytes()).unwrap();
        assert_eq!(fragments, vec!["before\n"], "sentinel {sentinel:?}");
        assert!(fragments.iter().all(|fragment| !is_sentinel(fragment)));
    }
}

#[test]
fn sentinel_without_trailing_newline_is_recognized_at_end() {
    let fragments = decode_all(b"data: Hi\ndata: there\n[DONE]").unwrap();
    assert_eq!(fragments, vec!["Hi\n", "there\n"]);
}

#[test]
fn crlf_framing_behaves_like_lf() {
    let lf = decode_all(b"data: one\n\ndata: two\n\n").unwrap();
    let crlf = decode_all(b"data: one\r\n\r\ndata: two\r\n\r\n").unwrap();
    assert_eq!(lf, crlf);
}

#[test]
fn payload_that_merely_contains_done_is_content() {
    let fragments = decode_all(b"data: done deal\ndata: [DONE] soon\n").unwrap();
    assert_eq!(fragments, vec!["done deal\n", "[DONE] soon\n"]);
}
