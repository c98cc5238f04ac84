//! Submission parsing tests.

mod common;

use common::*;
use scorebot_rs::submission::parse_submission;

#[test]
fn template_posts_parse_into_submissions() {
    let text = submission_text("puzzle_21", "sin(x)*2");
    let parsed = parse_submission("123", "alice", &text).unwrap();

    assert_eq!(parsed.post_id, "123");
    assert_eq!(parsed.handle, "alice");
    assert_eq!(parsed.puzzle_id, "puzzle_21");
    assert_eq!(parsed.expression, "sin(x)*2");
}

#[test]
fn expressions_spanning_lines_are_captured() {
    let text = "My solution for the puzzle of the day! #puzzle_3 solved in 40 characters\n\
                sin(x)\n+ cos(x)\nTry solving it yourself: https://play.example/daily";
    let parsed = parse_submission("124", "bob", text).unwrap();
    assert_eq!(parsed.puzzle_id, "puzzle_3");
    assert_eq!(parsed.expression, "sin(x)\n+ cos(x)");
}

#[test]
fn chatter_is_not_a_submission() {
    assert!(parse_submission("1", "a", "I love puzzles").is_none());
}

#[test]
fn missing_trailer_is_not_a_submission() {
    let text = "check out #puzzle_7 solved in 12 characters x+1";
    assert!(parse_submission("1", "a", text).is_none());
}

#[test]
fn malformed_tag_is_not_a_submission() {
    let text = submission_text("puzzle_abc", "x+1");
    assert!(parse_submission("1", "a", &text).is_none());
}

#[test]
fn empty_expression_is_not_a_submission() {
    let text = "solved! #puzzle_7 in 12 characters Try solving it yourself: https://x.example";
    assert!(parse_submission("1", "a", text).is_none());
}
