//! Notification dispatch tests: field interpolation and graceful
//! degradation. Exact phrasing is deliberately not asserted.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::Utc;
use common::*;
use scorebot_rs::engine::notify::NotificationDispatcher;
use scorebot_rs::model::{LeaderboardEntry, WorkItem};
use scorebot_rs::social::SocialApi;

fn dispatcher(social: &Arc<RecordingSocial>) -> NotificationDispatcher {
    let social_dyn: Arc<dyn SocialApi> = social.clone();
    NotificationDispatcher::new(social_dyn, "https://leaderboard.example".to_string())
}

fn work_item(post_id: &str, handle: &str) -> WorkItem {
    WorkItem {
        post_id: post_id.to_string(),
        handle: handle.to_string(),
        puzzle_id: "puzzle_1".to_string(),
        expression: "x".to_string(),
        completed: false,
        attempts: 1,
        claimed_at: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn scored_reply_interpolates_score_fields() {
    let social = Arc::new(RecordingSocial::new());
    let report = score_report("Puzzle 9", Some(3.25), Some("https://cdn.example/r.mp4"));

    dispatcher(&social)
        .notify_scored(&work_item("T1", "alice"), &report, None)
        .await;

    let posts = social.recorded_posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].text.contains("Puzzle 9"));
    assert!(posts[0].text.contains("3.25"));
    assert!(posts[0].text.contains("3")); // char count
    assert!(posts[0].text.contains("https://leaderboard.example"));
    assert_eq!(posts[0].reply_to.as_deref(), Some("T1"));
    assert!(posts[0].media_id.is_some());
}

#[tokio::test]
async fn failed_media_upload_degrades_to_text_only() {
    let social = Arc::new(RecordingSocial::new());
    social.fail_uploads.store(true, Ordering::Relaxed);
    let report = score_report("Puzzle 9", Some(3.25), Some("https://cdn.example/r.mp4"));

    dispatcher(&social)
        .notify_scored(&work_item("T1", "alice"), &report, Some("thread_1"))
        .await;

    let posts = social.recorded_posts();
    assert_eq!(posts.len(), 2, "reply and cross-post still go out");
    assert!(posts.iter().all(|p| p.media_id.is_none()));
}

#[tokio::test]
async fn failed_post_is_swallowed() {
    let social = Arc::new(RecordingSocial::new());
    social.fail_posts.store(true, Ordering::Relaxed);
    let report = score_report("Puzzle 9", Some(1.0), None);

    // None of these may propagate an error into the orchestrator.
    let d = dispatcher(&social);
    let item = work_item("T1", "alice");
    d.notify_scored(&item, &report, Some("thread_1")).await;
    d.notify_invalid_puzzle(&item).await;
    d.notify_unknown_error(&item).await;
    d.notify_disqualified(&item).await;

    assert!(social.recorded_posts().is_empty());
}

#[tokio::test]
async fn duplicate_without_recording_posts_text_only() {
    let social = Arc::new(RecordingSocial::new());
    let existing = LeaderboardEntry {
        expression: "x".to_string(),
        time: Some(2.0),
        level: "Puzzle 1".to_string(),
        play_url: "https://play.example/p1?blob".to_string(),
        char_count: 1,
        player: "first".to_string(),
        gameplay_url: None,
    };

    dispatcher(&social)
        .notify_duplicate(&work_item("T2", "bob"), &existing)
        .await;

    assert_eq!(social.upload_count(), 0);
    let posts = social.recorded_posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].media_id.is_none());
}
