//! Shared in-memory fakes for pipeline tests.

#![allow(dead_code)] // each test binary uses a subset of the helpers

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use scorebot_rs::error::{Error, Result};
use scorebot_rs::model::{
    LeaderboardEntry, NewSubmission, PuzzleRecord, QueueResult, ScoreReport, WorkItem,
};
use scorebot_rs::persist::Gateway;
use scorebot_rs::scoring::Scorer;
use scorebot_rs::social::pool::Credential;
use scorebot_rs::social::{RawPost, SearchPage, SearchStart, SocialApi, TokenPair};
use secrecy::SecretString;

// ---------------------------------------------------------------------------
// Gateway fake
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<GatewayState>,
    /// Post ids whose enqueue should fail, for isolation tests.
    pub fail_queue_for: Mutex<HashSet<String>>,
}

#[derive(Default)]
struct GatewayState {
    config: HashMap<String, String>,
    queue: Vec<WorkItem>,
    puzzles: HashMap<String, PuzzleRecord>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_puzzle(&self, id: &str, puzzle_url: &str) {
        self.state.lock().unwrap().puzzles.insert(
            id.to_string(),
            PuzzleRecord {
                id: id.to_string(),
                puzzle_url: puzzle_url.to_string(),
            },
        );
    }

    pub fn seed_work(&self, post_id: &str, handle: &str, puzzle_id: &str, expression: &str) {
        self.state.lock().unwrap().queue.push(WorkItem {
            post_id: post_id.to_string(),
            handle: handle.to_string(),
            puzzle_id: puzzle_id.to_string(),
            expression: expression.to_string(),
            completed: false,
            attempts: 0,
            claimed_at: None,
            created_at: Utc::now(),
        });
    }

    pub fn seed_entry(&self, entry: LeaderboardEntry) {
        self.state.lock().unwrap().leaderboard.push(entry);
    }

    pub fn put_config(&self, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .config
            .insert(key.to_string(), value.to_string());
    }

    pub fn config(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().config.get(key).cloned()
    }

    pub fn work(&self, post_id: &str) -> Option<WorkItem> {
        self.state
            .lock()
            .unwrap()
            .queue
            .iter()
            .find(|w| w.post_id == post_id)
            .cloned()
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    pub fn leaderboard_len(&self) -> usize {
        self.state.lock().unwrap().leaderboard.len()
    }

    pub fn entry_by_url(&self, play_url: &str) -> Option<LeaderboardEntry> {
        self.state
            .lock()
            .unwrap()
            .leaderboard
            .iter()
            .find(|e| e.play_url == play_url)
            .cloned()
    }

    /// Pre-claim an item, as if another cycle were holding it.
    pub fn hold_claim(&self, post_id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state.queue.iter_mut().find(|w| w.post_id == post_id) {
            item.claimed_at = Some(Utc::now());
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn get_config(&self, key: &str) -> Result<Option<String>> {
        Ok(self.config(key))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.put_config(key, value);
        Ok(())
    }

    async fn queue_submission(&self, new: &NewSubmission) -> Result<QueueResult> {
        if self.fail_queue_for.lock().unwrap().contains(&new.post_id) {
            return Err(Error::Other(format!("induced failure for {}", new.post_id)));
        }
        let mut state = self.state.lock().unwrap();
        if state.queue.iter().any(|w| w.post_id == new.post_id) {
            return Ok(QueueResult::Duplicate);
        }
        state.queue.push(WorkItem {
            post_id: new.post_id.clone(),
            handle: new.handle.clone(),
            puzzle_id: new.puzzle_id.clone(),
            expression: new.expression.clone(),
            completed: false,
            attempts: 0,
            claimed_at: None,
            created_at: Utc::now(),
        });
        Ok(QueueResult::Queued)
    }

    async fn eligible_work(&self) -> Result<Vec<WorkItem>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .queue
            .iter()
            .filter(|w| !w.completed && w.attempts < 3)
            .cloned()
            .collect())
    }

    async fn get_work(&self, post_id: &str) -> Result<Option<WorkItem>> {
        Ok(self.work(post_id))
    }

    async fn claim_work(&self, post_id: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let Some(item) = state.queue.iter_mut().find(|w| w.post_id == post_id) else {
            return Ok(false);
        };
        if item.completed || item.claimed_at.is_some() {
            return Ok(false);
        }
        item.claimed_at = Some(Utc::now());
        Ok(true)
    }

    async fn release_claim(&self, post_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state.queue.iter_mut().find(|w| w.post_id == post_id) {
            item.claimed_at = None;
        }
        Ok(())
    }

    async fn complete_work(&self, post_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .queue
            .iter_mut()
            .find(|w| w.post_id == post_id)
            .ok_or_else(|| Error::NotFound(format!("work item {post_id}")))?;
        item.completed = true;
        Ok(())
    }

    async fn increment_attempts(&self, post_id: &str) -> Result<i32> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .queue
            .iter_mut()
            .find(|w| w.post_id == post_id)
            .ok_or_else(|| Error::NotFound(format!("work item {post_id}")))?;
        item.attempts += 1;
        Ok(item.attempts)
    }

    async fn get_puzzle(&self, puzzle_id: &str) -> Result<Option<PuzzleRecord>> {
        Ok(self.state.lock().unwrap().puzzles.get(puzzle_id).cloned())
    }

    async fn leaderboard_entry_by_url(
        &self,
        play_url: &str,
    ) -> Result<Option<LeaderboardEntry>> {
        Ok(self.entry_by_url(play_url))
    }

    async fn add_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state
            .leaderboard
            .iter()
            .any(|e| e.play_url == entry.play_url)
        {
            return Ok(());
        }
        state.leaderboard.push(entry.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Social fake
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub text: String,
    pub reply_to: Option<String>,
    pub media_id: Option<String>,
    pub use_primary: bool,
}

#[derive(Default)]
pub struct RecordingSocial {
    /// Scripted search pages, popped in order. An exhausted script returns
    /// an empty final page.
    pub pages: Mutex<VecDeque<SearchPage>>,
    pub posts: Mutex<Vec<RecordedPost>>,
    pub uploads: Mutex<Vec<String>>,
    /// (client_id, refresh token the call was made with)
    pub refreshes: Mutex<Vec<(String, String)>>,
    pub fail_uploads: AtomicBool,
    pub fail_posts: AtomicBool,
    pub fail_refresh_for: Mutex<HashSet<String>>,
}

impl RecordingSocial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(
        &self,
        posts: Vec<RawPost>,
        next_token: Option<&str>,
        newest_id: Option<&str>,
    ) {
        self.pages.lock().unwrap().push_back(SearchPage {
            posts,
            next_token: next_token.map(str::to_string),
            newest_id: newest_id.map(str::to_string),
        });
    }

    pub fn recorded_posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl SocialApi for RecordingSocial {
    async fn search_recent(
        &self,
        _query: &str,
        _start: &SearchStart,
        _page_token: Option<&str>,
    ) -> Result<SearchPage> {
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media_id: Option<&str>,
        use_primary: bool,
    ) -> Result<String> {
        if self.fail_posts.load(Ordering::Relaxed) {
            return Err(Error::Social {
                status: 503,
                message: "induced post failure".to_string(),
            });
        }
        let mut posts = self.posts.lock().unwrap();
        posts.push(RecordedPost {
            text: text.to_string(),
            reply_to: reply_to.map(str::to_string),
            media_id: media_id.map(str::to_string),
            use_primary,
        });
        Ok(format!("post_{}", posts.len()))
    }

    async fn upload_media(&self, source_url: &str, _mime_type: &str) -> Result<String> {
        if self.fail_uploads.load(Ordering::Relaxed) {
            return Err(Error::Social {
                status: 500,
                message: "induced upload failure".to_string(),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(source_url.to_string());
        Ok(format!("media_{}", uploads.len()))
    }

    async fn refresh_credential(
        &self,
        credential: &Credential,
        refresh_token: &str,
    ) -> Result<TokenPair> {
        if self
            .fail_refresh_for
            .lock()
            .unwrap()
            .contains(&credential.client_id)
        {
            return Err(Error::Social {
                status: 400,
                message: "induced refresh failure".to_string(),
            });
        }
        self.refreshes
            .lock()
            .unwrap()
            .push((credential.client_id.clone(), refresh_token.to_string()));
        Ok(TokenPair {
            bearer_token: format!("new_bearer_{}", credential.client_id),
            refresh_token: format!("new_refresh_{}", credential.client_id),
        })
    }
}

// ---------------------------------------------------------------------------
// Scorer fake
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedScorer {
    /// Scripted responses, popped in order. Exhausted scripts fail with a
    /// 503, which reads as a scoring outage.
    responses: Mutex<VecDeque<std::result::Result<ScoreReport, u16>>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, report: ScoreReport) {
        self.responses.lock().unwrap().push_back(Ok(report));
    }

    pub fn push_status(&self, status: u16) {
        self.responses.lock().unwrap().push_back(Err(status));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Scorer for ScriptedScorer {
    async fn score(&self, submission_url: &str) -> Result<ScoreReport> {
        self.calls.lock().unwrap().push(submission_url.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(report)) => Ok(report),
            Some(Err(status)) => Err(Error::ScoringStatus(status)),
            None => Err(Error::ScoringStatus(503)),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn credential(client_id: &str, owner_user_id: &str) -> Credential {
    Credential {
        client_id: client_id.to_string(),
        client_secret: SecretString::from(format!("{client_id}_secret")),
        owner_user_id: owner_user_id.to_string(),
    }
}

pub fn raw_post(id: &str, author_id: &str, author_name: &str, text: &str) -> RawPost {
    RawPost {
        id: id.to_string(),
        author_id: author_id.to_string(),
        author_name: author_name.to_string(),
        text: text.to_string(),
    }
}

pub fn score_report(level: &str, time: Option<f64>, gameplay: Option<&str>) -> ScoreReport {
    ScoreReport {
        expression: "x+1".to_string(),
        gameplay: gameplay.map(str::to_string),
        level: level.to_string(),
        char_count: 3,
        play_url: "ignored-by-pipeline".to_string(),
        time,
    }
}

/// A syntactically valid puzzle URL with a small config blob.
pub fn puzzle_url(prefix: &str) -> String {
    scorebot_rs::level::encode_config(prefix, &serde_json::json!({ "goal": "ride" })).unwrap()
}

/// The fixed post template submissions arrive in.
pub fn submission_text(puzzle_tag: &str, expression: &str) -> String {
    format!(
        "My solution for the puzzle of the day! #{puzzle_tag} solved in 12 characters \
         {expression} Try solving it yourself: https://play.example/daily"
    )
}
