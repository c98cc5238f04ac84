//! Credential lifecycle tests: refresh persistence and per-credential
//! isolation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use scorebot_rs::persist::Gateway;
use scorebot_rs::social::SocialApi;
use scorebot_rs::social::auth::{
    CredentialLifecycleManager, bearer_token_key, refresh_token_key,
};
use scorebot_rs::social::pool::CredentialPool;

fn manager(
    gateway: &Arc<MemoryGateway>,
    social: &Arc<RecordingSocial>,
    pool: CredentialPool,
) -> CredentialLifecycleManager {
    let gateway_dyn: Arc<dyn Gateway> = gateway.clone();
    let social_dyn: Arc<dyn SocialApi> = social.clone();
    CredentialLifecycleManager::new(
        Arc::new(pool),
        social_dyn,
        gateway_dyn,
        "http://127.0.0.1:8080/oauth/callback".to_string(),
        Duration::from_secs(60),
    )
}

#[tokio::test]
async fn refresh_persists_both_tokens_per_credential() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.put_config(&refresh_token_key("c1"), "r1");
    let social = Arc::new(RecordingSocial::new());
    let pool = CredentialPool::new(vec![credential("c1", "u1"), credential("c2", "u2")]).unwrap();

    manager(&gateway, &social, pool).refresh_all().await;

    assert_eq!(
        gateway.config(&bearer_token_key("c1")).as_deref(),
        Some("new_bearer_c1")
    );
    assert_eq!(
        gateway.config(&refresh_token_key("c1")).as_deref(),
        Some("new_refresh_c1")
    );
    assert_eq!(
        gateway.config(&bearer_token_key("c2")).as_deref(),
        Some("new_bearer_c2")
    );

    // c1 exchanged its stored token; c2 had none and sent the sentinel.
    let refreshes = social.refreshes.lock().unwrap().clone();
    assert_eq!(refreshes[0], ("c1".to_string(), "r1".to_string()));
    assert_eq!(refreshes[1].0, "c2");
    assert_eq!(refreshes[1].1, "<null>");
}

#[tokio::test]
async fn one_failing_credential_does_not_block_the_rest() {
    let gateway = Arc::new(MemoryGateway::new());
    let social = Arc::new(RecordingSocial::new());
    social
        .fail_refresh_for
        .lock()
        .unwrap()
        .insert("c1".to_string());
    let pool = CredentialPool::new(vec![credential("c1", "u1"), credential("c2", "u2")]).unwrap();

    manager(&gateway, &social, pool).refresh_all().await;

    assert!(gateway.config(&bearer_token_key("c1")).is_none());
    assert_eq!(
        gateway.config(&bearer_token_key("c2")).as_deref(),
        Some("new_bearer_c2")
    );
}
