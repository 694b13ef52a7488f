//! End-to-end behavior of the dynamic token injection hook.

use async_trait::async_trait;
use bq_oauth_agent::{
    ACCESS_TOKEN_FIELD, DYNAMIC_AUTH_PARAM, DynamicTokenInjector, Result, SessionState, Tool,
    TokenCache, TokenMinter, TokenResolver, ToolCallback, ToolContext,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

const STATE_KEY: &str = "temp:bq_dynamic_oauth_0";

struct QueryTool;

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> &str {
        "bqcitibike_ExecuteCustomQuery"
    }
    fn description(&self) -> &str {
        "runs a custom query"
    }
    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<Value> {
        Ok(args)
    }
}

struct StubMinter(String);

#[async_trait]
impl TokenMinter for StubMinter {
    async fn mint(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

fn query_args() -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("query".to_string(), json!("SELECT start_station_name FROM trips LIMIT 5"));
    args
}

async fn inject(resolver: TokenResolver, session: &SessionState) -> Map<String, Value> {
    let ctx = ToolContext::new(session.clone(), "inv-test");
    let mut args = query_args();
    DynamicTokenInjector::new(resolver).before_tool(&QueryTool, &mut args, &ctx).await.unwrap();
    args
}

#[tokio::test]
async fn session_token_is_injected_exactly() {
    let session = SessionState::new();
    session.set(STATE_KEY, json!("tok123"));

    let resolver = TokenResolver::new(STATE_KEY, Arc::new(TokenCache::new()));
    let args = inject(resolver, &session).await;

    let raw = args[DYNAMIC_AUTH_PARAM].as_str().unwrap();
    let envelope: Value = serde_json::from_str(raw).unwrap();
    assert_eq!(envelope, json!({"oauth2_auth_code_flow.access_token": "tok123"}));
}

#[tokio::test]
async fn cached_token_is_injected_and_written_back() {
    let session = SessionState::new();
    let cache = Arc::new(TokenCache::new());
    cache.store("cached-tok");

    let resolver = TokenResolver::new(STATE_KEY, cache);
    let args = inject(resolver, &session).await;

    let envelope: Value = serde_json::from_str(args[DYNAMIC_AUTH_PARAM].as_str().unwrap()).unwrap();
    assert_eq!(envelope[ACCESS_TOKEN_FIELD], "cached-tok");
    assert_eq!(session.get(STATE_KEY), Some(json!("cached-tok")));
}

#[tokio::test]
async fn locally_minted_token_is_injected() {
    let session = SessionState::new();
    let resolver = TokenResolver::new(STATE_KEY, Arc::new(TokenCache::new()))
        .with_minter(Arc::new(StubMinter("minted-tok".to_string())));

    let args = inject(resolver, &session).await;

    let envelope: Value = serde_json::from_str(args[DYNAMIC_AUTH_PARAM].as_str().unwrap()).unwrap();
    assert_eq!(envelope[ACCESS_TOKEN_FIELD], "minted-tok");
}

#[tokio::test]
async fn unresolvable_token_leaves_arguments_untouched() {
    let session = SessionState::new();
    let resolver = TokenResolver::new(STATE_KEY, Arc::new(TokenCache::new()));

    let args = inject(resolver, &session).await;

    assert_eq!(args, query_args());
}

#[tokio::test]
async fn injected_envelope_is_valid_json_with_one_key() {
    let session = SessionState::new();
    session.set(STATE_KEY, json!("any-token"));

    let resolver = TokenResolver::new(STATE_KEY, Arc::new(TokenCache::new()));
    let args = inject(resolver, &session).await;

    let envelope: Value = serde_json::from_str(args[DYNAMIC_AUTH_PARAM].as_str().unwrap()).unwrap();
    let object = envelope.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object.contains_key(ACCESS_TOKEN_FIELD));
}

#[tokio::test]
async fn token_survives_turn_boundary_via_process_cache() {
    let session = SessionState::new();
    session.set(STATE_KEY, json!("tok123"));
    let cache = Arc::new(TokenCache::new());

    // First turn resolves from session state and fills the cache.
    let resolver = TokenResolver::new(STATE_KEY, cache.clone());
    inject(resolver, &session).await;

    // Turn boundary clears temp state.
    session.clear_temp();
    assert_eq!(session.get(STATE_KEY), None);

    // Second turn falls back to the cache and repopulates the session.
    let resolver = TokenResolver::new(STATE_KEY, cache);
    let args = inject(resolver, &session).await;

    let envelope: Value = serde_json::from_str(args[DYNAMIC_AUTH_PARAM].as_str().unwrap()).unwrap();
    assert_eq!(envelope[ACCESS_TOKEN_FIELD], "tok123");
    assert_eq!(session.get(STATE_KEY), Some(json!("tok123")));
}
