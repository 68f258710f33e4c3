//! 📜 Rule registration - telling the provider what we want to hear about.
//!
//! One rule. One call. At startup. If it fails, we don't start, because a stream
//! without a rule is a radio tuned to static.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::TwitterClient;

const RULES_PATH: &str = "/2/tweets/search/stream/rules";

/// 🏀 A topic filter: what to match, and what to call it.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub(crate) struct TopicRule {
    pub value: &'static str,
    pub tag: &'static str,
}

/// 🏀 The one and only rule. Not configurable. Basketball or bust.
pub(crate) const NBA_RULE: TopicRule = TopicRule {
    value: "nba",
    tag: "nba tweets",
};

#[derive(Debug, Serialize)]
struct AddRulesRequest<'a> {
    add: &'a [TopicRule],
}

/// 📦 What the provider says back. Only ever logged, never stored.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RegistrationResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<RegisteredRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct RegisteredRule {
    pub id: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// 🚀 Add `rule` to the stream's rule set.
///
/// `dry_run=false`: really add it. Existing rules stay where they are; we add, we never clear.
/// Any transport error, non-2xx status, or unreadable body is an `Err`, and the caller
/// treats that as fatal.
pub(crate) async fn register_rule(client: &TwitterClient, rule: &TopicRule) -> Result<RegistrationResult> {
    info!(
        "📜 Registering stream rule '{}' tagged '{}'",
        rule.value, rule.tag
    );

    let response = client
        .post(RULES_PATH, &[("dry_run", "false".to_string())])?
        .json(&AddRulesRequest {
            add: std::slice::from_ref(rule),
        })
        .send()
        .await
        .context("💀 The add-rule request never made it upstream. Check connectivity and the host.")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!(
            "💀 The provider refused our rule with '{}'. It said: '{}'. \
             Usually this is the token. It's usually the token.",
            status,
            body
        );
    }

    let result: RegistrationResult = response
        .json()
        .await
        .context("💀 The provider accepted the rule but answered in a dialect serde doesn't speak.")?;

    // ⚠️ Duplicate rules come back as 2xx with `errors`. Noted, not fatal.
    if !result.errors.is_empty() {
        warn!("⚠️ Rule registration came back with {} error(s)", result.errors.len());
    }

    let the_pretty_result = serde_json::to_string_pretty(&result)
        .context("💀 Couldn't pretty-print the registration result. It was too ugly.")?;
    info!("✅ Stream rule registration result:\n{}", the_pretty_result);

    Ok(result)
}
