//! Natural-language slot resolution collaborator.
//!
//! The bot's intent carries named slots; each filled slot contributes its
//! interpreted value as a search term.

use crate::{
    errors::ClientResult,
    models::{labels::normalize_label, photo::QuerySlots},
    services::http::{SignedClient, endpoint_url},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

const LABEL: &str = "lex";
const SERVICE: &str = "lex";

#[async_trait]
pub trait SlotResolver: Send + Sync + 'static {
    /// Resolve free text into normalized slot values. Zero slots is valid.
    async fn resolve_slots(&self, text: &str) -> ClientResult<QuerySlots>;
}

/// Identifies the bot conversation a query is sent to.
#[derive(Clone, Debug)]
pub struct BotTarget {
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
    /// Pinned session. When unset each query opens a fresh one.
    pub session_id: Option<String>,
}

impl BotTarget {
    fn session_for_query(&self) -> String {
        self.session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug)]
pub struct LexClient {
    client: SignedClient,
    base_url: String,
    target: BotTarget,
}

impl LexClient {
    pub fn new(client: SignedClient, base_url: impl Into<String>, target: BotTarget) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            target,
        }
    }
}

#[derive(Serialize)]
struct RecognizeTextRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeTextResponse {
    #[serde(default)]
    pub session_state: Option<SessionState>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SessionState {
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Intent {
    #[serde(default)]
    pub slots: Option<BTreeMap<String, Option<Slot>>>,
}

#[derive(Deserialize, Debug)]
pub struct Slot {
    #[serde(default)]
    pub value: Option<SlotValue>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SlotValue {
    #[serde(default)]
    pub interpreted_value: Option<String>,
}

impl RecognizeTextResponse {
    /// Filled slots, normalized. Unfilled or blank slots are skipped.
    pub fn into_slots(self) -> QuerySlots {
        self.session_state
            .and_then(|state| state.intent)
            .and_then(|intent| intent.slots)
            .unwrap_or_default()
            .into_values()
            .flatten()
            .filter_map(|slot| slot.value)
            .filter_map(|value| value.interpreted_value)
            .map(|value| normalize_label(&value))
            .filter(|value| !value.is_empty())
            .collect()
    }
}

#[async_trait]
impl SlotResolver for LexClient {
    async fn resolve_slots(&self, text: &str) -> ClientResult<QuerySlots> {
        let session_id = self.target.session_for_query();
        let url = endpoint_url(
            LABEL,
            &self.base_url,
            &[
                "bots",
                self.target.bot_id.as_str(),
                "botAliases",
                self.target.bot_alias_id.as_str(),
                "botLocales",
                self.target.locale_id.as_str(),
                "sessions",
                session_id.as_str(),
                "text",
            ],
        )?;

        let response: RecognizeTextResponse = self
            .client
            .post_json(
                LABEL,
                SERVICE,
                url,
                &[("content-type", "application/json")],
                &RecognizeTextRequest { text },
            )
            .await?;

        let slots = response.into_slots();
        debug!(session_id = %session_id, ?slots, "resolved query slots");
        Ok(slots)
    }
}
