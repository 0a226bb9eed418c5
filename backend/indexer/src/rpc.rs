//! Soroban RPC client: polls `getEvents` and decodes crowdfund events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns a transport error,
//!   a rate-limit response, or a soft JSON-RPC error, up to
//!   [`MAX_BACKOFF_SECS`] seconds.
//! * Codes `-32600` / `-32601` (malformed request, unknown method) are hard
//!   failures and end the poll with an error.
//!
//! ## Decoding
//!
//! Requests carry `"xdrFormat": "json"`, so topics and data come back as the
//! JSON form of `ScVal` (`topicJson` / `valueJson`) instead of base64 XDR.
//! Contract structs arrive as `{"map": [{"key": {"symbol": ..}, "val": ..}]}`.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{CrowdfundEvent, EventKind};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// `reward_index` the contract uses for "no tier" (`u32::MAX`).
const NO_REWARD: i64 = u32::MAX as i64;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn is_fatal(&self) -> bool {
        self.code == -32600 || self.code == -32601
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Topics as `ScVal` JSON, e.g. `{"symbol": "pledged"}`, `{"u64": "1"}`
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    /// Event data as `ScVal` JSON
    #[serde(rename = "valueJson", default)]
    pub value_json: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug, Default)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// Doubling delay capped at [`MAX_BACKOFF_SECS`].
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventsPage> {
    let mut backoff = Backoff::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });

    loop {
        let resp = match client.post(rpc_url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {}s): {e}", backoff.secs);
                backoff.wait().await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {}s)", backoff.secs);
            backoff.wait().await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if err.is_fatal() {
                return Err(IndexerError::EventParse(format!(
                    "RPC hard error {}: {}",
                    err.code, err.message
                )));
            }
            warn!(
                "RPC soft error (will retry in {}s): {} {}",
                backoff.secs, err.code, err.message
            );
            backoff.wait().await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::EventParse("Empty result from getEvents".to_string()))?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok(EventsPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Value {
    let mut params = json!({
        "xdrFormat": "json",
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        }
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode raw RPC events into [`CrowdfundEvent`]s.
///
/// Events from failed contract calls are dropped; they never took effect.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<CrowdfundEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call.unwrap_or(true))
        .filter_map(|(i, e)| decode_single(e, i, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, index: usize, contract_id: &str) -> Option<CrowdfundEvent> {
    let kind = EventKind::from_topic(&scval_string(raw.topic_json.first()?)?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let campaign_id = raw.topic_json.get(1).and_then(scval_string);

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{ledger}-{}-{index}",
                raw.tx_hash.as_deref().unwrap_or("notx")
            )
        });

    let data = decode_data(&raw.value_json, kind);
    let reward_index = data
        .reward_index
        .or_else(|| match kind {
            EventKind::RewardAdded | EventKind::RewardClaimed => raw
                .topic_json
                .get(2)
                .and_then(scval_string)
                .and_then(|s| s.parse().ok()),
            _ => None,
        })
        .filter(|i| *i != NO_REWARD);

    Some(CrowdfundEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        campaign_id,
        actor: data.actor,
        amount: data.amount,
        reward_index,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

#[derive(Debug, Default)]
struct EventData {
    actor: Option<String>,
    amount: Option<String>,
    reward_index: Option<i64>,
}

/// Pull the fields each event kind cares about out of its struct payload.
fn decode_data(value: &Value, kind: EventKind) -> EventData {
    let field = |key: &str| map_field(value, key).and_then(scval_string);
    let reward_index = || field("reward_index").and_then(|s| s.parse().ok());
    match kind {
        EventKind::CampaignCreated => EventData {
            actor: field("creator"),
            amount: field("goal"),
            reward_index: None,
        },
        EventKind::RewardAdded => EventData {
            actor: None,
            amount: field("minimum_contribution"),
            reward_index: reward_index(),
        },
        EventKind::RewardClaimed => EventData {
            actor: field("contributor"),
            amount: None,
            reward_index: reward_index(),
        },
        EventKind::Pledged => EventData {
            actor: field("contributor"),
            amount: field("amount"),
            reward_index: reward_index(),
        },
        EventKind::Withdrawn => EventData {
            actor: field("creator"),
            amount: field("amount"),
            reward_index: None,
        },
        EventKind::Refunded => EventData {
            actor: field("contributor"),
            amount: field("amount"),
            reward_index: None,
        },
        EventKind::Unknown => EventData::default(),
    }
}

/// Look up a symbol-keyed entry of an `ScVal` map.
fn map_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value
        .get("map")?
        .as_array()?
        .iter()
        .find(|entry| entry.pointer("/key/symbol").and_then(Value::as_str) == Some(key))
        .and_then(|entry| entry.get("val"))
}

/// Render a scalar `ScVal` as text.
///
/// Symbols, strings and addresses give their text; integers give their
/// decimal value whether encoded as a JSON number, a decimal string, or
/// `{"hi": .., "lo": ..}` parts.
fn scval_string(value: &Value) -> Option<String> {
    let (tag, inner) = value.as_object()?.iter().next()?;
    match tag.as_str() {
        "symbol" | "string" | "address" => inner.as_str().map(String::from),
        "u32" | "i32" | "u64" | "i64" | "u128" | "i128" | "timepoint" | "duration" => {
            match inner {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => int128_parts(inner).map(|v| v.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

fn int128_parts(parts: &Value) -> Option<i128> {
    let hi = parts.get("hi")?.as_i64()?;
    let lo = parts.get("lo")?.as_u64()?;
    Some((i128::from(hi) << 64) | i128::from(lo))
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
