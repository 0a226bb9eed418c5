//! Canonical event types emitted by the crowdfund contract.
//!
//! These mirror the contract events defined in `contracts/crowdfund/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the crowdfund contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new campaign was created (`created` topic).
    CampaignCreated,
    /// A reward tier was appended to a campaign (`reward` topic).
    RewardAdded,
    /// A limited reward tier was claimed by a pledge (`claimed` topic).
    RewardClaimed,
    /// A contributor pledged to a campaign (`pledged` topic).
    Pledged,
    /// The creator withdrew a successful campaign (`withdrawn` topic).
    Withdrawn,
    /// A contributor was refunded from a failed campaign (`refunded` topic).
    Refunded,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::CampaignCreated,
            "reward" => Self::RewardAdded,
            "claimed" => Self::RewardClaimed,
            "pledged" => Self::Pledged,
            "withdrawn" => Self::Withdrawn,
            "refunded" => Self::Refunded,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CampaignCreated => "campaign_created",
            Self::RewardAdded => "reward_added",
            Self::RewardClaimed => "reward_claimed",
            Self::Pledged => "pledged",
            Self::Withdrawn => "withdrawn",
            Self::Refunded => "refunded",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`].
    pub fn from_db(value: &str) -> Self {
        match value {
            "campaign_created" => Self::CampaignCreated,
            "reward_added" => Self::RewardAdded,
            "reward_claimed" => Self::RewardClaimed,
            "pledged" => Self::Pledged,
            "withdrawn" => Self::Withdrawn,
            "refunded" => Self::Refunded,
            _ => Self::Unknown,
        }
    }
}

/// A fully decoded crowdfund event, ready to be stored in the database.
///
/// Amounts are kept as decimal strings because the contract uses `i128`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdfundEvent {
    /// Unique RPC event id; the idempotency key for inserts.
    pub event_id: String,
    pub event_type: String,
    pub campaign_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub reward_index: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub campaign_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub reward_index: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        EventKind::from_db(&self.event_type)
    }

    /// The event amount parsed as the contract's `i128`, if present and valid.
    pub fn amount_value(&self) -> Option<i128> {
        self.amount.as_deref().and_then(|a| a.parse().ok())
    }
}
