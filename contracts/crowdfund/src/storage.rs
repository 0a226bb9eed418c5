//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the contract.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key             | Type      | Description                         |
//! |-----------------|-----------|-------------------------------------|
//! | `CampaignCount` | `u64`     | Highest campaign ID allocated       |
//! | `Admin`         | `Address` | Deployer allowed to call `init`     |
//! | `Token`         | `Address` | Settlement asset for all transfers  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                        | Type              | Description                      |
//! |----------------------------|-------------------|----------------------------------|
//! | `CampConfig(id)`           | `CampaignConfig`  | Immutable campaign configuration |
//! | `CampState(id)`            | `CampaignState`   | Mutable campaign state           |
//! | `Rewards(id)`              | `Vec<RewardTier>` | Append-only reward tiers         |
//! | `Pledge(id, contributor)`  | `i128`            | Un-refunded pledge amount        |
//! | `ContribTotal(contributor)`| `i128`            | Sum of a contributor's pledges   |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Pledges write only `CampState` plus the two ledger entries; the config is
//! never rewritten after creation.

use soroban_sdk::{contracttype, Address, Env, TryFromVal, Val, Vec};

use crate::types::{Campaign, CampaignConfig, CampaignState, RewardTier};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Highest allocated campaign ID (Instance).
    CampaignCount,
    /// Deployment admin, set by the constructor (Instance).
    Admin,
    /// Settlement token address (Instance).
    Token,
    /// Immutable campaign configuration keyed by ID (Persistent).
    CampConfig(u64),
    /// Mutable campaign state keyed by ID (Persistent).
    CampState(u64),
    /// Reward tiers of a campaign, in insertion order (Persistent).
    Rewards(u64),
    /// Pledge amount of one contributor to one campaign (Persistent).
    Pledge(u64, Address),
    /// Contributor's total across all campaigns (Persistent).
    ContribTotal(Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Reads, increments, and stores the campaign counter.
/// Returns the ID for the new campaign (post-increment, so IDs start at 1).
pub fn next_campaign_id(env: &Env) -> u64 {
    bump_instance(env);
    let next = campaign_count(env) + 1;
    env.storage().instance().set(&DataKey::CampaignCount, &next);
    next
}

pub fn campaign_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::CampaignCount)
        .unwrap_or(0)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::Admin)
}

pub fn has_token(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Token)
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

pub fn get_token(env: &Env) -> Option<Address> {
    let token = env.storage().instance().get(&DataKey::Token);
    if token.is_some() {
        bump_instance(env);
    }
    token
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Read a persistent entry and extend its TTL if present.
fn read_persistent<V>(env: &Env, key: &DataKey) -> Option<V>
where
    V: TryFromVal<Env, Val>,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

/// Save the config and initial state of a new campaign.
pub fn save_campaign(env: &Env, id: u64, config: &CampaignConfig, state: &CampaignState) {
    let config_key = DataKey::CampConfig(id);
    env.storage().persistent().set(&config_key, config);
    bump_persistent(env, &config_key);
    save_campaign_state(env, id, state);
}

/// Load the full `Campaign` by combining config and state.
pub fn load_campaign(env: &Env, id: u64) -> Option<Campaign> {
    let config = load_campaign_config(env, id)?;
    let state = load_campaign_state(env, id)?;
    Some(Campaign::from_parts(id, config, state))
}

pub fn load_campaign_config(env: &Env, id: u64) -> Option<CampaignConfig> {
    read_persistent(env, &DataKey::CampConfig(id))
}

pub fn load_campaign_state(env: &Env, id: u64) -> Option<CampaignState> {
    read_persistent(env, &DataKey::CampState(id))
}

pub fn save_campaign_state(env: &Env, id: u64, state: &CampaignState) {
    let key = DataKey::CampState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

// ── Reward tiers ─────────────────────────────────────────────────────

/// Reward tiers of a campaign; empty when none were added.
pub fn load_rewards(env: &Env, campaign_id: u64) -> Vec<RewardTier> {
    read_persistent(env, &DataKey::Rewards(campaign_id)).unwrap_or_else(|| Vec::new(env))
}

pub fn save_rewards(env: &Env, campaign_id: u64, rewards: &Vec<RewardTier>) {
    let key = DataKey::Rewards(campaign_id);
    env.storage().persistent().set(&key, rewards);
    bump_persistent(env, &key);
}

// ── Pledge ledger ────────────────────────────────────────────────────

pub fn load_pledge(env: &Env, campaign_id: u64, contributor: &Address) -> i128 {
    read_persistent(env, &DataKey::Pledge(campaign_id, contributor.clone())).unwrap_or(0)
}

/// Store a pledge amount. A zero amount removes the entry.
pub fn save_pledge(env: &Env, campaign_id: u64, contributor: &Address, amount: i128) {
    let key = DataKey::Pledge(campaign_id, contributor.clone());
    write_amount(env, &key, amount);
}

pub fn load_contributor_total(env: &Env, contributor: &Address) -> i128 {
    read_persistent(env, &DataKey::ContribTotal(contributor.clone())).unwrap_or(0)
}

/// Store a contributor total. A zero amount removes the entry.
pub fn save_contributor_total(env: &Env, contributor: &Address, amount: i128) {
    let key = DataKey::ContribTotal(contributor.clone());
    write_amount(env, &key, amount);
}

fn write_amount(env: &Env, key: &DataKey, amount: i128) {
    if amount == 0 {
        env.storage().persistent().remove(key);
    } else {
        env.storage().persistent().set(key, &amount);
        bump_persistent(env, key);
    }
}
