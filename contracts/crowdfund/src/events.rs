//! # Events
//!
//! One structured event is published for every successful state change, so
//! off-chain consumers can rebuild history without scanning contract storage.
//!
//! | Topic                                  | Data              |
//! |----------------------------------------|-------------------|
//! | (`created`, campaign_id)               | [`CampaignCreated`] |
//! | (`reward`, campaign_id, reward_index)  | [`RewardAdded`]     |
//! | (`claimed`, campaign_id, reward_index) | [`RewardClaimed`]   |
//! | (`pledged`, campaign_id)               | [`Pledged`]         |
//! | (`withdrawn`, campaign_id)             | [`Withdrawn`]       |
//! | (`refunded`, campaign_id)              | [`Refunded`]        |

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignCreated {
    pub campaign_id: u64,
    pub creator: Address,
    pub goal: i128,
    pub start_time: u64,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAdded {
    pub campaign_id: u64,
    pub reward_index: u32,
    pub minimum_contribution: i128,
    pub quantity_available: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardClaimed {
    pub campaign_id: u64,
    pub reward_index: u32,
    pub contributor: Address,
    pub claimed_count: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pledged {
    pub campaign_id: u64,
    pub contributor: Address,
    pub amount: i128,
    /// [`crate::NO_REWARD`] when the pledge did not reference a tier.
    pub reward_index: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawn {
    pub campaign_id: u64,
    pub creator: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refunded {
    pub campaign_id: u64,
    pub contributor: Address,
    pub amount: i128,
}

pub fn emit_campaign_created(env: &Env, event: CampaignCreated) {
    env.events()
        .publish((symbol_short!("created"), event.campaign_id), event);
}

pub fn emit_reward_added(env: &Env, event: RewardAdded) {
    env.events().publish(
        (symbol_short!("reward"), event.campaign_id, event.reward_index),
        event,
    );
}

pub fn emit_reward_claimed(env: &Env, event: RewardClaimed) {
    env.events().publish(
        (symbol_short!("claimed"), event.campaign_id, event.reward_index),
        event,
    );
}

pub fn emit_pledged(env: &Env, event: Pledged) {
    env.events()
        .publish((symbol_short!("pledged"), event.campaign_id), event);
}

pub fn emit_withdrawn(env: &Env, event: Withdrawn) {
    env.events()
        .publish((symbol_short!("withdrawn"), event.campaign_id), event);
}

pub fn emit_refunded(env: &Env, event: Refunded) {
    env.events()
        .publish((symbol_short!("refunded"), event.campaign_id), event);
}
