//! # Crowdfund Contract
//!
//! A creator raises a single settlement token toward a fixed goal inside a
//! time window, optionally offering limited reward tiers. After the window
//! closes the campaign settles one way only: the creator withdraws
//! everything (goal met) or each contributor takes their pledge back
//! (goal missed).
//!
//! | Phase      | Entry Point(s)                                        |
//! |------------|-------------------------------------------------------|
//! | Bootstrap  | `__constructor(admin)`, [`Crowdfund::init`]           |
//! | Setup      | [`Crowdfund::create_campaign`], [`Crowdfund::add_reward`] |
//! | Funding    | [`Crowdfund::pledge`]                                 |
//! | Settlement | [`Crowdfund::withdraw`], [`Crowdfund::refund`]        |
//! | Queries    | `get_campaign`, `campaign_status`, `campaign_count`, `get_rewards`, `get_pledge`, `get_contributor_total`, `get_token` |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`] and event publication to
//! [`events`]. This file holds the entry points and every business rule.
//!
//! Each invocation is atomic: a `panic_with_error!` anywhere, including a
//! failed token transfer after state was already written, discards all of
//! the invocation's writes and events. Withdraw and refund still commit
//! their ledger change before paying out.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, token, Address, Env, String, Vec,
};

pub mod events;
mod storage;
mod types;

#[cfg(test)]
mod test_pledge;

use events::{CampaignCreated, Pledged, Refunded, RewardAdded, RewardClaimed, Withdrawn};
use storage::{
    load_campaign, load_campaign_config, load_campaign_state, load_contributor_total,
    load_pledge, load_rewards, next_campaign_id, save_campaign, save_campaign_state,
    save_contributor_total, save_pledge, save_rewards,
};
pub use types::{Campaign, CampaignStatus, RewardTier, NO_REWARD};
use types::{CampaignConfig, CampaignState};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    CampaignNotFound     = 1,
    InvalidGoal          = 2,
    InvalidWindow        = 3,
    WindowNotFuture      = 4,
    NotCreator           = 5,
    WindowAlreadyOpen    = 6,
    CampaignInactive     = 7,
    ZeroAmount           = 8,
    BelowRewardMinimum   = 9,
    RewardSoldOut        = 10,
    CampaignNotEnded     = 11,
    GoalNotReached       = 12,
    GoalReached          = 13,
    AlreadySettled       = 14,
    NothingToRefund      = 15,
    AlreadyInitialized   = 16,
    NotInitialized       = 17,
    InvalidRewardMinimum = 18,
    ArithmeticOverflow   = 19,
}

#[contract]
pub struct Crowdfund;

#[contractimpl]
impl Crowdfund {
    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Record the deployment admin, the only address allowed to call `init`.
    ///
    /// Runs once, atomically with deployment, so no one can race it.
    pub fn __constructor(env: Env, admin: Address) {
        storage::set_admin(&env, &admin);
    }

    /// Fix the settlement token every pledge and payout moves.
    ///
    /// - `admin` (set at deployment) must sign the transaction.
    /// - A second call panics with `Error::AlreadyInitialized`.
    pub fn init(env: Env, token: Address) {
        let admin = storage::get_admin(&env)
            .unwrap_or_else(|| panic_with_error!(&env, Error::NotInitialized));
        admin.require_auth();

        if storage::has_token(&env) {
            panic_with_error!(&env, Error::AlreadyInitialized);
        }
        storage::set_token(&env, &token);
    }

    pub fn get_token(env: Env) -> Address {
        settlement_token(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Campaign setup
    // ─────────────────────────────────────────────────────────

    /// Create a campaign and return its ID.
    ///
    /// The window must lie in the future: `now <= start_time < end_time`.
    pub fn create_campaign(
        env: Env,
        creator: Address,
        goal: i128,
        start_time: u64,
        end_time: u64,
        metadata: String,
    ) -> u64 {
        creator.require_auth();

        if goal <= 0 {
            panic_with_error!(&env, Error::InvalidGoal);
        }
        if start_time >= end_time {
            panic_with_error!(&env, Error::InvalidWindow);
        }
        let now = env.ledger().timestamp();
        if start_time < now || end_time <= now {
            panic_with_error!(&env, Error::WindowNotFuture);
        }

        let id = next_campaign_id(&env);
        let config = CampaignConfig {
            creator: creator.clone(),
            goal,
            start_time,
            end_time,
            metadata,
        };
        let state = CampaignState {
            pledged_total: 0,
            settled: false,
        };
        save_campaign(&env, id, &config, &state);

        events::emit_campaign_created(
            &env,
            CampaignCreated {
                campaign_id: id,
                creator,
                goal,
                start_time,
                end_time,
            },
        );
        id
    }

    /// Append a reward tier and return its index.
    ///
    /// Only the creator may add tiers, and only before the window opens.
    /// `quantity_available == 0` makes the tier unlimited.
    pub fn add_reward(
        env: Env,
        campaign_id: u64,
        caller: Address,
        title: String,
        description: String,
        minimum_contribution: i128,
        quantity_available: u32,
    ) -> u32 {
        caller.require_auth();

        let config = require_config(&env, campaign_id);
        if caller != config.creator {
            panic_with_error!(&env, Error::NotCreator);
        }
        if env.ledger().timestamp() >= config.start_time {
            panic_with_error!(&env, Error::WindowAlreadyOpen);
        }
        if minimum_contribution < 0 {
            panic_with_error!(&env, Error::InvalidRewardMinimum);
        }

        let mut rewards = load_rewards(&env, campaign_id);
        let reward_index = rewards.len();
        rewards.push_back(RewardTier {
            title,
            description,
            minimum_contribution,
            quantity_available,
            claimed_count: 0,
        });
        save_rewards(&env, campaign_id, &rewards);

        events::emit_reward_added(
            &env,
            RewardAdded {
                campaign_id,
                reward_index,
                minimum_contribution,
                quantity_available,
            },
        );
        reward_index
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Pledge `amount` of the settlement token to a campaign.
    ///
    /// `reward_index` selects a reward tier; [`NO_REWARD`] or any index past
    /// the last tier pledges without one. Every check runs before the first
    /// write, so a rejected pledge changes nothing.
    pub fn pledge(
        env: Env,
        campaign_id: u64,
        contributor: Address,
        amount: i128,
        reward_index: u32,
    ) {
        contributor.require_auth();

        let config = require_config(&env, campaign_id);
        let mut state = require_state(&env, campaign_id);

        let now = env.ledger().timestamp();
        if now < config.start_time || now > config.end_time {
            panic_with_error!(&env, Error::CampaignInactive);
        }
        if amount <= 0 {
            panic_with_error!(&env, Error::ZeroAmount);
        }
        let token = settlement_token(&env);

        let mut rewards = load_rewards(&env, campaign_id);
        let mut claim = None;
        if let Some(mut tier) = rewards.get(reward_index) {
            if amount < tier.minimum_contribution {
                panic_with_error!(&env, Error::BelowRewardMinimum);
            }
            if tier.quantity_available > 0 {
                if tier.is_sold_out() {
                    panic_with_error!(&env, Error::RewardSoldOut);
                }
                tier.claimed_count += 1;
                claim = Some(tier.claimed_count);
                rewards.set(reward_index, tier);
            }
        }

        let pledged = checked(
            &env,
            load_pledge(&env, campaign_id, &contributor).checked_add(amount),
        );
        let total = checked(
            &env,
            load_contributor_total(&env, &contributor).checked_add(amount),
        );
        state.pledged_total = checked(&env, state.pledged_total.checked_add(amount));

        if claim.is_some() {
            save_rewards(&env, campaign_id, &rewards);
        }
        save_pledge(&env, campaign_id, &contributor, pledged);
        save_contributor_total(&env, &contributor, total);
        save_campaign_state(&env, campaign_id, &state);

        token::Client::new(&env, &token).transfer(
            &contributor,
            &env.current_contract_address(),
            &amount,
        );

        if let Some(claimed_count) = claim {
            events::emit_reward_claimed(
                &env,
                RewardClaimed {
                    campaign_id,
                    reward_index,
                    contributor: contributor.clone(),
                    claimed_count,
                },
            );
        }
        events::emit_pledged(
            &env,
            Pledged {
                campaign_id,
                contributor,
                amount,
                reward_index,
            },
        );
    }

    // ─────────────────────────────────────────────────────────
    // Settlement
    // ─────────────────────────────────────────────────────────

    /// Release the full `pledged_total` to the creator of a successful campaign.
    ///
    /// `settled` is written before the payout. If the payout fails the whole
    /// invocation aborts and `settled` reverts with it.
    pub fn withdraw(env: Env, campaign_id: u64, caller: Address) {
        caller.require_auth();

        let config = require_config(&env, campaign_id);
        let mut state = require_state(&env, campaign_id);

        if caller != config.creator {
            panic_with_error!(&env, Error::NotCreator);
        }
        if env.ledger().timestamp() <= config.end_time {
            panic_with_error!(&env, Error::CampaignNotEnded);
        }
        if state.pledged_total < config.goal {
            panic_with_error!(&env, Error::GoalNotReached);
        }
        if state.settled {
            panic_with_error!(&env, Error::AlreadySettled);
        }
        let token = settlement_token(&env);

        let amount = state.pledged_total;
        state.settled = true;
        save_campaign_state(&env, campaign_id, &state);

        token::Client::new(&env, &token).transfer(
            &env.current_contract_address(),
            &config.creator,
            &amount,
        );

        events::emit_withdrawn(
            &env,
            Withdrawn {
                campaign_id,
                creator: config.creator,
                amount,
            },
        );
    }

    /// Return the caller's pledge from a campaign that missed its goal.
    ///
    /// The pledge record is zeroed before the payout.
    pub fn refund(env: Env, campaign_id: u64, caller: Address) {
        caller.require_auth();

        let config = require_config(&env, campaign_id);
        let state = require_state(&env, campaign_id);

        if env.ledger().timestamp() <= config.end_time {
            panic_with_error!(&env, Error::CampaignNotEnded);
        }
        if state.pledged_total >= config.goal {
            panic_with_error!(&env, Error::GoalReached);
        }
        let amount = load_pledge(&env, campaign_id, &caller);
        if amount == 0 {
            panic_with_error!(&env, Error::NothingToRefund);
        }
        let token = settlement_token(&env);

        let total = checked(
            &env,
            load_contributor_total(&env, &caller).checked_sub(amount),
        );
        save_pledge(&env, campaign_id, &caller, 0);
        save_contributor_total(&env, &caller, total);

        token::Client::new(&env, &token).transfer(
            &env.current_contract_address(),
            &caller,
            &amount,
        );

        events::emit_refunded(
            &env,
            Refunded {
                campaign_id,
                contributor: caller,
                amount,
            },
        );
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_campaign(env: Env, campaign_id: u64) -> Campaign {
        load_campaign(&env, campaign_id)
            .unwrap_or_else(|| panic_with_error!(&env, Error::CampaignNotFound))
    }

    /// Lifecycle status at the current ledger timestamp.
    pub fn campaign_status(env: Env, campaign_id: u64) -> CampaignStatus {
        let campaign = Self::get_campaign(env.clone(), campaign_id);
        campaign.status(env.ledger().timestamp())
    }

    /// Number of campaigns created so far (also the highest ID).
    pub fn campaign_count(env: Env) -> u64 {
        storage::campaign_count(&env)
    }

    /// Reward tiers in insertion order. Empty if the campaign has none.
    pub fn get_rewards(env: Env, campaign_id: u64) -> Vec<RewardTier> {
        load_rewards(&env, campaign_id)
    }

    pub fn get_pledge(env: Env, campaign_id: u64, contributor: Address) -> i128 {
        load_pledge(&env, campaign_id, &contributor)
    }

    /// Un-refunded pledges of `contributor` summed across all campaigns.
    pub fn get_contributor_total(env: Env, contributor: Address) -> i128 {
        load_contributor_total(&env, &contributor)
    }
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

fn require_config(env: &Env, campaign_id: u64) -> CampaignConfig {
    load_campaign_config(env, campaign_id)
        .unwrap_or_else(|| panic_with_error!(env, Error::CampaignNotFound))
}

fn require_state(env: &Env, campaign_id: u64) -> CampaignState {
    load_campaign_state(env, campaign_id)
        .unwrap_or_else(|| panic_with_error!(env, Error::CampaignNotFound))
}

fn settlement_token(env: &Env) -> Address {
    storage::get_token(env).unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
}

fn checked(env: &Env, value: Option<i128>) -> i128 {
    value.unwrap_or_else(|| panic_with_error!(env, Error::ArithmeticOverflow))
}
