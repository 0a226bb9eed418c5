//! # Types
//!
//! Shared data structures used across all modules of the crowdfund contract.
//!
//! ## Config / State split
//!
//! A [`Campaign`] is stored as two ledger entries:
//!
//! - [`CampaignConfig`]: written once by `create_campaign`; never mutated.
//! - [`CampaignState`]: written on every pledge and on withdrawal.
//!
//! The public API returns the reconstructed [`Campaign`].
//!
//! ## Lifecycle
//!
//! [`CampaignStatus`] is derived from the ledger clock and the stored state,
//! never persisted:
//!
//! ```text
//! Upcoming ──► Active ──► GoalMet ──► Settled
//!                  └────► GoalMissed
//! ```
//!
//! `GoalMet` reaches `Settled` through `withdraw`. `GoalMissed` is terminal
//! at campaign level; each contributor leaves it independently via `refund`.

use soroban_sdk::{contracttype, Address, String};

/// `reward_index` value meaning "pledge without a reward tier".
///
/// Any index past the end of the campaign's tier list is treated the same way.
pub const NO_REWARD: u32 = u32::MAX;

/// Derived lifecycle status of a campaign at a given ledger timestamp.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CampaignStatus {
    /// Window has not opened; the creator may still add reward tiers.
    Upcoming,
    /// Accepting pledges.
    Active,
    /// Window closed with `pledged_total >= goal`; awaiting withdrawal.
    GoalMet,
    /// Window closed below goal; contributors may claim refunds.
    GoalMissed,
    /// Creator has withdrawn the funds.
    Settled,
}

/// Immutable campaign configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignConfig {
    pub creator: Address,
    pub goal: i128,
    pub start_time: u64,
    pub end_time: u64,
    pub metadata: String,
}

/// Mutable campaign state, updated on pledges and withdrawal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CampaignState {
    pub pledged_total: i128,
    pub settled: bool,
}

/// Full representation of a campaign, as returned by `get_campaign`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Campaign {
    /// Sequential identifier, starting at 1.
    pub id: u64,
    /// Address that created the campaign and receives funds on success.
    pub creator: Address,
    /// Funding target in settlement-token units.
    pub goal: i128,
    /// Sum of every pledge accepted. Refunds do not decrease it.
    pub pledged_total: i128,
    /// First ledger timestamp at which pledges are accepted.
    pub start_time: u64,
    /// Last ledger timestamp at which pledges are accepted.
    pub end_time: u64,
    /// Set once the creator has withdrawn.
    pub settled: bool,
    /// Opaque reference to off-chain metadata (e.g. an IPFS CID).
    pub metadata: String,
}

impl Campaign {
    pub(crate) fn from_parts(id: u64, config: CampaignConfig, state: CampaignState) -> Self {
        Campaign {
            id,
            creator: config.creator,
            goal: config.goal,
            pledged_total: state.pledged_total,
            start_time: config.start_time,
            end_time: config.end_time,
            settled: state.settled,
            metadata: config.metadata,
        }
    }

    /// Lifecycle status at ledger time `now`.
    pub fn status(&self, now: u64) -> CampaignStatus {
        if self.settled {
            CampaignStatus::Settled
        } else if now < self.start_time {
            CampaignStatus::Upcoming
        } else if now <= self.end_time {
            CampaignStatus::Active
        } else if self.pledged_total >= self.goal {
            CampaignStatus::GoalMet
        } else {
            CampaignStatus::GoalMissed
        }
    }
}

/// A perk unlocked by a minimum contribution, with optional scarcity.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardTier {
    pub title: String,
    pub description: String,
    /// Smallest pledge that may reference this tier. May be zero.
    pub minimum_contribution: i128,
    /// Maximum number of claims; `0` means unlimited.
    pub quantity_available: u32,
    /// Claims so far. Only counted for limited tiers.
    pub claimed_count: u32,
}

impl RewardTier {
    /// `true` when the tier is limited and every unit has been claimed.
    pub fn is_sold_out(&self) -> bool {
        self.quantity_available > 0 && self.claimed_count >= self.quantity_available
    }
}
