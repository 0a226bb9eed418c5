//! Read models rebuilt from the indexed event stream.
//!
//! The contract only answers point lookups. Aggregates such as "every
//! campaign this address backed" are derived here, off-chain, by folding
//! the stored events in ledger order.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::events::{EventKind, EventRecord};

/// Net position of one contributor in one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub campaign_id: String,
    pub pledged: String,
    pub refunded: String,
    pub net: String,
    pub pledge_count: u32,
}

/// Totals for one campaign, as seen through its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub creator: Option<String>,
    pub goal: Option<String>,
    pub pledged: String,
    pub refunded: String,
    pub withdrawn: Option<String>,
    pub contributors: usize,
    pub rewards_added: u32,
    pub rewards_claimed: u32,
}

#[derive(Default)]
struct Tally {
    pledged: i128,
    refunded: i128,
    pledge_count: u32,
}

/// Group an address's pledge / refund events by campaign.
///
/// Campaigns are returned in ascending numeric ID order.
pub fn contributions(events: &[EventRecord]) -> Vec<Contribution> {
    let mut by_campaign: BTreeMap<u64, (String, Tally)> = BTreeMap::new();

    for ev in events {
        let Some(campaign_id) = ev.campaign_id.as_deref() else {
            continue;
        };
        let amount = ev.amount_value().unwrap_or(0);
        let key = campaign_id.parse().unwrap_or(u64::MAX);
        let (_, tally) = by_campaign
            .entry(key)
            .or_insert_with(|| (campaign_id.to_string(), Tally::default()));

        match ev.kind() {
            EventKind::Pledged => {
                tally.pledged += amount;
                tally.pledge_count += 1;
            }
            EventKind::Refunded => tally.refunded += amount,
            _ => {}
        }
    }

    by_campaign
        .into_values()
        .map(|(campaign_id, t)| Contribution {
            campaign_id,
            pledged: t.pledged.to_string(),
            refunded: t.refunded.to_string(),
            net: (t.pledged - t.refunded).to_string(),
            pledge_count: t.pledge_count,
        })
        .collect()
}

/// Fold every event of one campaign into a [`CampaignSummary`].
pub fn campaign_summary(campaign_id: &str, events: &[EventRecord]) -> CampaignSummary {
    let mut summary = CampaignSummary {
        campaign_id: campaign_id.to_string(),
        creator: None,
        goal: None,
        pledged: "0".to_string(),
        refunded: "0".to_string(),
        withdrawn: None,
        contributors: 0,
        rewards_added: 0,
        rewards_claimed: 0,
    };
    let mut pledged = 0i128;
    let mut refunded = 0i128;
    let mut contributors = BTreeSet::new();

    for ev in events {
        match ev.kind() {
            EventKind::CampaignCreated => {
                summary.creator = ev.actor.clone();
                summary.goal = ev.amount.clone();
            }
            EventKind::RewardAdded => summary.rewards_added += 1,
            EventKind::RewardClaimed => summary.rewards_claimed += 1,
            EventKind::Pledged => {
                pledged += ev.amount_value().unwrap_or(0);
                if let Some(actor) = &ev.actor {
                    contributors.insert(actor.clone());
                }
            }
            EventKind::Refunded => refunded += ev.amount_value().unwrap_or(0),
            EventKind::Withdrawn => summary.withdrawn = ev.amount.clone(),
            EventKind::Unknown => {}
        }
    }

    summary.pledged = pledged.to_string();
    summary.refunded = refunded.to_string();
    summary.contributors = contributors.len();
    summary
}
