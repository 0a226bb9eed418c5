extern crate std;

use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token, Address, Env, String,
};

use crate::invariants::{
    assert_conservation, assert_contributor_total, assert_immutable_fields,
    assert_pledged_total_monotonic, assert_rewards_within_quantity, assert_sequential_ids,
    snapshot,
};
use crate::{CampaignStatus, Crowdfund, CrowdfundClient, Error, NO_REWARD};

const START_OFFSET: u64 = 10;
const END_OFFSET: u64 = 1_000;

struct Setup {
    env: Env,
    client: CrowdfundClient<'static>,
    token: token::Client<'static>,
    minter: token::StellarAssetClient<'static>,
}

fn setup() -> Setup {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_000);

    let admin = Address::generate(&env);
    let contract_id = env.register(Crowdfund, (admin,));
    let client = CrowdfundClient::new(&env, &contract_id);

    let token_admin = Address::generate(&env);
    let sac = env.register_stellar_asset_contract_v2(token_admin);
    let token = token::Client::new(&env, &sac.address());
    let minter = token::StellarAssetClient::new(&env, &sac.address());
    client.init(&token.address);

    Setup {
        env,
        client,
        token,
        minter,
    }
}

fn metadata(env: &Env) -> String {
    String::from_str(env, "ipfs://bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi")
}

fn create_campaign(s: &Setup, creator: &Address, goal: i128) -> u64 {
    let now = s.env.ledger().timestamp();
    s.client.create_campaign(
        creator,
        &goal,
        &(now + START_OFFSET),
        &(now + END_OFFSET),
        &metadata(&s.env),
    )
}

fn add_reward(s: &Setup, id: u64, creator: &Address, minimum: i128, quantity: u32) -> u32 {
    s.client.add_reward(
        &id,
        creator,
        &String::from_str(&s.env, "Early bird"),
        &String::from_str(&s.env, "Signed print"),
        &minimum,
        &quantity,
    )
}

fn open_window(s: &Setup, id: u64) {
    let start = s.client.get_campaign(&id).start_time;
    s.env.ledger().set_timestamp(start);
}

fn funded_contributor(s: &Setup, amount: i128) -> Address {
    let contributor = Address::generate(&s.env);
    s.minter.mint(&contributor, &amount);
    contributor
}

// ─────────────────────────────────────────────────────────
// Bootstrap
// ─────────────────────────────────────────────────────────

#[test]
fn test_init_twice_fails() {
    let s = setup();
    let other = Address::generate(&s.env);
    assert_eq!(s.client.try_init(&other), Err(Ok(Error::AlreadyInitialized.into())));
    assert_eq!(s.client.get_token(), s.token.address);
}

#[test]
#[should_panic]
fn test_init_requires_admin_auth() {
    let env = Env::default();
    let admin = Address::generate(&env);
    let contract_id = env.register(Crowdfund, (admin,));
    let client = CrowdfundClient::new(&env, &contract_id);
    let token = Address::generate(&env);

    // No auth is mocked, so the admin signature is missing.
    client.init(&token);
}

#[test]
fn test_init_is_authorized_by_admin() {
    let env = Env::default();
    env.mock_all_auths();
    let admin = Address::generate(&env);
    let contract_id = env.register(Crowdfund, (admin.clone(),));
    let client = CrowdfundClient::new(&env, &contract_id);
    let token = Address::generate(&env);

    client.init(&token);
    let auths = env.auths();
    assert_eq!(auths.len(), 1);
    assert_eq!(auths[0].0, admin);
    assert_eq!(client.get_token(), token);
}

#[test]
fn test_pledge_before_init_fails() {
    let env = Env::default();
    env.mock_all_auths();
    let admin = Address::generate(&env);
    let contract_id = env.register(Crowdfund, (admin,));
    let client = CrowdfundClient::new(&env, &contract_id);
    let creator = Address::generate(&env);
    let contributor = Address::generate(&env);

    let id = client.create_campaign(&creator, &100, &0, &100, &String::from_str(&env, "m"));
    assert_eq!(
        client.try_pledge(&id, &contributor, &10, &NO_REWARD),
        Err(Ok(Error::NotInitialized.into()))
    );
    assert_eq!(client.try_get_token(), Err(Ok(Error::NotInitialized.into())));
}

// ─────────────────────────────────────────────────────────
// create_campaign
// ─────────────────────────────────────────────────────────

#[test]
fn test_create_campaign_stores_record() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 500);

    let campaign = s.client.get_campaign(&id);
    assert_eq!(campaign.id, 1);
    assert_eq!(campaign.creator, creator);
    assert_eq!(campaign.goal, 500);
    assert_eq!(campaign.pledged_total, 0);
    assert_eq!(campaign.start_time, 1_000 + START_OFFSET);
    assert_eq!(campaign.end_time, 1_000 + END_OFFSET);
    assert!(!campaign.settled);
    assert_eq!(campaign.metadata, metadata(&s.env));
    assert_eq!(s.client.campaign_status(&id), CampaignStatus::Upcoming);
}

#[test]
fn test_campaign_ids_are_sequential_from_one() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let ids: std::vec::Vec<u64> = (0..4).map(|_| create_campaign(&s, &creator, 100)).collect();

    assert_sequential_ids(&ids);
    assert_eq!(s.client.campaign_count(), 4);
}

#[test]
fn test_create_campaign_rejects_bad_arguments() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let now = s.env.ledger().timestamp();
    let meta = metadata(&s.env);

    assert_eq!(
        s.client.try_create_campaign(&creator, &0, &(now + 1), &(now + 2), &meta),
        Err(Ok(Error::InvalidGoal.into()))
    );
    assert_eq!(
        s.client.try_create_campaign(&creator, &-5, &(now + 1), &(now + 2), &meta),
        Err(Ok(Error::InvalidGoal.into()))
    );
    assert_eq!(
        s.client.try_create_campaign(&creator, &100, &(now + 5), &(now + 5), &meta),
        Err(Ok(Error::InvalidWindow.into()))
    );
    assert_eq!(
        s.client.try_create_campaign(&creator, &100, &(now + 9), &(now + 5), &meta),
        Err(Ok(Error::InvalidWindow.into()))
    );
    assert_eq!(
        s.client.try_create_campaign(&creator, &100, &(now - 1), &(now + 5), &meta),
        Err(Ok(Error::WindowNotFuture.into()))
    );

    // Nothing was allocated by the failed calls.
    assert_eq!(s.client.campaign_count(), 0);
    assert_eq!(s.client.try_get_campaign(&1), Err(Ok(Error::CampaignNotFound.into())));
}

#[test]
fn test_create_campaign_starting_now_is_allowed() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let now = s.env.ledger().timestamp();
    let id = s
        .client
        .create_campaign(&creator, &100, &now, &(now + 1), &metadata(&s.env));
    assert_eq!(s.client.campaign_status(&id), CampaignStatus::Active);
}

// ─────────────────────────────────────────────────────────
// add_reward
// ─────────────────────────────────────────────────────────

#[test]
fn test_add_reward_appends_in_order() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 100);

    assert!(s.client.get_rewards(&id).is_empty());
    assert_eq!(add_reward(&s, id, &creator, 50, 1), 0);
    assert_eq!(add_reward(&s, id, &creator, 0, 0), 1);
    assert_eq!(add_reward(&s, id, &creator, 200, 10), 2);

    let rewards = s.client.get_rewards(&id);
    assert_eq!(rewards.len(), 3);
    let first = rewards.get(0).unwrap();
    assert_eq!(first.minimum_contribution, 50);
    assert_eq!(first.quantity_available, 1);
    assert_eq!(first.claimed_count, 0);
    assert_eq!(rewards.get(2).unwrap().minimum_contribution, 200);
}

#[test]
fn test_add_reward_rejections() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let stranger = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 100);
    let title = String::from_str(&s.env, "t");
    let desc = String::from_str(&s.env, "d");

    assert_eq!(
        s.client.try_add_reward(&99, &creator, &title, &desc, &1, &1),
        Err(Ok(Error::CampaignNotFound.into()))
    );
    assert_eq!(
        s.client.try_add_reward(&id, &stranger, &title, &desc, &1, &1),
        Err(Ok(Error::NotCreator.into()))
    );
    assert_eq!(
        s.client.try_add_reward(&id, &creator, &title, &desc, &-1, &1),
        Err(Ok(Error::InvalidRewardMinimum.into()))
    );

    open_window(&s, id);
    assert_eq!(
        s.client.try_add_reward(&id, &creator, &title, &desc, &1, &1),
        Err(Ok(Error::WindowAlreadyOpen.into()))
    );
    assert!(s.client.get_rewards(&id).is_empty());
}

#[test]
fn test_get_rewards_for_unknown_campaign_is_empty() {
    let s = setup();
    assert!(s.client.get_rewards(&42).is_empty());
}

// ─────────────────────────────────────────────────────────
// pledge
// ─────────────────────────────────────────────────────────

#[test]
fn test_pledges_accumulate_and_conserve() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 1_000);
    open_window(&s, id);

    let alice = funded_contributor(&s, 500);
    let bob = funded_contributor(&s, 500);

    let before = s.client.get_campaign(&id);
    s.client.pledge(&id, &alice, &100, &NO_REWARD);
    s.client.pledge(&id, &bob, &250, &NO_REWARD);
    s.client.pledge(&id, &alice, &40, &NO_REWARD);
    let after = s.client.get_campaign(&id);

    assert_eq!(s.client.get_pledge(&id, &alice), 140);
    assert_eq!(s.client.get_pledge(&id, &bob), 250);
    assert_eq!(after.pledged_total, 390);
    assert_conservation(&s.client, id, &[&alice, &bob]);
    assert_pledged_total_monotonic(&before, &after);
    assert_immutable_fields(&before, &after);

    assert_eq!(s.token.balance(&s.client.address), 390);
    assert_eq!(s.token.balance(&alice), 360);
    assert_eq!(s.token.balance(&bob), 250);
}

#[test]
fn test_contributor_total_spans_campaigns() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let first = create_campaign(&s, &creator, 1_000);
    let second = create_campaign(&s, &creator, 1_000);
    open_window(&s, first);

    let alice = funded_contributor(&s, 1_000);
    s.client.pledge(&first, &alice, &120, &NO_REWARD);
    s.client.pledge(&second, &alice, &80, &NO_REWARD);

    assert_eq!(s.client.get_contributor_total(&alice), 200);
    assert_contributor_total(&s.client, &alice, &[first, second]);
}

#[test]
fn test_pledge_outside_window_fails() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let alice = funded_contributor(&s, 100);
    let id = create_campaign(&s, &creator, 100);
    let campaign = s.client.get_campaign(&id);

    assert_eq!(
        s.client.try_pledge(&id, &alice, &10, &NO_REWARD),
        Err(Ok(Error::CampaignInactive.into()))
    );

    // Both window edges are inclusive.
    s.env.ledger().set_timestamp(campaign.end_time);
    s.client.pledge(&id, &alice, &10, &NO_REWARD);

    s.env.ledger().set_timestamp(campaign.end_time + 1);
    assert_eq!(
        s.client.try_pledge(&id, &alice, &10, &NO_REWARD),
        Err(Ok(Error::CampaignInactive.into()))
    );
    assert_eq!(s.client.get_pledge(&id, &alice), 10);
}

#[test]
fn test_pledge_rejects_unknown_campaign_and_non_positive_amount() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let alice = funded_contributor(&s, 100);
    let id = create_campaign(&s, &creator, 100);
    open_window(&s, id);

    assert_eq!(
        s.client.try_pledge(&7, &alice, &10, &NO_REWARD),
        Err(Ok(Error::CampaignNotFound.into()))
    );
    assert_eq!(
        s.client.try_pledge(&id, &alice, &0, &NO_REWARD),
        Err(Ok(Error::ZeroAmount.into()))
    );
    assert_eq!(
        s.client.try_pledge(&id, &alice, &-10, &NO_REWARD),
        Err(Ok(Error::ZeroAmount.into()))
    );
}

#[test]
fn test_pledge_below_reward_minimum_changes_nothing() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 100);
    add_reward(&s, id, &creator, 50, 5);
    open_window(&s, id);

    let alice = funded_contributor(&s, 100);
    s.client.pledge(&id, &alice, &10, &NO_REWARD);

    let before = snapshot(&s.client, id, &[&alice]);
    assert_eq!(
        s.client.try_pledge(&id, &alice, &49, &0),
        Err(Ok(Error::BelowRewardMinimum.into()))
    );
    assert_eq!(snapshot(&s.client, id, &[&alice]), before);
    assert_eq!(s.token.balance(&alice), 90);
}

#[test]
fn test_pledged_total_overflow_changes_nothing() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 100);
    open_window(&s, id);

    let whale = funded_contributor(&s, i128::MAX);
    let alice = funded_contributor(&s, 1);
    s.client.pledge(&id, &whale, &i128::MAX, &NO_REWARD);

    let before = snapshot(&s.client, id, &[&whale, &alice]);
    assert_eq!(
        s.client.try_pledge(&id, &alice, &1, &NO_REWARD),
        Err(Ok(Error::ArithmeticOverflow.into()))
    );
    assert_eq!(snapshot(&s.client, id, &[&whale, &alice]), before);
    assert_eq!(s.token.balance(&alice), 1);
    assert_eq!(s.token.balance(&s.client.address), i128::MAX);
}

#[test]
fn test_contributor_total_overflow_changes_nothing() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let first = create_campaign(&s, &creator, 100);
    let second = create_campaign(&s, &creator, 100);
    open_window(&s, first);

    let whale = funded_contributor(&s, i128::MAX);
    s.client.pledge(&first, &whale, &i128::MAX, &NO_REWARD);

    let before = snapshot(&s.client, second, &[&whale]);
    assert_eq!(
        s.client.try_pledge(&second, &whale, &1, &NO_REWARD),
        Err(Ok(Error::ArithmeticOverflow.into()))
    );
    assert_eq!(snapshot(&s.client, second, &[&whale]), before);
    assert_eq!(s.client.get_contributor_total(&whale), i128::MAX);
}

#[test]
fn test_reward_scarcity() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 1_000);
    add_reward(&s, id, &creator, 10, 2);
    open_window(&s, id);

    let backers: std::vec::Vec<Address> = (0..3).map(|_| funded_contributor(&s, 100)).collect();

    s.client.pledge(&id, &backers[0], &10, &0);
    s.client.pledge(&id, &backers[1], &10, &0);

    let before = snapshot(&s.client, id, &[&backers[2]]);
    assert_eq!(
        s.client.try_pledge(&id, &backers[2], &10, &0),
        Err(Ok(Error::RewardSoldOut.into()))
    );
    assert_eq!(snapshot(&s.client, id, &[&backers[2]]), before);

    let rewards = s.client.get_rewards(&id);
    assert_eq!(rewards.get(0).unwrap().claimed_count, 2);
    assert_rewards_within_quantity(&rewards);

    // The same backer can still pledge without the tier.
    s.client.pledge(&id, &backers[2], &10, &NO_REWARD);
    assert_eq!(s.client.get_campaign(&id).pledged_total, 30);
}

#[test]
fn test_unlimited_reward_is_not_counted() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 1_000);
    add_reward(&s, id, &creator, 0, 0);
    open_window(&s, id);

    let alice = funded_contributor(&s, 100);
    for _ in 0..5 {
        s.client.pledge(&id, &alice, &1, &0);
    }
    let tier = s.client.get_rewards(&id).get(0).unwrap();
    assert_eq!(tier.claimed_count, 0);
    assert_eq!(s.client.get_pledge(&id, &alice), 5);
}

#[test]
fn test_out_of_range_reward_index_means_no_tier() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 1_000);
    add_reward(&s, id, &creator, 500, 1);
    open_window(&s, id);

    let alice = funded_contributor(&s, 100);
    // Below the only tier's minimum, but index 1 does not exist.
    s.client.pledge(&id, &alice, &20, &1);
    s.client.pledge(&id, &alice, &20, &NO_REWARD);

    assert_eq!(s.client.get_pledge(&id, &alice), 40);
    assert_eq!(s.client.get_rewards(&id).get(0).unwrap().claimed_count, 0);
}

#[test]
fn test_pledge_without_funds_rolls_back_reward_claim() {
    let s = setup();
    let creator = Address::generate(&s.env);
    let id = create_campaign(&s, &creator, 1_000);
    add_reward(&s, id, &creator, 50, 1);
    open_window(&s, id);

    let broke = funded_contributor(&s, 10);
    let before = snapshot(&s.client, id, &[&broke]);

    // Token transfer fails after the ledger writes; the host discards them.
    assert!(s.client.try_pledge(&id, &broke, &60, &0).is_err());
    assert_eq!(snapshot(&s.client, id, &[&broke]), before);
    assert_eq!(s.client.get_rewards(&id).get(0).unwrap().claimed_count, 0);

    // The unit is still available to someone who can pay.
    let payer = funded_contributor(&s, 60);
    s.client.pledge(&id, &payer, &60, &0);
    assert_eq!(s.client.get_rewards(&id).get(0).unwrap().claimed_count, 1);
}
