//! Auction core
//!
//! The admission rules every bid goes through, and the results that are
//! derived from the admitted bids. Everything in here is pure: callers are
//! responsible for loading the item and its bids consistently (see
//! [`crate::service::bidding`]).
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::clock::AuctionClock;

pub type ItemId = u64;
pub type BidId = u64;
/// Groups bids into pots for the per-round results. Not related to [`ItemId`].
pub type RoundId = u64;
/// Money, in minor currency units
pub type Amount = u64;

/// Largest id or amount that can be stored (a signed 64-bit column)
pub const MAX_STORED: u64 = i64::MAX as u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub provided_by: String,
    pub description: String,
    pub value: Amount,
    pub min_bid: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub provided_by: String,
    pub description: String,
    pub value: Amount,
    pub min_bid: Amount,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bid {
    pub id: BidId,
    pub item_id: ItemId,
    pub round_id: RoundId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

/// A bid as submitted by a visitor
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BidRequest {
    pub item_id: ItemId,
    pub round_id: RoundId,
    pub amount: Amount,
}

/// A bid that passed all the admission checks and can be appended to the ledger
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdmittedBid {
    pub item_id: ItemId,
    pub round_id: RoundId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl AdmittedBid {
    pub fn into_bid(self, id: BidId) -> Bid {
        Bid {
            id,
            item_id: self.item_id,
            round_id: self.round_id,
            amount: self.amount,
            created_at: self.created_at,
        }
    }
}

/// Why a bid was not admitted
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("item not found")]
    ItemNotFound,
    #[error("auction already closed")]
    AuctionClosed,
    #[error("bid must be above the minimum bid of {min_bid}")]
    BelowMinimum { min_bid: Amount },
    #[error("bid must be above the current high bid of {high_bid}")]
    BelowHighBid { high_bid: Amount },
    #[error("a bid of {amount} was already placed on this item")]
    DuplicateAmount { amount: Amount },
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::ItemNotFound => "item_not_found",
            Rejection::AuctionClosed => "auction_closed",
            Rejection::BelowMinimum { .. } => "below_minimum",
            Rejection::BelowHighBid { .. } => "below_high_bid",
            Rejection::DuplicateAmount { .. } => "duplicate_amount",
        }
    }
}

/// Decide whether `request` can be admitted
///
/// `item` is the catalog entry for `request.item_id` (if any) and `bids` are all
/// the bids already admitted for it, in any order. The first failing check wins.
///
/// An amount is admitted only if it is strictly above both the floor and the
/// current high bid. When it is not, the reason reported is the most specific
/// one: an exact repeat of an admitted amount, then the standing high bid
/// (which is always above the floor), then the floor itself.
pub fn admit(
    item: Option<&Item>,
    bids: &[Bid],
    clock: &AuctionClock,
    request: BidRequest,
    now: DateTime<Utc>,
) -> Result<AdmittedBid, Rejection> {
    use Rejection::*;

    let item = item.ok_or(ItemNotFound)?;

    if !clock.is_open(now) {
        return Err(AuctionClosed);
    }

    if bids.iter().any(|bid| bid.amount == request.amount) {
        return Err(DuplicateAmount {
            amount: request.amount,
        });
    }

    match high_bid(bids) {
        Some(high) if request.amount <= high.amount => {
            return Err(BelowHighBid {
                high_bid: high.amount,
            })
        }
        _ if request.amount <= item.min_bid => {
            return Err(BelowMinimum {
                min_bid: item.min_bid,
            })
        }
        _ => {}
    }

    Ok(AdmittedBid {
        item_id: item.id,
        round_id: request.round_id,
        amount: request.amount,
        created_at: now,
    })
}

/// The bid with the greatest amount
///
/// Equal amounts can't be admitted, but if they ever show up the earliest bid
/// (then the lowest id) wins.
pub fn high_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().max_by(|a, b| {
        a.amount
            .cmp(&b.amount)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    pub item: Item,
    pub high_bid: Option<Bid>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoundWinnings {
    pub item_names: Vec<String>,
    /// Wider than [`Amount`] so summing any number of high bids can't overflow
    pub total: u128,
}

/// Bucket every item that has a high bid under that bid's round
///
/// Item names keep the order of `results`. Items without bids are skipped.
pub fn winners_by_round<'a>(
    results: impl IntoIterator<Item = &'a ItemResult>,
) -> BTreeMap<RoundId, RoundWinnings> {
    let mut rounds = BTreeMap::<RoundId, RoundWinnings>::new();

    for result in results {
        if let Some(high) = result.high_bid {
            let winnings = rounds.entry(high.round_id).or_default();
            winnings.item_names.push(result.item.name.clone());
            winnings.total += u128::from(high.amount);
        }
    }

    rounds
}

/// Format minor units for display, dropping the cents of whole amounts
pub fn format_amount(amount: Amount) -> String {
    let (whole, cents) = (amount / 100, amount % 100);
    if cents == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{cents:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 2, 9, 20, 0, 0).unwrap()
    }

    fn clock() -> AuctionClock {
        AuctionClock::new(t0() + Duration::hours(2))
    }

    fn item(min_bid: Amount) -> Item {
        Item {
            id: 1,
            name: "Quilt".to_owned(),
            provided_by: "Sewing circle".to_owned(),
            description: "Hand made".to_owned(),
            value: 20000,
            min_bid,
        }
    }

    fn bid(id: BidId, amount: Amount) -> Bid {
        Bid {
            id,
            item_id: 1,
            round_id: 7,
            amount,
            created_at: t0() + Duration::minutes(id as i64),
        }
    }

    fn request(amount: Amount) -> BidRequest {
        BidRequest {
            item_id: 1,
            round_id: 7,
            amount,
        }
    }

    #[test]
    fn unknown_item_wins_over_everything_else() {
        let late = t0() + Duration::days(1);
        assert_eq!(
            admit(None, &[], &clock(), request(0), late),
            Err(Rejection::ItemNotFound)
        );
    }

    #[test]
    fn closed_wins_over_amount_checks() {
        let item = item(50);
        let closes_at = clock().closes_at();
        assert_eq!(
            admit(Some(&item), &[], &clock(), request(10), closes_at),
            Err(Rejection::AuctionClosed)
        );
        assert_eq!(
            admit(Some(&item), &[], &clock(), request(1000), closes_at),
            Err(Rejection::AuctionClosed)
        );
    }

    #[test]
    fn floor_is_exclusive() {
        let item = item(50);
        assert_eq!(
            admit(Some(&item), &[], &clock(), request(50), t0()),
            Err(Rejection::BelowMinimum { min_bid: 50 })
        );
        let admitted = admit(Some(&item), &[], &clock(), request(51), t0()).unwrap();
        assert_eq!(admitted.amount, 51);
        assert_eq!(admitted.created_at, t0());
    }

    #[test]
    fn high_bid_is_exclusive() {
        let item = item(50);
        let bids = [bid(1, 51), bid(2, 60)];
        assert_eq!(
            admit(Some(&item), &bids, &clock(), request(55), t0()),
            Err(Rejection::BelowHighBid { high_bid: 60 })
        );
        assert_eq!(
            admit(Some(&item), &bids, &clock(), request(40), t0()),
            Err(Rejection::BelowHighBid { high_bid: 60 })
        );
        // matching the high bid exactly is a repeat of it
        assert_eq!(
            admit(Some(&item), &bids, &clock(), request(60), t0()),
            Err(Rejection::DuplicateAmount { amount: 60 })
        );
        assert!(admit(Some(&item), &bids, &clock(), request(61), t0()).is_ok());
    }

    #[test]
    fn repeated_amount_is_reported_as_duplicate() {
        let item = item(50);
        let bids = [bid(1, 51)];
        assert_eq!(
            admit(Some(&item), &bids, &clock(), request(51), t0()),
            Err(Rejection::DuplicateAmount { amount: 51 })
        );
        assert_eq!(
            admit(Some(&item), &bids, &clock(), request(40), t0()),
            Err(Rejection::BelowHighBid { high_bid: 51 })
        );
    }

    #[test]
    fn floor_is_checked_against_a_ledger_below_it() {
        // e.g. the floor was raised by hand after bidding started
        let item = item(100);
        let bids = [bid(1, 60)];
        assert_eq!(
            admit(Some(&item), &bids, &clock(), request(90), t0()),
            Err(Rejection::BelowMinimum { min_bid: 100 })
        );
        assert!(admit(Some(&item), &bids, &clock(), request(101), t0()).is_ok());
    }

    #[test]
    fn high_bid_prefers_amount_then_earliest() {
        assert_eq!(high_bid(&[]), None);
        assert_eq!(high_bid(&[bid(1, 51), bid(2, 80), bid(3, 60)]), Some(&bid(2, 80)));
        assert_eq!(high_bid(&[bid(3, 80), bid(2, 80)]), Some(&bid(2, 80)));
    }

    #[test]
    fn winners_skip_items_without_bids() {
        let results = vec![
            ItemResult {
                item: Item {
                    name: "Quilt".to_owned(),
                    ..item(50)
                },
                high_bid: Some(bid(1, 80)),
            },
            ItemResult {
                item: Item {
                    id: 2,
                    name: "Cake".to_owned(),
                    ..item(10)
                },
                high_bid: None,
            },
            ItemResult {
                item: Item {
                    id: 3,
                    name: "Kayak".to_owned(),
                    ..item(100)
                },
                high_bid: Some(Bid {
                    item_id: 3,
                    ..bid(2, 120)
                }),
            },
        ];

        let winners = winners_by_round(&results);
        assert_eq!(winners.len(), 1);
        assert_eq!(
            winners[&7],
            RoundWinnings {
                item_names: vec!["Quilt".to_owned(), "Kayak".to_owned()],
                total: 200,
            }
        );
    }

    #[test]
    fn round_totals_hold_the_largest_amounts() {
        let results = (1..=3)
            .map(|id| ItemResult {
                item: Item { id, ..item(0) },
                high_bid: Some(Bid {
                    item_id: id,
                    ..bid(id, MAX_STORED)
                }),
            })
            .collect::<Vec<_>>();

        let winners = winners_by_round(&results);
        assert_eq!(winners[&7].total, 3 * u128::from(MAX_STORED));
        assert_eq!(winners[&7].item_names.len(), 3);
    }

    #[test]
    fn amounts_drop_zero_cents() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(2500), "25");
        assert_eq!(format_amount(2505), "25.05");
        assert_eq!(format_amount(99), "0.99");
    }
}
