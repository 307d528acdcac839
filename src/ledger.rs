//! Bid ledger
//!
//! Append-only record of every admitted bid. Nothing is ever updated or
//! removed; high bids and results are always derived from it on read.
#[cfg(test)]
mod in_memory;
mod postgres;

#[cfg(test)]
pub use self::in_memory::*;
pub use self::postgres::*;

use crate::{
    auction::{AdmittedBid, Bid, BidId, ItemId},
    persistence::{ConnectionOf, Persistence, TransactionOf},
};
use anyhow::Result;
use std::sync::Arc;

pub trait BidLedger {
    type Persistence: Persistence;

    /// Bids for an item, highest amount first
    fn bids_for_item(
        &self,
        conn: &mut ConnectionOf<Self::Persistence>,
        item_id: ItemId,
    ) -> Result<Vec<Bid>>;

    fn bids_for_item_tr<'a>(
        &self,
        transaction: &mut TransactionOf<'a, Self::Persistence>,
        item_id: ItemId,
    ) -> Result<Vec<Bid>>;

    fn append_bid_tr<'a>(
        &self,
        transaction: &mut TransactionOf<'a, Self::Persistence>,
        bid: AdmittedBid,
    ) -> Result<BidId>;
}

pub type SharedBidLedger<P> = Arc<dyn BidLedger<Persistence = P> + Send + Sync>;
