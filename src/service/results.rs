//! Results
//!
//! Read-side views over the ledger. Nothing is cached: every call reads the
//! current bids, so a query made after a bid was admitted always sees it.
use crate::{
    auction::{self, Bid, Item, ItemId, ItemResult, RoundId, RoundWinnings},
    catalog::SharedItemCatalog,
    ledger::SharedBidLedger,
    persistence::{ConnectionOf, Persistence},
};
use anyhow::Result;
use std::collections::BTreeMap;

/// Item results and the winners they add up to, from one read of the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Standings {
    pub items: Vec<ItemResult>,
    pub winners: BTreeMap<RoundId, RoundWinnings>,
}

pub struct ResultsService<P: Persistence> {
    persistence: P,
    catalog: SharedItemCatalog<P>,
    ledger: SharedBidLedger<P>,
}

impl<P: Persistence> ResultsService<P> {
    pub fn new(persistence: P, catalog: SharedItemCatalog<P>, ledger: SharedBidLedger<P>) -> Self {
        Self {
            persistence,
            catalog,
            ledger,
        }
    }

    pub fn high_bid(&self, item_id: ItemId) -> Result<Option<Bid>> {
        let mut conn = self.persistence.get_connection()?;
        self.high_bid_conn(&mut conn, item_id)
    }

    fn high_bid_conn(&self, conn: &mut ConnectionOf<P>, item_id: ItemId) -> Result<Option<Bid>> {
        let bids = self.ledger.bids_for_item(conn, item_id)?;
        Ok(auction::high_bid(&bids).copied())
    }

    /// An item with its current high bid, if the item exists
    pub fn item_result(&self, item_id: ItemId) -> Result<Option<ItemResult>> {
        let Some(item) = self
            .catalog
            .get_item(&mut self.persistence.get_connection()?, item_id)?
        else {
            return Ok(None);
        };

        Ok(Some(ItemResult {
            high_bid: self.high_bid(item.id)?,
            item,
        }))
    }

    /// Every item in catalog order, with its current high bid
    pub fn item_results(&self) -> Result<Vec<ItemResult>> {
        let mut conn = self.persistence.get_connection()?;
        self.catalog
            .all_items(&mut conn)?
            .into_iter()
            .map(|item| self.with_high_bid(&mut conn, item))
            .collect()
    }

    pub fn standings(&self) -> Result<Standings> {
        let items = self.item_results()?;
        Ok(Standings {
            winners: auction::winners_by_round(&items),
            items,
        })
    }

    fn with_high_bid(&self, conn: &mut ConnectionOf<P>, item: Item) -> Result<ItemResult> {
        Ok(ItemResult {
            high_bid: self.high_bid_conn(conn, item.id)?,
            item,
        })
    }
}
