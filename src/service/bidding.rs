//! Bidding
//!
//! Admits bids: loads the item and its bids inside one transaction that holds
//! the item locked, runs the admission checks and appends the bid.
use crate::{
    auction::{self, Bid, BidRequest, Rejection},
    catalog::SharedItemCatalog,
    clock::{AuctionClock, SharedTimeSource},
    ledger::SharedBidLedger,
    persistence::{Connection, Persistence, Transaction},
};
use chrono::SubsecRound;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BidError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct BiddingService<P: Persistence> {
    persistence: P,
    catalog: SharedItemCatalog<P>,
    ledger: SharedBidLedger<P>,
    clock: AuctionClock,
    time: SharedTimeSource,
}

impl<P: Persistence> BiddingService<P> {
    pub fn new(
        persistence: P,
        catalog: SharedItemCatalog<P>,
        ledger: SharedBidLedger<P>,
        clock: AuctionClock,
        time: SharedTimeSource,
    ) -> Self {
        Self {
            persistence,
            catalog,
            ledger,
            clock,
            time,
        }
    }

    pub fn clock(&self) -> AuctionClock {
        self.clock
    }

    /// Admit `request` into the ledger, or explain why not
    pub fn place_bid(&self, request: BidRequest) -> Result<Bid, BidError> {
        let mut connection = self.persistence.get_connection()?;
        let mut transaction = connection.start_transaction()?;

        let item = self.catalog.lock_item_tr(&mut transaction, request.item_id)?;
        let bids = match &item {
            Some(item) => self.ledger.bids_for_item_tr(&mut transaction, item.id)?,
            None => vec![],
        };

        // Read only once the item is locked: a bid that waited for the lock
        // past closing time must not get in. Postgres keeps microseconds.
        let now = self.time.now().trunc_subsecs(6);

        let admitted = match auction::admit(item.as_ref(), &bids, &self.clock, request, now) {
            Ok(admitted) => admitted,
            Err(rejection) => {
                debug!(?request, %rejection, "bid rejected");
                return Err(rejection.into());
            }
        };

        let id = self.ledger.append_bid_tr(&mut transaction, admitted)?;
        transaction.commit()?;

        let bid = admitted.into_bid(id);
        info!(?bid, "bid admitted");
        Ok(bid)
    }
}
