use super::*;
use crate::persistence::{InMemoryConnection, InMemoryPersistence, InMemoryTransaction};
use parking_lot::Mutex;

#[derive(Default)]
pub struct InMemoryBidLedger(Mutex<Vec<Bid>>);

impl InMemoryBidLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedBidLedger<InMemoryPersistence> {
        Arc::new(Self::new())
    }

    fn bids_for(&self, item_id: ItemId) -> Vec<Bid> {
        let mut bids: Vec<_> = self
            .0
            .lock()
            .iter()
            .filter(|bid| bid.item_id == item_id)
            .copied()
            .collect();
        bids.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.id.cmp(&b.id)));
        bids
    }
}

impl BidLedger for InMemoryBidLedger {
    type Persistence = InMemoryPersistence;

    fn bids_for_item(&self, _conn: &mut InMemoryConnection, item_id: ItemId) -> Result<Vec<Bid>> {
        Ok(self.bids_for(item_id))
    }

    fn bids_for_item_tr<'a>(
        &self,
        _transaction: &mut InMemoryTransaction<'a>,
        item_id: ItemId,
    ) -> Result<Vec<Bid>> {
        Ok(self.bids_for(item_id))
    }

    fn append_bid_tr<'a>(
        &self,
        _transaction: &mut InMemoryTransaction<'a>,
        bid: AdmittedBid,
    ) -> Result<BidId> {
        let mut bids = self.0.lock();
        let id = BidId::try_from(bids.len())? + 1;
        bids.push(bid.into_bid(id));
        Ok(id)
    }
}
