use super::*;
use crate::persistence::{
    from_sql_int, to_sql_int, PostgresConnection, PostgresPersistence, PostgresTransaction,
};
use ::postgres::{GenericClient, Row};

const BIDS_FOR_ITEM: &str = "SELECT id, item_id, round_id, amount, created_at FROM bids \
                             WHERE item_id = $1 ORDER BY amount DESC, created_at, id";

pub struct PostgresBidLedger;

impl PostgresBidLedger {
    pub fn new_shared() -> SharedBidLedger<PostgresPersistence> {
        Arc::new(Self)
    }
}

fn bid_from_row(row: &Row) -> Result<Bid> {
    Ok(Bid {
        id: from_sql_int(row.try_get("id")?)?,
        item_id: from_sql_int(row.try_get("item_id")?)?,
        round_id: from_sql_int(row.try_get("round_id")?)?,
        amount: from_sql_int(row.try_get("amount")?)?,
        created_at: row.try_get("created_at")?,
    })
}

fn bids_for_item(client: &mut impl GenericClient, item_id: ItemId) -> Result<Vec<Bid>> {
    client
        .query(BIDS_FOR_ITEM, &[&to_sql_int(item_id)?])?
        .iter()
        .map(bid_from_row)
        .collect()
}

impl BidLedger for PostgresBidLedger {
    type Persistence = PostgresPersistence;

    fn bids_for_item(&self, conn: &mut PostgresConnection, item_id: ItemId) -> Result<Vec<Bid>> {
        bids_for_item(&mut **conn, item_id)
    }

    fn bids_for_item_tr<'a>(
        &self,
        transaction: &mut PostgresTransaction<'a>,
        item_id: ItemId,
    ) -> Result<Vec<Bid>> {
        bids_for_item(transaction, item_id)
    }

    fn append_bid_tr<'a>(
        &self,
        transaction: &mut PostgresTransaction<'a>,
        bid: AdmittedBid,
    ) -> Result<BidId> {
        let row = transaction.query_one(
            "INSERT INTO bids (item_id, round_id, amount, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING id",
            &[
                &to_sql_int(bid.item_id)?,
                &to_sql_int(bid.round_id)?,
                &to_sql_int(bid.amount)?,
                &bid.created_at,
            ],
        )?;
        from_sql_int(row.try_get("id")?)
    }
}
