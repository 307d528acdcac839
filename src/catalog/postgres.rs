use super::*;
use crate::persistence::{
    from_sql_int, to_sql_int, PostgresConnection, PostgresPersistence, PostgresTransaction,
};
use ::postgres::Row;

pub struct PostgresItemCatalog;

impl PostgresItemCatalog {
    pub fn new_shared() -> SharedItemCatalog<PostgresPersistence> {
        Arc::new(Self)
    }
}

fn item_from_row(row: &Row) -> Result<Item> {
    Ok(Item {
        id: from_sql_int(row.try_get("id")?)?,
        name: row.try_get("name")?,
        provided_by: row.try_get("provided_by")?,
        description: row.try_get("description")?,
        value: from_sql_int(row.try_get("value")?)?,
        min_bid: from_sql_int(row.try_get("min_bid")?)?,
    })
}

impl ItemCatalog for PostgresItemCatalog {
    type Persistence = PostgresPersistence;

    fn get_item(&self, conn: &mut PostgresConnection, item_id: ItemId) -> Result<Option<Item>> {
        conn.query_opt(
            "SELECT id, name, provided_by, description, value, min_bid \
             FROM items WHERE id = $1",
            &[&to_sql_int(item_id)?],
        )?
        .as_ref()
        .map(item_from_row)
        .transpose()
    }

    fn all_items(&self, conn: &mut PostgresConnection) -> Result<Vec<Item>> {
        conn.query(
            "SELECT id, name, provided_by, description, value, min_bid \
             FROM items ORDER BY id",
            &[],
        )?
        .iter()
        .map(item_from_row)
        .collect()
    }

    fn add_item(&self, conn: &mut PostgresConnection, item: NewItem) -> Result<ItemId> {
        let row = conn.query_one(
            "INSERT INTO items (name, provided_by, description, value, min_bid) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
            &[
                &item.name,
                &item.provided_by,
                &item.description,
                &to_sql_int(item.value)?,
                &to_sql_int(item.min_bid)?,
            ],
        )?;
        from_sql_int(row.try_get("id")?)
    }

    fn lock_item_tr<'a>(
        &self,
        transaction: &mut PostgresTransaction<'a>,
        item_id: ItemId,
    ) -> Result<Option<Item>> {
        transaction
            .query_opt(
                "SELECT id, name, provided_by, description, value, min_bid \
                 FROM items WHERE id = $1 FOR UPDATE",
                &[&to_sql_int(item_id)?],
            )?
            .as_ref()
            .map(item_from_row)
            .transpose()
    }
}
