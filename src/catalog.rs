//! Item catalog
//!
//! The donated items up for auction. Items are only ever added, never
//! changed by the auction itself.
#[cfg(test)]
mod in_memory;
mod postgres;

#[cfg(test)]
pub use self::in_memory::*;
pub use self::postgres::*;

use crate::{
    auction::{Item, ItemId, NewItem},
    persistence::{ConnectionOf, Persistence, TransactionOf},
};
use anyhow::Result;
use std::sync::Arc;

pub trait ItemCatalog {
    type Persistence: Persistence;

    fn get_item(
        &self,
        conn: &mut ConnectionOf<Self::Persistence>,
        item_id: ItemId,
    ) -> Result<Option<Item>>;

    /// All items, ordered by id
    fn all_items(&self, conn: &mut ConnectionOf<Self::Persistence>) -> Result<Vec<Item>>;

    fn add_item(&self, conn: &mut ConnectionOf<Self::Persistence>, item: NewItem)
        -> Result<ItemId>;

    /// Load an item and keep it locked against other transactions that lock
    /// it, until `transaction` ends
    fn lock_item_tr<'a>(
        &self,
        transaction: &mut TransactionOf<'a, Self::Persistence>,
        item_id: ItemId,
    ) -> Result<Option<Item>>;
}

pub type SharedItemCatalog<P> = Arc<dyn ItemCatalog<Persistence = P> + Send + Sync>;
