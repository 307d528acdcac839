use super::*;
use crate::persistence::{InMemoryConnection, InMemoryPersistence, InMemoryTransaction};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Items kept in a map
///
/// Locking an item relies on [`InMemoryTransaction`] already being exclusive.
#[derive(Default)]
pub struct InMemoryItemCatalog(Mutex<BTreeMap<ItemId, Item>>);

impl InMemoryItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedItemCatalog<InMemoryPersistence> {
        Arc::new(Self::new())
    }
}

impl ItemCatalog for InMemoryItemCatalog {
    type Persistence = InMemoryPersistence;

    fn get_item(&self, _conn: &mut InMemoryConnection, item_id: ItemId) -> Result<Option<Item>> {
        Ok(self.0.lock().get(&item_id).cloned())
    }

    fn all_items(&self, _conn: &mut InMemoryConnection) -> Result<Vec<Item>> {
        Ok(self.0.lock().values().cloned().collect())
    }

    fn add_item(&self, _conn: &mut InMemoryConnection, item: NewItem) -> Result<ItemId> {
        let mut items = self.0.lock();
        let id = items.keys().next_back().map_or(1, |last| last + 1);
        items.insert(
            id,
            Item {
                id,
                name: item.name,
                provided_by: item.provided_by,
                description: item.description,
                value: item.value,
                min_bid: item.min_bid,
            },
        );
        Ok(id)
    }

    fn lock_item_tr<'a>(
        &self,
        _transaction: &mut InMemoryTransaction<'a>,
        item_id: ItemId,
    ) -> Result<Option<Item>> {
        Ok(self.0.lock().get(&item_id).cloned())
    }
}
