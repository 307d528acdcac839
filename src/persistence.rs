//! Database persistence traits
//!
//! Expressing atomic transactions spanning multiple stores/repositories in a
//! hexagonal architecture is not a simple thing in any programming language.
//! Here every store is generic over a [`Persistence`], and its methods take
//! either a plain connection (reads that need no isolation) or a transaction
//! of that same persistence (anything that must be atomic with other stores).
//!
//! Some discussion:
//!
//! * https://www.reddit.com/r/rust/comments/p9amqt/hexagonal_architecture_in_rust_1/h9ypjoo?utm_source=share&utm_medium=web2x&context=3
//! * https://www.reddit.com/r/golang/comments/i1vy4s/ddd_vs_db_transactions_how_to_reconcile/
#[cfg(test)]
pub mod in_memory;
pub mod postgres;

#[cfg(test)]
pub use self::in_memory::*;
pub use self::postgres::*;

use anyhow::Result;

/// An instance of a persistence (store) that can hold data
///
/// Must be cloneable and thread-safe.
pub trait Persistence: Send + Sync + Clone + 'static {
    type Connection: Connection + 'static;

    /// Get a connection to a store
    fn get_connection(&self) -> Result<Self::Connection>;
}

/// A connection to a database/persistence
pub trait Connection {
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    fn start_transaction(&mut self) -> Result<Self::Transaction<'_>>;
}

/// A database transaction to a database/persistence
///
/// Dropping a transaction without committing it discards it.
pub trait Transaction {
    fn commit(self) -> Result<()>;
}

pub type ConnectionOf<P> = <P as Persistence>::Connection;
pub type TransactionOf<'a, P> = <ConnectionOf<P> as Connection>::Transaction<'a>;
