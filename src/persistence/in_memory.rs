use super::*;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Fake in-memory persistence.
///
/// Useful for unit-tests. The in-memory stores apply writes immediately, so
/// the only thing a transaction provides is exclusion: all transactions of one
/// persistence instance are serialized on a single lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistence {
    lock: Arc<Mutex<()>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    type Connection = InMemoryConnection;

    fn get_connection(&self) -> Result<Self::Connection> {
        Ok(InMemoryConnection {
            lock: self.lock.clone(),
        })
    }
}

#[derive(Default, Debug)]
pub struct InMemoryConnection {
    lock: Arc<Mutex<()>>,
}

impl Connection for InMemoryConnection {
    type Transaction<'a> = InMemoryTransaction<'a>
    where
        Self: 'a;

    fn start_transaction(&mut self) -> Result<InMemoryTransaction<'_>> {
        Ok(InMemoryTransaction {
            lock_guard: self.lock.lock(),
        })
    }
}

#[derive(Debug)]
pub struct InMemoryTransaction<'a> {
    #[allow(unused)] // used only by Drop
    lock_guard: MutexGuard<'a, ()>,
}

impl<'a> Transaction for InMemoryTransaction<'a> {
    fn commit(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    #[test]
    fn transactions_are_exclusive() -> Result<()> {
        let persistence = InMemoryPersistence::new();
        let inside = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let persistence = persistence.clone();
                let inside = inside.clone();
                thread::spawn(move || -> Result<()> {
                    let mut conn = persistence.get_connection()?;
                    for _ in 0..100 {
                        let transaction = conn.start_transaction()?;
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                        transaction.commit()?;
                    }
                    Ok(())
                })
            })
            .collect();

        for thread in threads {
            thread.join().expect("no panic")?;
        }
        Ok(())
    }
}
