//! In-memory store backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{
    ClientProfile, Invoice, Project, Record, RecordFilter, RecordPatch, User,
};

use super::traits::RecordStore;

/// One entity kind's rows, keyed by id.
struct Table<R: Record> {
    rows: RwLock<HashMap<String, R>>,
}

impl<R: Record> Table<R> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn find_many(&self, filter: &R::Filter) -> Vec<R> {
        let rows = self.rows.read().unwrap();
        let mut hits: Vec<R> = rows.values().filter(|r| filter.matches(r)).cloned().collect();
        hits.sort_by(|a, b| a.id().cmp(b.id()));
        hits
    }

    fn find_unique(&self, filter: &R::Filter) -> Option<R> {
        self.find_many(filter).into_iter().next()
    }

    fn insert(&self, record: R) -> Result<R, StoreError> {
        let mut rows = self.rows.write().unwrap();
        if rows.contains_key(record.id()) {
            return Err(StoreError::Conflict {
                kind: R::KIND,
                id: record.id().to_string(),
            });
        }
        rows.insert(record.id().to_string(), record.clone());
        Ok(record)
    }

    fn update(&self, filter: &R::Filter, patch: &R::Patch) -> Result<R, StoreError> {
        let mut rows = self.rows.write().unwrap();
        let id = rows
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| r.id().to_string())
            .min();
        match id.and_then(|id| rows.get_mut(&id)) {
            Some(record) => {
                patch.apply(record);
                Ok(record.clone())
            }
            None => Err(StoreError::NotFound { kind: R::KIND }),
        }
    }

    fn delete(&self, filter: &R::Filter) -> Result<R, StoreError> {
        let mut rows = self.rows.write().unwrap();
        let id = rows
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| r.id().to_string())
            .min();
        id.and_then(|id| rows.remove(&id))
            .ok_or(StoreError::NotFound { kind: R::KIND })
    }
}

/// Maps an entity kind to its table inside [`MemoryStore`].
trait HasTable<R: Record> {
    fn table(&self) -> &Table<R>;
}

/// In-memory data store holding all four entity kinds.
pub struct MemoryStore {
    users: Table<User>,
    projects: Table<Project>,
    clients: Table<ClientProfile>,
    invoices: Table<Invoice>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            users: Table::new(),
            projects: Table::new(),
            clients: Table::new(),
            invoices: Table::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HasTable<User> for MemoryStore {
    fn table(&self) -> &Table<User> {
        &self.users
    }
}

impl HasTable<Project> for MemoryStore {
    fn table(&self) -> &Table<Project> {
        &self.projects
    }
}

impl HasTable<ClientProfile> for MemoryStore {
    fn table(&self) -> &Table<ClientProfile> {
        &self.clients
    }
}

impl HasTable<Invoice> for MemoryStore {
    fn table(&self) -> &Table<Invoice> {
        &self.invoices
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore
where
    MemoryStore: HasTable<R>,
{
    async fn find_many(&self, filter: &R::Filter) -> Result<Vec<R>, StoreError> {
        Ok(self.table().find_many(filter))
    }

    async fn find_unique(&self, filter: &R::Filter) -> Result<Option<R>, StoreError> {
        Ok(self.table().find_unique(filter))
    }

    async fn create(&self, record: R) -> Result<R, StoreError> {
        self.table().insert(record)
    }

    async fn update(&self, filter: &R::Filter, patch: &R::Patch) -> Result<R, StoreError> {
        self.table().update(filter, patch)
    }

    async fn delete(&self, filter: &R::Filter) -> Result<R, StoreError> {
        self.table().delete(filter)
    }
}
