//! Store trait definitions.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::Record;

/// Generic CRUD surface over one entity kind.
///
/// Implementations apply filters verbatim; ownership scoping happens a
/// layer above, in the access-control service. Single-record operations
/// (`update`, `delete`) fail with [`StoreError::NotFound`] when the filter
/// matches nothing.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// All records matching the filter.
    async fn find_many(&self, filter: &R::Filter) -> Result<Vec<R>, StoreError>;

    /// The first record matching the filter in id order, if any.
    async fn find_unique(&self, filter: &R::Filter) -> Result<Option<R>, StoreError>;

    /// Insert a record. Fails with [`StoreError::Conflict`] on a duplicate id.
    async fn create(&self, record: R) -> Result<R, StoreError>;

    /// Patch the first record matching the filter, returning the updated row.
    async fn update(&self, filter: &R::Filter, patch: &R::Patch) -> Result<R, StoreError>;

    /// Remove the first record matching the filter, returning the removed row.
    async fn delete(&self, filter: &R::Filter) -> Result<R, StoreError>;
}
