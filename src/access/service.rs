//! Ownership-scoped accessor over the data store.

use std::sync::Arc;

use crate::auth::CallerIdentity;
use crate::error::{AccessError, Result};
use crate::model::{OwnedRecord, Record, RecordFilter, User};
use crate::store::RecordStore;

/// Per-request mediation layer between callers and the data store.
///
/// Holds the store handle and the caller identity resolved by the
/// authentication layer; both are fixed for the value's lifetime.
/// Construct one per authenticated request; never share an instance
/// across callers.
///
/// Every operation follows the same decision tree: admins pass their
/// filter through unmodified; unauthenticated callers are rejected before
/// the store is touched; everyone else has the entity's owning key pinned
/// to their own id, so a caller-supplied filter can narrow visibility but
/// never widen it.
pub struct AccessControl<S> {
    store: Arc<S>,
    identity: CallerIdentity,
}

impl<S> AccessControl<S> {
    /// Create a service for one request's caller.
    pub fn new(store: Arc<S>, identity: CallerIdentity) -> Self {
        Self { store, identity }
    }

    /// The identity this service was constructed with.
    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    fn caller(&self) -> std::result::Result<&str, AccessError> {
        self.identity
            .caller_id
            .as_deref()
            .ok_or(AccessError::Unauthenticated)
    }

    /// Pin the owning key in `filter` to the caller's id.
    ///
    /// For self-owned kinds (User) a filter that explicitly names a
    /// different id is rejected outright rather than silently rewritten:
    /// the caller asked for someone else's record and must not receive
    /// their own instead.
    fn scope<R: Record>(&self, mut filter: R::Filter) -> std::result::Result<R::Filter, AccessError> {
        let caller = self.caller()?;
        if R::OWNED_BY_ID {
            if let Some(requested) = filter.requested_owner() {
                if requested != caller {
                    tracing::debug!(kind = R::KIND, caller, requested, "denied: id mismatch");
                    return Err(AccessError::Denied { kind: R::KIND });
                }
            }
        }
        filter.constrain_owner(caller);
        Ok(filter)
    }

    /// All records visible to the caller that match the filter.
    ///
    /// Never fails on zero matches; returns an empty collection.
    pub async fn find_many<R: Record>(&self, filter: R::Filter) -> Result<Vec<R>>
    where
        S: RecordStore<R>,
    {
        if self.identity.is_admin {
            return Ok(self.store.find_many(&filter).await?);
        }
        let filter = self.scope::<R>(filter)?;
        Ok(self.store.find_many(&filter).await?)
    }

    /// A single record visible to the caller.
    ///
    /// On the non-admin path a miss under the ownership-pinned filter
    /// fails with the same denial whether the record is absent or owned
    /// by someone else.
    pub async fn find_one<R: Record>(&self, filter: R::Filter) -> Result<R>
    where
        S: RecordStore<R>,
    {
        if self.identity.is_admin {
            return self
                .store
                .find_unique(&filter)
                .await?
                .ok_or_else(|| AccessError::NotFound { kind: R::KIND }.into());
        }
        let filter = self.scope::<R>(filter)?;
        match self.store.find_unique(&filter).await? {
            Some(record) => Ok(record),
            None => {
                tracing::debug!(kind = R::KIND, caller = ?self.identity.caller_id, "denied: no owned match");
                Err(AccessError::Denied { kind: R::KIND }.into())
            }
        }
    }

    /// Create a record owned by the caller.
    ///
    /// The owning key in the payload is overwritten with the caller's id
    /// before the store sees it, for admins too; new records always
    /// belong to whoever created them.
    pub async fn create<R: OwnedRecord>(&self, mut record: R) -> Result<R>
    where
        S: RecordStore<R>,
    {
        let caller = self.caller()?;
        record.assign_owner(caller);
        Ok(self.store.create(record).await?)
    }

    /// Create a user account. Admin-only; the User entity has no
    /// create-as-self path.
    pub async fn create_user(&self, user: User) -> Result<User>
    where
        S: RecordStore<User>,
    {
        self.caller()?;
        if !self.identity.is_admin {
            tracing::debug!(caller = ?self.identity.caller_id, "denied: non-admin user create");
            return Err(AccessError::Denied { kind: User::KIND }.into());
        }
        Ok(self.store.create(user).await?)
    }

    /// Patch a single record owned by the caller.
    ///
    /// Non-admin callers go through an ownership-scoped existence check
    /// first, then the mutation is issued under the same pinned filter,
    /// so even a racing store call cannot touch another caller's row.
    pub async fn update<R: Record>(&self, filter: R::Filter, patch: R::Patch) -> Result<R>
    where
        S: RecordStore<R>,
    {
        if self.identity.is_admin {
            return Ok(self.store.update(&filter, &patch).await?);
        }
        let filter = self.scope::<R>(filter)?;
        if self.store.find_unique(&filter).await?.is_none() {
            tracing::debug!(kind = R::KIND, caller = ?self.identity.caller_id, "denied: update target not owned");
            return Err(AccessError::Denied { kind: R::KIND }.into());
        }
        Ok(self.store.update(&filter, &patch).await?)
    }

    /// Remove a single record owned by the caller. Same two-step protocol
    /// as [`update`](Self::update).
    pub async fn delete<R: OwnedRecord>(&self, filter: R::Filter) -> Result<R>
    where
        S: RecordStore<R>,
    {
        if self.identity.is_admin {
            return Ok(self.store.delete(&filter).await?);
        }
        let filter = self.scope::<R>(filter)?;
        if self.store.find_unique(&filter).await?.is_none() {
            tracing::debug!(kind = R::KIND, caller = ?self.identity.caller_id, "denied: delete target not owned");
            return Err(AccessError::Denied { kind: R::KIND }.into());
        }
        Ok(self.store.delete(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{LedgerdeskError, StoreError};
    use crate::model::{
        Invoice, InvoiceFilter, Project, ProjectFilter, ProjectPatch, ProjectStatus, UserFilter,
        UserPatch,
    };
    use crate::store::MemoryStore;

    /// Store wrapper that counts every delegated call.
    struct CountingStore<S> {
        inner: S,
        calls: AtomicUsize,
    }

    impl<S> CountingStore<S> {
        fn new(inner: S) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<R: Record, S: RecordStore<R>> RecordStore<R> for CountingStore<S> {
        async fn find_many(&self, filter: &R::Filter) -> std::result::Result<Vec<R>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_many(filter).await
        }

        async fn find_unique(
            &self,
            filter: &R::Filter,
        ) -> std::result::Result<Option<R>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_unique(filter).await
        }

        async fn create(&self, record: R) -> std::result::Result<R, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create(record).await
        }

        async fn update(
            &self,
            filter: &R::Filter,
            patch: &R::Patch,
        ) -> std::result::Result<R, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.update(filter, patch).await
        }

        async fn delete(&self, filter: &R::Filter) -> std::result::Result<R, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(filter).await
        }
    }

    fn as_user(store: &Arc<MemoryStore>, id: &str) -> AccessControl<MemoryStore> {
        AccessControl::new(store.clone(), CallerIdentity::user(id))
    }

    fn as_admin(store: &Arc<MemoryStore>) -> AccessControl<MemoryStore> {
        AccessControl::new(store.clone(), CallerIdentity::admin("root"))
    }

    async fn seed_project(store: &Arc<MemoryStore>, owner: &str, name: &str) -> Project {
        store.create(Project::new(owner, name, "")).await.unwrap()
    }

    fn assert_denied(err: LedgerdeskError) {
        assert!(matches!(
            err,
            LedgerdeskError::Access(AccessError::Denied { .. })
        ));
    }

    fn assert_unauthenticated(err: LedgerdeskError) {
        assert!(matches!(
            err,
            LedgerdeskError::Access(AccessError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_owner_reads_own_project() {
        let store = Arc::new(MemoryStore::new());
        let project = seed_project(&store, "alice", "p1").await;

        let found: Project = as_user(&store, "alice")
            .find_one(ProjectFilter::by_id(&project.id))
            .await
            .unwrap();
        assert_eq!(found.id, project.id);
    }

    #[tokio::test]
    async fn test_non_owner_read_is_denied() {
        let store = Arc::new(MemoryStore::new());
        let project = seed_project(&store, "alice", "p1").await;

        let err = as_user(&store, "bob")
            .find_one::<Project>(ProjectFilter::by_id(&project.id))
            .await
            .unwrap_err();
        assert_denied(err);
    }

    #[tokio::test]
    async fn test_admin_reads_any_project() {
        let store = Arc::new(MemoryStore::new());
        let project = seed_project(&store, "alice", "p1").await;

        let found: Project = as_admin(&store)
            .find_one(ProjectFilter::by_id(&project.id))
            .await
            .unwrap();
        assert_eq!(found.user_id, "alice");
    }

    #[tokio::test]
    async fn test_admin_miss_is_not_found() {
        let store = Arc::new(MemoryStore::new());

        let err = as_admin(&store)
            .find_one::<Project>(ProjectFilter::by_id("missing"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerdeskError::Access(AccessError::NotFound { kind: "project" })
        ));
    }

    #[tokio::test]
    async fn test_find_many_scopes_to_owner() {
        let store = Arc::new(MemoryStore::new());
        seed_project(&store, "alice", "mine").await;
        seed_project(&store, "bob", "theirs").await;

        let mine: Vec<Project> = as_user(&store, "alice")
            .find_many(ProjectFilter::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert!(mine.iter().all(|p| p.user_id == "alice"));

        let all: Vec<Project> = as_admin(&store)
            .find_many(ProjectFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_find_many_empty_is_not_an_error() {
        let store = Arc::new(MemoryStore::new());

        let none: Vec<Project> = as_user(&store, "alice")
            .find_many(ProjectFilter::default())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_owner_filter_is_overridden() {
        let store = Arc::new(MemoryStore::new());
        seed_project(&store, "alice", "mine").await;
        seed_project(&store, "bob", "theirs").await;

        // A caller-supplied user_id must not widen visibility.
        let filter = ProjectFilter {
            user_id: Some("bob".to_string()),
            ..ProjectFilter::default()
        };
        let visible: Vec<Project> = as_user(&store, "alice").find_many(filter).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].user_id, "alice");
    }

    #[tokio::test]
    async fn test_create_stamps_caller_as_owner() {
        let store = Arc::new(MemoryStore::new());

        let created: Project = as_user(&store, "alice")
            .create(Project::new("someone-else", "p2", ""))
            .await
            .unwrap();
        assert_eq!(created.user_id, "alice");

        let stored: Project = store
            .find_unique(&ProjectFilter::by_id(&created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, "alice");
    }

    #[tokio::test]
    async fn test_admin_create_is_self_assigned_too() {
        let store = Arc::new(MemoryStore::new());

        let created: Invoice = as_admin(&store)
            .create(Invoice::new("someone-else", "c1", 125_00))
            .await
            .unwrap();
        assert_eq!(created.user_id, "root");
    }

    #[tokio::test]
    async fn test_user_reads_only_self() {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create(User::new("alice@example.com", "Alice")).await.unwrap();
        let bob = store.create(User::new("bob@example.com", "Bob")).await.unwrap();

        let me: User = as_user(&store, &alice.id)
            .find_one(UserFilter {
                id: Some(alice.id.clone()),
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(me.id, alice.id);

        // Explicitly requesting a different id is an equality failure, not
        // a silent rewrite to the caller's own record.
        let err = as_user(&store, &alice.id)
            .find_one::<User>(UserFilter {
                id: Some(bob.id.clone()),
                email: None,
            })
            .await
            .unwrap_err();
        assert_denied(err);

        let other: User = as_admin(&store)
            .find_one(UserFilter {
                id: Some(bob.id.clone()),
                email: None,
            })
            .await
            .unwrap();
        assert_eq!(other.id, bob.id);
    }

    #[tokio::test]
    async fn test_create_user_requires_admin() {
        let store = Arc::new(MemoryStore::new());

        let err = as_user(&store, "alice")
            .create_user(User::new("new@example.com", "New"))
            .await
            .unwrap_err();
        assert_denied(err);

        let created = as_admin(&store)
            .create_user(User::new("new@example.com", "New"))
            .await
            .unwrap();
        assert_eq!(created.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_self_update_user() {
        let store = Arc::new(MemoryStore::new());
        let alice = store.create(User::new("alice@example.com", "Alice")).await.unwrap();
        let bob = store.create(User::new("bob@example.com", "Bob")).await.unwrap();

        let patch = UserPatch {
            name: Some("Alice L.".to_string()),
            email: None,
        };
        let updated: User = as_user(&store, &alice.id)
            .update(
                UserFilter {
                    id: Some(alice.id.clone()),
                    email: None,
                },
                patch.clone(),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Alice L.");

        let err = as_user(&store, &alice.id)
            .update::<User>(
                UserFilter {
                    id: Some(bob.id.clone()),
                    email: None,
                },
                patch,
            )
            .await
            .unwrap_err();
        assert_denied(err);
    }

    #[tokio::test]
    async fn test_non_owner_update_denied_without_mutation() {
        let store = Arc::new(MemoryStore::new());
        let project = seed_project(&store, "alice", "p1").await;

        let patch = ProjectPatch {
            status: Some(ProjectStatus::Archived),
            ..ProjectPatch::default()
        };
        let err = as_user(&store, "bob")
            .update::<Project>(ProjectFilter::by_id(&project.id), patch)
            .await
            .unwrap_err();
        assert_denied(err);

        // Zero mutation to the store.
        let stored: Project = store
            .find_unique(&ProjectFilter::by_id(&project.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ProjectStatus::Active);
    }

    #[tokio::test]
    async fn test_admin_update_passes_through() {
        let store = Arc::new(MemoryStore::new());
        let project = seed_project(&store, "alice", "p1").await;

        let patch = ProjectPatch {
            status: Some(ProjectStatus::Paused),
            ..ProjectPatch::default()
        };
        let updated: Project = as_admin(&store)
            .update(ProjectFilter::by_id(&project.id), patch)
            .await
            .unwrap();
        assert_eq!(updated.status, ProjectStatus::Paused);
    }

    #[tokio::test]
    async fn test_delete_after_denied_attempt() {
        let store = Arc::new(MemoryStore::new());
        let project = seed_project(&store, "alice", "p1").await;

        // Bob fails first.
        let err = as_user(&store, "bob")
            .delete::<Project>(ProjectFilter::by_id(&project.id))
            .await
            .unwrap_err();
        assert_denied(err);

        // Alice succeeds.
        let removed: Project = as_user(&store, "alice")
            .delete(ProjectFilter::by_id(&project.id))
            .await
            .unwrap();
        assert_eq!(removed.id, project.id);

        // Gone for everyone afterwards, admin included.
        let err = as_user(&store, "alice")
            .find_one::<Project>(ProjectFilter::by_id(&project.id))
            .await
            .unwrap_err();
        assert_denied(err);
        let err = as_admin(&store)
            .find_one::<Project>(ProjectFilter::by_id(&project.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerdeskError::Access(AccessError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_repeated_denial_is_stable() {
        let store = Arc::new(MemoryStore::new());
        let project = seed_project(&store, "alice", "p1").await;
        let bob = as_user(&store, "bob");

        for _ in 0..2 {
            let err = bob
                .find_one::<Project>(ProjectFilter::by_id(&project.id))
                .await
                .unwrap_err();
            assert_denied(err);
        }

        // Still exactly one untouched project.
        let all: Vec<Project> = store.find_many(&ProjectFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_never_reaches_store() {
        let store = Arc::new(CountingStore::new(MemoryStore::new()));
        let access = AccessControl::new(store.clone(), CallerIdentity::anonymous());

        assert_unauthenticated(
            access
                .find_many::<Project>(ProjectFilter::default())
                .await
                .unwrap_err(),
        );
        assert_unauthenticated(
            access
                .find_one::<Project>(ProjectFilter::by_id("p1"))
                .await
                .unwrap_err(),
        );
        assert_unauthenticated(
            access
                .create(Project::new("", "p", ""))
                .await
                .unwrap_err(),
        );
        assert_unauthenticated(
            access
                .create_user(User::new("x@example.com", "X"))
                .await
                .unwrap_err(),
        );
        assert_unauthenticated(
            access
                .update::<Project>(ProjectFilter::by_id("p1"), ProjectPatch::default())
                .await
                .unwrap_err(),
        );
        assert_unauthenticated(
            access
                .delete::<Project>(ProjectFilter::by_id("p1"))
                .await
                .unwrap_err(),
        );
        assert_unauthenticated(
            access
                .find_many::<Invoice>(InvoiceFilter::default())
                .await
                .unwrap_err(),
        );

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_reads_without_identity() {
        // Admin-path reads are the one exception to the identity
        // requirement: the filter passes through untouched.
        let store = Arc::new(MemoryStore::new());
        seed_project(&store, "alice", "p1").await;

        let identity = CallerIdentity {
            caller_id: None,
            is_admin: true,
            method: None,
        };
        let access = AccessControl::new(store.clone(), identity);

        let all: Vec<Project> = access.find_many(ProjectFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        // Create still demands an identity to stamp as owner.
        assert_unauthenticated(
            access
                .create(Project::new("", "p2", ""))
                .await
                .unwrap_err(),
        );
    }
}
