//! Ownership traits shared by all entity kinds.
//!
//! The access-control layer is written once, generically; these traits are
//! the parameterization points: which field is the owning key, how a
//! caller-supplied filter is pinned to an owner, and how partial updates
//! apply.

/// An entity kind mediated by the access-control layer.
pub trait Record: Clone + Send + Sync + 'static {
    /// Entity name used in errors and logs.
    const KIND: &'static str;

    /// True when the owning key is the record's own id (the User entity).
    /// Such records are never parented to another record; a caller "owns"
    /// only the record whose id equals their own.
    const OWNED_BY_ID: bool = false;

    /// Caller-suppliable lookup criteria for this kind.
    type Filter: RecordFilter<Self>;

    /// Partial-update payload for this kind.
    type Patch: RecordPatch<Self>;

    /// Primary id.
    fn id(&self) -> &str;

    /// Value of the owning key. Equals `id()` for self-owned kinds.
    fn owner_id(&self) -> &str;
}

/// Records owned through a foreign key (`user_id`): projects, client
/// profiles, invoices. These support create and delete through the
/// access-control layer; the User entity deliberately does not, so it
/// implements only [`Record`].
pub trait OwnedRecord: Record {
    /// Overwrite the owning key. Called at create time with the caller's
    /// id, regardless of what the payload carried.
    fn assign_owner(&mut self, owner_id: &str);
}

/// Lookup criteria for a record kind.
///
/// Every field is optional; an empty filter matches everything. The
/// access-control layer narrows a caller's filter by pinning the owning
/// key, so a conflicting caller-supplied value never widens visibility.
pub trait RecordFilter<R>: Clone + Default + Send + Sync {
    /// Whether a record satisfies every criterion in this filter.
    fn matches(&self, record: &R) -> bool;

    /// The owning-key value the caller explicitly asked for, if any.
    fn requested_owner(&self) -> Option<&str>;

    /// Pin the owning key to `owner_id`, overwriting any caller-supplied
    /// value.
    fn constrain_owner(&mut self, owner_id: &str);
}

/// Partial update for a record kind. `None` fields are left untouched.
pub trait RecordPatch<R>: Clone + Send + Sync {
    fn apply(&self, record: &mut R);
}
