mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Link, LinkId, SavedLink, User, UserId};

/// Owner-scoped persistence for users and their links.
///
/// Ownership is expressed solely through the owner id a link is saved under;
/// every collection query is scoped to one owner. The point operations
/// (`get_link`, `put_link`, `delete_link`) address a link by id alone, for
/// callers that hold an opaque link token.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Look up a user by external identity key, creating the record on
    /// first access.
    async fn get_or_create_user(&self, identity: &str, email: &str) -> Result<User>;

    /// Overwrite a user record (tag updates).
    async fn save_user(&self, user: &User) -> Result<()>;

    /// Persist a link under `owner`, returning the store-issued id.
    async fn save_link(&self, owner: UserId, link: &Link) -> Result<LinkId>;

    /// Point read by id.
    async fn get_link(&self, id: LinkId) -> Result<Option<Link>>;

    /// Point overwrite by id.
    async fn put_link(&self, id: LinkId, link: &Link) -> Result<()>;

    /// Point delete by id. Deleting an id that is already gone is not an
    /// error.
    async fn delete_link(&self, id: LinkId) -> Result<()>;

    /// All of `owner`'s links, newest first (ties broken by id, stable).
    async fn list_links(&self, owner: UserId) -> Result<Vec<SavedLink>>;

    /// Whether `owner` already has `url` saved, by exact string match.
    async fn url_exists(&self, owner: UserId, url: &str) -> Result<bool>;

    /// Every URL `owner` has saved. Loaded once per batch for membership
    /// checks; inserts made after the load are not reflected.
    async fn url_snapshot(&self, owner: UserId) -> Result<HashSet<String>>;
}
