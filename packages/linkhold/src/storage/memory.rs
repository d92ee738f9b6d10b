//! In-memory store for tests and local development.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;

use super::LinkStore;
use crate::types::{Link, LinkId, SavedLink, User, UserId};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    links: Vec<(UserId, LinkId, Link)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("MemoryStore mutex poisoned")
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn get_or_create_user(&self, identity: &str, email: &str) -> Result<User> {
        let mut inner = self.inner();
        if let Some(user) = inner.users.iter().find(|u| u.identity == identity) {
            return Ok(user.clone());
        }
        let user = User::new(identity.to_string(), email.to_string());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner();
        match inner.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => inner.users.push(user.clone()),
        }
        Ok(())
    }

    async fn save_link(&self, owner: UserId, link: &Link) -> Result<LinkId> {
        let id = LinkId::new();
        self.inner().links.push((owner, id, link.clone()));
        Ok(id)
    }

    async fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
        Ok(self
            .inner()
            .links
            .iter()
            .find(|(_, lid, _)| *lid == id)
            .map(|(_, _, link)| link.clone()))
    }

    async fn put_link(&self, id: LinkId, link: &Link) -> Result<()> {
        let mut inner = self.inner();
        if let Some(entry) = inner.links.iter_mut().find(|(_, lid, _)| *lid == id) {
            entry.2 = link.clone();
        }
        Ok(())
    }

    async fn delete_link(&self, id: LinkId) -> Result<()> {
        self.inner().links.retain(|(_, lid, _)| *lid != id);
        Ok(())
    }

    async fn list_links(&self, owner: UserId) -> Result<Vec<SavedLink>> {
        let mut links: Vec<SavedLink> = self
            .inner()
            .links
            .iter()
            .filter(|(o, _, _)| *o == owner)
            .map(|(_, id, link)| SavedLink {
                id: *id,
                link: link.clone(),
            })
            .collect();
        // Newest first; v7 ids are time-ordered, so the id tie-break is stable.
        links.sort_by(|a, b| {
            b.link
                .added
                .cmp(&a.link.added)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });
        Ok(links)
    }

    async fn url_exists(&self, owner: UserId, url: &str) -> Result<bool> {
        Ok(self
            .inner()
            .links
            .iter()
            .any(|(o, _, link)| *o == owner && link.url == url))
    }

    async fn url_snapshot(&self, owner: UserId) -> Result<HashSet<String>> {
        Ok(self
            .inner()
            .links
            .iter()
            .filter(|(o, _, _)| *o == owner)
            .map(|(_, _, link)| link.url.clone())
            .collect())
    }
}
