use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::LinkStore;
use crate::types::{Link, LinkId, SavedLink, User, UserId};

/// [`LinkStore`] backed by PostgreSQL. The `owner_id` column plus composite
/// indexes stand in for the hierarchical parent key of a document store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_user(&self, identity: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, identity, email, tags
            FROM users
            WHERE identity = $1
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await
        .context("failed to look up user")?;

        Ok(row.map(|r| User {
            id: UserId(r.get("id")),
            identity: r.get("identity"),
            email: r.get("email"),
            tags: r.get("tags"),
        }))
    }
}

#[async_trait]
impl LinkStore for PostgresStore {
    async fn get_or_create_user(&self, identity: &str, email: &str) -> Result<User> {
        if let Some(user) = self.find_user(identity).await? {
            return Ok(user);
        }

        // Lazy creation on first access. DO NOTHING keeps a concurrent
        // first-access race harmless; the follow-up read wins either way.
        sqlx::query(
            r#"
            INSERT INTO users (id, identity, email, tags)
            VALUES ($1, $2, $3, '{}')
            ON CONFLICT (identity) DO NOTHING
            "#,
        )
        .bind(UserId::new().0)
        .bind(identity)
        .bind(email)
        .execute(&self.pool)
        .await
        .context("failed to create user")?;

        self.find_user(identity)
            .await?
            .context("user vanished after creation")
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET email = $2, tags = $3 WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(&user.email)
        .bind(&user.tags)
        .execute(&self.pool)
        .await
        .context("failed to save user")?;
        Ok(())
    }

    async fn save_link(&self, owner: UserId, link: &Link) -> Result<LinkId> {
        let id = LinkId::new();
        sqlx::query(
            r#"
            INSERT INTO links (id, owner_id, url, title, tags, added)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.0)
        .bind(owner.0)
        .bind(&link.url)
        .bind(&link.title)
        .bind(&link.tags)
        .bind(link.added)
        .execute(&self.pool)
        .await
        .context("failed to save link")?;
        Ok(id)
    }

    async fn get_link(&self, id: LinkId) -> Result<Option<Link>> {
        let row = sqlx::query(
            r#"
            SELECT url, title, tags, added FROM links WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .context("failed to get link")?;

        Ok(row.map(|r| Link {
            url: r.get("url"),
            title: r.get("title"),
            tags: r.get("tags"),
            added: r.get("added"),
        }))
    }

    async fn put_link(&self, id: LinkId, link: &Link) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE links SET url = $2, title = $3, tags = $4, added = $5
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(&link.url)
        .bind(&link.title)
        .bind(&link.tags)
        .bind(link.added)
        .execute(&self.pool)
        .await
        .context("failed to update link")?;
        Ok(())
    }

    async fn delete_link(&self, id: LinkId) -> Result<()> {
        sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete link")?;
        Ok(())
    }

    async fn list_links(&self, owner: UserId) -> Result<Vec<SavedLink>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, title, tags, added
            FROM links
            WHERE owner_id = $1
            ORDER BY added DESC, id DESC
            "#,
        )
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await
        .context("failed to list links")?;

        Ok(rows
            .into_iter()
            .map(|r| SavedLink {
                id: LinkId(r.get("id")),
                link: Link {
                    url: r.get("url"),
                    title: r.get("title"),
                    tags: r.get("tags"),
                    added: r.get("added"),
                },
            })
            .collect())
    }

    async fn url_exists(&self, owner: UserId, url: &str) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(SELECT 1 FROM links WHERE owner_id = $1 AND url = $2)
            "#,
        )
        .bind(owner.0)
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .context("failed to check for existing url")?;
        Ok(row.get(0))
    }

    async fn url_snapshot(&self, owner: UserId) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT url FROM links WHERE owner_id = $1")
            .bind(owner.0)
            .fetch_all(&self.pool)
            .await
            .context("failed to load url snapshot")?;
        Ok(rows.into_iter().map(|r| r.get("url")).collect())
    }
}
