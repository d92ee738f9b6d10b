use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a link.
///
/// Its string form is the opaque token clients use to address a link for
/// edit and delete. Parsing a malformed token is a client-input error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LinkId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A registered user. Links are owned by exactly one user and every link
/// query is scoped to the owner's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Stable external identity key, assigned by the auth collaborator.
    pub identity: String,
    pub email: String,
    pub tags: Vec<String>,
}

impl User {
    pub fn new(identity: String, email: String) -> Self {
        Self {
            id: UserId::new(),
            identity,
            email,
            tags: Vec::new(),
        }
    }

    /// Add tags, suppressing duplicates and preserving insertion order.
    pub fn add_tags<I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = String>,
    {
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }
}

/// A bookmarked page. The title is always populated: a scraped title, the
/// URL itself, or the message explaining why scraping failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub added: DateTime<Utc>,
}

impl Link {
    pub fn new(url: String, title: String) -> Self {
        Self {
            url,
            title,
            tags: Vec::new(),
            added: Utc::now(),
        }
    }
}

/// A link together with its store-issued identifier, as returned by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLink {
    pub id: LinkId,
    #[serde(flatten)]
    pub link: Link,
}
