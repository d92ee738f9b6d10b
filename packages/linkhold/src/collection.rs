//! Operations on an existing collection: list, export, edit a title,
//! delete by opaque identifier.

use crate::error::LinkError;
use crate::storage::LinkStore;
use crate::types::{LinkId, SavedLink, UserId};

fn decode_key(key: &str) -> Result<LinkId, LinkError> {
    // A malformed token is a client-input error, not a store error.
    key.parse().map_err(|_| LinkError::NotFound)
}

/// List `owner`'s links, newest first.
pub async fn list_links(store: &impl LinkStore, owner: UserId) -> Result<Vec<SavedLink>, LinkError> {
    store.list_links(owner).await.map_err(LinkError::Store)
}

/// Export `owner`'s URLs joined by `;`, the batch-add wire format.
///
/// Every URL is followed by a `;`, including the last. A URL containing a
/// literal `;` cannot round-trip through this format; that is a limitation
/// of the format itself.
pub async fn export_urls(store: &impl LinkStore, owner: UserId) -> Result<String, LinkError> {
    let links = store.list_links(owner).await.map_err(LinkError::Store)?;
    let mut out = String::new();
    for link in &links {
        out.push_str(&link.link.url);
        out.push(';');
    }
    Ok(out)
}

/// Overwrite a link's title, addressed by opaque token.
///
/// The new title is HTML-escaped before storing so stored titles stay inert
/// when rendered (scraped titles arrive already decoded as plain text).
pub async fn edit_title(
    store: &impl LinkStore,
    key: &str,
    new_title: &str,
) -> Result<(), LinkError> {
    let id = decode_key(key)?;
    let mut link = store
        .get_link(id)
        .await
        .map_err(LinkError::Store)?
        .ok_or(LinkError::NotFound)?;
    link.title = html_escape::encode_safe(new_title).into_owned();
    store.put_link(id, &link).await.map_err(LinkError::Store)
}

/// Delete a link by opaque token.
///
/// The token's owner is not checked against the caller: link ids are
/// treated as unguessable capability strings, so holding a valid token is
/// taken as authorization.
pub async fn delete_link(store: &impl LinkStore, key: &str) -> Result<(), LinkError> {
    let id = decode_key(key)?;
    store.delete_link(id).await.map_err(LinkError::Store)
}
