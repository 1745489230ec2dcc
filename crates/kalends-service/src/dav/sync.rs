//! Change sets for sync-collection reports.
//!
//! A sync token `T` names the point in a collection's change log just before
//! the change recorded at `T`. Asking for changes since `T` returns every
//! member touched at a token `>= T`, collapsed to one entry per uri.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use kalends_core::constants::SYNC_TOKEN_PREFIX;
use kalends_db::db::enums::ChangeOperation;
use kalends_db::db::store::DavStore;
use kalends_db::model::change::DavChange;

use crate::error::{ServiceError, ServiceResult};

/// A client-supplied sync cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncToken {
    /// No token: list every member as added.
    Initial,
    /// Changes recorded at or after this token.
    Since(i64),
}

impl FromStr for SyncToken {
    type Err = ServiceError;

    /// Accepts `""`, a bare integer, or the integer behind [`SYNC_TOKEN_PREFIX`].
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::Initial);
        }
        let digits = text.strip_prefix(SYNC_TOKEN_PREFIX).unwrap_or(text);
        match digits.parse::<i64>() {
            Ok(token) if token >= 0 => Ok(Self::Since(token)),
            _ => {
                tracing::warn!(token = %text, "Rejecting malformed sync token");
                Err(ServiceError::InvalidSyncToken(text.to_owned()))
            }
        }
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => Ok(()),
            Self::Since(token) => write!(f, "{SYNC_TOKEN_PREFIX}{token}"),
        }
    }
}

/// Renders a token as the opaque `sync-token`/`getctag` string.
#[must_use]
pub fn format_token(token: i64) -> String {
    SyncToken::Since(token).to_string()
}

/// Result of a sync query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Cursor for the next request.
    pub sync_token: i64,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    /// More changes remain beyond `sync_token`; the client must ask again.
    pub result_truncated: bool,
}

impl ChangeSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// ## Summary
/// Collapses ordered change records into a [`ChangeSet`].
///
/// The highest-token record per uri wins. Surviving entries are taken in
/// token order; with a `limit`, entries beyond it are dropped and the set is
/// marked truncated. The cursor is one past the last included token, or
/// `since` when nothing was included.
#[must_use]
pub fn coalesce(changes: &[DavChange], since: i64, limit: Option<usize>) -> ChangeSet {
    let mut latest: HashMap<&str, (i64, ChangeOperation)> = HashMap::new();
    for change in changes {
        latest.insert(change.uri.as_str(), (change.synctoken, change.operation));
    }

    let mut entries: Vec<(i64, ChangeOperation, &str)> = latest
        .into_iter()
        .map(|(uri, (token, operation))| (token, operation, uri))
        .collect();
    entries.sort_unstable_by_key(|(token, _, _)| *token);

    let mut result = ChangeSet {
        sync_token: since,
        ..ChangeSet::default()
    };
    if let Some(limit) = limit
        && entries.len() > limit
    {
        entries.truncate(limit);
        result.result_truncated = true;
    }

    for (token, operation, uri) in entries {
        let bucket = match operation {
            ChangeOperation::Added => &mut result.added,
            ChangeOperation::Modified => &mut result.modified,
            ChangeOperation::Deleted => &mut result.deleted,
        };
        bucket.push(uri.to_owned());
        result.sync_token = token + 1;
    }
    result
}

/// ## Summary
/// Returns the changes of a collection since `token`.
///
/// The current token is read before the change log, so a change whose token
/// bump is not yet visible is never reported. Returns `None` when the
/// collection does not exist.
///
/// ## Errors
/// Returns a database error if a store read fails.
#[tracing::instrument(skip(store), fields(%collection_id, ?token, ?limit))]
pub async fn get_changes(
    store: &dyn DavStore,
    collection_id: uuid::Uuid,
    token: SyncToken,
    limit: Option<usize>,
) -> ServiceResult<Option<ChangeSet>> {
    let Some(current) = store.current_token(collection_id).await? else {
        tracing::debug!("Sync against unknown collection");
        return Ok(None);
    };

    let change_set = match token {
        SyncToken::Initial => ChangeSet {
            sync_token: current,
            added: store.member_uris(collection_id).await?,
            ..ChangeSet::default()
        },
        SyncToken::Since(since) => {
            let changes = store.changes_between(collection_id, since, current).await?;
            coalesce(&changes, since, limit)
        }
    };

    tracing::debug!(
        sync_token = change_set.sync_token,
        changes = change_set.len(),
        truncated = change_set.result_truncated,
        "Computed change set"
    );
    Ok(Some(change_set))
}
