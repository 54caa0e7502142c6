use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{TokenSet, UserProfile};

#[derive(Debug, Default)]
struct SessionCells {
    tokens: RwLock<Option<TokenSet>>,
    identity: RwLock<Option<UserProfile>>,
}

/// Mutable state of one logical session: the stored token set and the
/// identity cache.
///
/// Create one per request (server rendering) or per application session
/// (client) and hand clones to the [`TokenStore`](super::TokenStore) and
/// collaborators; clones share the same cells. Locks are released before
/// every return, so no guard outlives a call.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    cells: Arc<SessionCells>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tokens(&self) -> Option<TokenSet> {
        self.cells.tokens.read().clone()
    }

    pub fn set_tokens(&self, tokens: Option<TokenSet>) {
        *self.cells.tokens.write() = tokens;
    }

    #[must_use]
    pub fn identity(&self) -> Option<UserProfile> {
        self.cells.identity.read().clone()
    }

    pub fn set_identity(&self, profile: Option<UserProfile>) {
        *self.cells.identity.write() = profile;
    }

    pub fn clear_identity(&self) {
        self.set_identity(None);
    }

    /// Drop all session state, e.g. at the end of a request.
    pub fn teardown(&self) {
        self.set_tokens(None);
        self.clear_identity();
    }

    /// `true` when both handles point at the same session.
    #[must_use]
    pub fn same_session(&self, other: &SessionContext) -> bool {
        Arc::ptr_eq(&self.cells, &other.cells)
    }
}
