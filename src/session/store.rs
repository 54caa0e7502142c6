use std::sync::Arc;

use time::Duration;

use super::config::{CookieSettings, SessionConfig, StorageMode};
use super::cookies::RefreshTokenCookie;
use super::state::SessionContext;
use super::traits::CookieStorage;
use crate::types::TokenSet;

/// Reads and writes the current [`TokenSet`].
///
/// The access token and expiry always live in the [`SessionContext`]. The
/// refresh token lives there too under [`StorageMode::StateOnly`], or in the
/// refresh-token cookie under [`StorageMode::CookiePersisted`]. The access
/// token is never written to a cookie.
#[derive(Clone)]
pub struct TokenStore {
    context: SessionContext,
    cookies: Arc<dyn CookieStorage>,
    mode: StorageMode,
    settings: CookieSettings,
}

impl TokenStore {
    #[must_use]
    pub fn new(
        config: &SessionConfig,
        context: SessionContext,
        cookies: Arc<dyn CookieStorage>,
    ) -> Self {
        Self {
            context,
            cookies,
            mode: config.storage_mode,
            settings: config.cookies.clone(),
        }
    }

    /// Current token set; missing values are `None`.
    #[must_use]
    pub fn get(&self) -> TokenSet {
        let stored = self.context.tokens().unwrap_or_default();
        let refresh_token = match self.mode {
            StorageMode::CookiePersisted => self.refresh_token(None).value(),
            StorageMode::StateOnly => stored.refresh_token,
        };
        TokenSet {
            access_token: stored.access_token,
            refresh_token,
            expires_at: stored.expires_at,
            expires: stored.expires,
        }
    }

    /// Replace the stored token set; `None` ends the session.
    ///
    /// Under [`StorageMode::CookiePersisted`] the refresh token is also
    /// written to the cookie, whose max-age is the set's `expires` value
    /// applied in seconds (absent or zero gives a session cookie). A missing
    /// refresh token removes the cookie.
    pub fn set(&self, tokens: Option<TokenSet>) {
        if self.mode == StorageMode::CookiePersisted {
            let max_age = tokens
                .as_ref()
                .and_then(|t| t.expires)
                .filter(|&expires| expires > 0)
                .map(Duration::seconds);
            let refresh_token = tokens.as_ref().and_then(|t| t.refresh_token.clone());
            self.refresh_token(max_age).set(refresh_token);
        }
        self.context.set_tokens(tokens);
    }

    /// Handle on the refresh-token cookie, writing with `max_age`.
    #[must_use]
    pub fn refresh_token(&self, max_age: Option<Duration>) -> RefreshTokenCookie {
        RefreshTokenCookie::new(self.cookies.clone(), self.settings.clone(), max_age)
    }

    /// Raw stored record, without the cookie lookup.
    #[must_use]
    pub fn state(&self) -> Option<TokenSet> {
        self.context.tokens()
    }

    #[must_use]
    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("mode", &self.mode)
            .field("cookie", &self.settings.refresh_token_cookie_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use cookie::SameSite;

    use super::*;
    use crate::session::MemoryCookies;

    fn store(mode: StorageMode) -> (TokenStore, Arc<MemoryCookies>) {
        let cookies = Arc::new(MemoryCookies::new());
        let config = SessionConfig::new()
            .with_storage_mode(mode)
            .with_http_only(true)
            .with_same_site(SameSite::Strict)
            .with_secure(true);
        let store = TokenStore::new(&config, SessionContext::new(), cookies.clone());
        (store, cookies)
    }

    fn tokens() -> TokenSet {
        TokenSet {
            access_token: Some("access-1".into()),
            refresh_token: Some("refresh-1".into()),
            expires_at: Some(1_700_000_900_000),
            expires: Some(900_000),
        }
    }

    #[test]
    fn round_trip_state_only() {
        let (store, _) = store(StorageMode::StateOnly);
        store.set(Some(tokens()));
        assert_eq!(store.get(), tokens());
    }

    #[test]
    fn round_trip_cookie_persisted() {
        let (store, _) = store(StorageMode::CookiePersisted);
        store.set(Some(tokens()));
        assert_eq!(store.get(), tokens());
    }

    #[test]
    fn state_only_never_touches_cookie() {
        let (store, cookies) = store(StorageMode::StateOnly);
        store.set(Some(tokens()));
        store.set(None);
        assert!(cookies.pending().is_empty());
        assert!(cookies.get("directus_refresh_token").is_none());
    }

    #[test]
    fn cookie_persisted_always_writes_cookie() {
        let (store, cookies) = store(StorageMode::CookiePersisted);
        store.set(Some(tokens()));
        store.set(Some(TokenSet {
            refresh_token: Some("refresh-2".into()),
            ..tokens()
        }));
        assert_eq!(cookies.pending().len(), 2);
        assert_eq!(
            cookies.get("directus_refresh_token").as_deref(),
            Some("refresh-2")
        );
    }

    #[test]
    fn cookie_never_holds_access_token() {
        let (store, cookies) = store(StorageMode::CookiePersisted);
        store.set(Some(tokens()));
        for cookie in cookies.pending() {
            assert_ne!(cookie.value(), "access-1");
        }
    }

    #[test]
    fn cookie_persisted_refresh_token_read_from_cookie() {
        let (store, cookies) = store(StorageMode::CookiePersisted);
        store.set(Some(tokens()));

        // A cookie written by another tab wins over session state.
        store.refresh_token(None).set(Some("from-other-tab".into()));

        assert_eq!(store.get().refresh_token.as_deref(), Some("from-other-tab"));
        assert_eq!(
            store.state().and_then(|t| t.refresh_token).as_deref(),
            Some("refresh-1")
        );
        assert_eq!(cookies.get("directus_refresh_token").as_deref(), Some("from-other-tab"));
    }

    #[test]
    fn clearing_empties_state_and_cookie() {
        let (store, cookies) = store(StorageMode::CookiePersisted);
        store.set(Some(tokens()));
        store.set(None);

        assert!(store.get().is_empty());
        assert!(store.state().is_none());
        assert!(cookies.get("directus_refresh_token").is_none());
    }

    #[test]
    fn set_without_refresh_token_removes_cookie() {
        let (store, cookies) = store(StorageMode::CookiePersisted);
        store.set(Some(tokens()));
        store.set(Some(TokenSet {
            refresh_token: None,
            ..tokens()
        }));

        assert!(cookies.get("directus_refresh_token").is_none());
        assert_eq!(
            cookies.pending().last().and_then(|c| c.max_age()),
            Some(Duration::ZERO)
        );
        let current = store.get();
        assert_eq!(current.access_token.as_deref(), Some("access-1"));
        assert!(current.refresh_token.is_none());
    }

    #[test]
    fn clearing_state_only() {
        let (store, _) = store(StorageMode::StateOnly);
        store.set(Some(tokens()));
        store.set(None);
        assert!(store.get().is_empty());
    }

    #[test]
    fn cookie_max_age_follows_expires() {
        let (store, cookies) = store(StorageMode::CookiePersisted);
        store.set(Some(tokens()));
        let cookie = cookies.cookie("directus_refresh_token").unwrap();
        assert_eq!(cookie.max_age(), Some(Duration::seconds(900_000)));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(true));

        store.set(Some(TokenSet {
            expires: Some(0),
            ..tokens()
        }));
        let cookie = cookies.cookie("directus_refresh_token").unwrap();
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn empty_store_reads_all_none() {
        let (store, _) = store(StorageMode::CookiePersisted);
        assert!(store.get().is_empty());
    }
}
