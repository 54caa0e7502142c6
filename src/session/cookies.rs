use std::collections::HashMap;
use std::sync::Arc;

use cookie::Cookie;
use parking_lot::Mutex;
use time::Duration;

use super::config::CookieSettings;
use super::traits::CookieStorage;

/// Create the refresh-token cookie. `max_age: None` makes it a session cookie.
pub(super) fn refresh_cookie(
    settings: &CookieSettings,
    value: String,
    max_age: Option<Duration>,
) -> Cookie<'static> {
    let mut builder = Cookie::build((settings.refresh_token_cookie_name.clone(), value))
        .http_only(settings.http_only)
        .secure(settings.secure)
        .same_site(settings.same_site)
        .path("/");
    if let Some(max_age) = max_age {
        builder = builder.max_age(max_age);
    }
    builder.build()
}

/// Create removal cookie for the refresh token.
pub(super) fn clear_refresh_cookie(settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((settings.refresh_token_cookie_name.clone(), ""))
        .http_only(settings.http_only)
        .secure(settings.secure)
        .same_site(settings.same_site)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

fn is_removal(cookie: &Cookie<'_>) -> bool {
    cookie.max_age() == Some(Duration::ZERO)
}

/// Handle on the refresh-token cookie slot.
///
/// Every write carries the configured `HttpOnly`, `SameSite` and `Secure`
/// attributes and the max-age the handle was created with.
#[derive(Clone)]
pub struct RefreshTokenCookie {
    storage: Arc<dyn CookieStorage>,
    settings: CookieSettings,
    max_age: Option<Duration>,
}

impl RefreshTokenCookie {
    pub(super) fn new(
        storage: Arc<dyn CookieStorage>,
        settings: CookieSettings,
        max_age: Option<Duration>,
    ) -> Self {
        Self {
            storage,
            settings,
            max_age,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.refresh_token_cookie_name
    }

    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Current cookie value.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.storage.get(self.name())
    }

    /// Write `value`, or remove the cookie when `None`.
    ///
    /// Removing an absent cookie writes nothing.
    pub fn set(&self, value: Option<String>) {
        let cookie = match value {
            Some(value) => refresh_cookie(&self.settings, value, self.max_age),
            None if self.value().is_none() => return,
            None => clear_refresh_cookie(&self.settings),
        };
        self.storage.set(cookie);
    }
}

impl std::fmt::Debug for RefreshTokenCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenCookie")
            .field("name", &self.settings.refresh_token_cookie_name)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct CookieState {
    current: HashMap<String, Cookie<'static>>,
    pending: Vec<Cookie<'static>>,
}

/// In-process [`CookieStorage`]: request cookies in, `Set-Cookie` values out.
#[derive(Debug, Default)]
pub struct MemoryCookies {
    state: Mutex<CookieState>,
}

impl MemoryCookies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a request `Cookie` header. Unparseable pairs are skipped.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let current = Cookie::split_parse(header.to_owned())
            .filter_map(Result::ok)
            .map(|c| (c.name().to_owned(), c.into_owned()))
            .collect();
        Self {
            state: Mutex::new(CookieState {
                current,
                pending: Vec::new(),
            }),
        }
    }

    /// Current cookie with its attributes.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.state.lock().current.get(name).cloned()
    }

    /// Writes queued since creation or the last [`take_pending`](Self::take_pending).
    #[must_use]
    pub fn pending(&self) -> Vec<Cookie<'static>> {
        self.state.lock().pending.clone()
    }

    pub fn take_pending(&self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut self.state.lock().pending)
    }

    /// Drain queued writes as `Set-Cookie` header values.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.take_pending().iter().map(ToString::to_string).collect()
    }
}

impl CookieStorage for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .current
            .get(name)
            .map(|c| c.value().to_owned())
    }

    fn set(&self, cookie: Cookie<'static>) {
        let mut state = self.state.lock();
        if is_removal(&cookie) {
            state.current.remove(cookie.name());
        } else {
            state.current.insert(cookie.name().to_owned(), cookie.clone());
        }
        state.pending.push(cookie);
    }
}
