use cookie::SameSite;

use crate::error::Error;

/// Where the refresh token lives between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Refresh token is kept in a persisted cookie owned by this crate.
    CookiePersisted,
    /// Refresh token is kept next to the access token in session state only.
    #[default]
    StateOnly,
}

/// Cookie settings shared by the token store and its refresh-token handle.
#[derive(Debug, Clone)]
pub(crate) struct CookieSettings {
    pub(crate) refresh_token_cookie_name: String,
    pub(crate) http_only: bool,
    pub(crate) same_site: SameSite,
    pub(crate) secure: bool,
}

impl CookieSettings {
    fn defaults() -> Self {
        Self {
            refresh_token_cookie_name: "directus_refresh_token".into(),
            http_only: false,
            same_site: SameSite::Lax,
            secure: false,
        }
    }
}

/// Session storage configuration.
///
/// Read once when the [`TokenStore`](super::TokenStore) is built; changing it
/// afterwards has no effect on existing stores.
///
/// Use [`from_env()`](SessionConfig::from_env) for convention-based setup,
/// or [`new()`](SessionConfig::new) with `with_*` methods for full control.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub(crate) storage_mode: StorageMode,
    pub(crate) cookies: CookieSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    /// State-only storage, `directus_refresh_token` cookie name,
    /// `SameSite=Lax`, neither `HttpOnly` nor `Secure`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            cookies: CookieSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `DIRECTUS_USE_COOKIES`: `"1"`/`"true"` keeps the refresh token in a persisted cookie
    /// - `DIRECTUS_REFRESH_TOKEN_COOKIE_NAME`: cookie name override
    /// - `DIRECTUS_COOKIE_HTTP_ONLY`: `"1"`/`"true"` marks the cookie `HttpOnly`
    /// - `DIRECTUS_COOKIE_SAME_SITE`: `strict`, `lax` or `none`
    /// - `DIRECTUS_COOKIE_SECURE`: `"1"`/`"true"` marks the cookie `Secure`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value cannot be parsed.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::new();

        if let Some(value) = lookup("DIRECTUS_USE_COOKIES") {
            config = config.with_cookie_persistence(parse_flag("DIRECTUS_USE_COOKIES", &value)?);
        }
        if let Some(name) = lookup("DIRECTUS_REFRESH_TOKEN_COOKIE_NAME") {
            if name.trim().is_empty() {
                return Err(Error::Config(
                    "DIRECTUS_REFRESH_TOKEN_COOKIE_NAME must not be empty".into(),
                ));
            }
            config = config.with_refresh_token_cookie_name(name.trim());
        }
        if let Some(value) = lookup("DIRECTUS_COOKIE_HTTP_ONLY") {
            config = config.with_http_only(parse_flag("DIRECTUS_COOKIE_HTTP_ONLY", &value)?);
        }
        if let Some(value) = lookup("DIRECTUS_COOKIE_SAME_SITE") {
            config = config.with_same_site(parse_same_site(&value)?);
        }
        if let Some(value) = lookup("DIRECTUS_COOKIE_SECURE") {
            config = config.with_secure(parse_flag("DIRECTUS_COOKIE_SECURE", &value)?);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// `true` selects [`StorageMode::CookiePersisted`], `false` [`StorageMode::StateOnly`].
    #[must_use]
    pub fn with_cookie_persistence(self, enabled: bool) -> Self {
        self.with_storage_mode(if enabled {
            StorageMode::CookiePersisted
        } else {
            StorageMode::StateOnly
        })
    }

    #[must_use]
    pub fn with_refresh_token_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookies.refresh_token_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookies.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookies.same_site = same_site;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookies.secure = secure;
        self
    }

    #[must_use]
    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    #[must_use]
    pub fn refresh_token_cookie_name(&self) -> &str {
        &self.cookies.refresh_token_cookie_name
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(Error::Config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

fn parse_same_site(value: &str) -> Result<SameSite, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" => Ok(SameSite::None),
        other => Err(Error::Config(format!(
            "DIRECTUS_COOKIE_SAME_SITE: expected strict, lax or none, got '{other}'"
        ))),
    }
}
