use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::session::{
    AuthApi, IdentityProvider, LoginMode, LoginOptions, ReadMeOptions, StaticToken, TokenStore,
};
use crate::types::{RoleId, TokenSet, UserProfile};

/// Directus REST connection settings.
///
/// ```rust,ignore
/// use directus_session::RestConfig;
///
/// let config = RestConfig::new("https://cms.example.com".parse()?)
///     .with_static_token("server-side-token");
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct RestConfig {
    pub(crate) base_url: Url,
    pub(crate) static_token: Option<String>,
}

impl RestConfig {
    /// Create a config for the Directus instance at `base_url`.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            static_token: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `DIRECTUS_URL`: base URL of the Directus instance
    ///
    /// # Optional env vars
    /// - `DIRECTUS_STATIC_TOKEN`: token used when a call asks for the static token
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `DIRECTUS_URL` is missing or not a valid URL.
    pub fn from_env() -> Result<Self, Error> {
        let url_str = std::env::var("DIRECTUS_URL")
            .map_err(|_| Error::Config("DIRECTUS_URL is required".into()))?;
        let base_url: Url = url_str
            .parse()
            .map_err(|e| Error::Config(format!("DIRECTUS_URL: {e}")))?;

        let mut config = Self::new(base_url);
        if let Ok(token) = std::env::var("DIRECTUS_STATIC_TOKEN") {
            if !token.is_empty() {
                config = config.with_static_token(token);
            }
        }
        Ok(config)
    }

    /// Token sent when a call selects [`StaticToken::Configured`].
    #[must_use]
    pub fn with_static_token(mut self, token: impl Into<String>) -> Self {
        self.static_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn static_token(&self) -> Option<&str> {
        self.static_token.as_deref()
    }
}

impl std::fmt::Debug for RestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConfig")
            .field("base_url", &self.base_url.as_str())
            .field("static_token", &self.static_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// HTTP implementation of [`AuthApi`] and [`IdentityProvider`] for Directus.
///
/// Login and refresh write the issued tokens into the [`TokenStore`];
/// logout clears it. Profiles fetched by `read_me` land in the store's
/// [`SessionContext`](crate::session::SessionContext). The HTTP client keeps
/// a cookie store so `cookie`-mode refresh tokens and `session`-mode session
/// cookies set by Directus are sent back on refresh and logout.
///
/// Clones share the HTTP client and the mode of the last successful login.
#[derive(Clone)]
pub struct RestClient {
    config: RestConfig,
    http: reqwest::Client,
    store: TokenStore,
    login_mode: Arc<Mutex<Option<LoginMode>>>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct AuthPayload {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires: Option<i64>,
}

impl AuthPayload {
    fn into_token_set(self, now_ms: i64) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires.map(|expires| now_ms.saturating_add(expires)),
            expires: self.expires,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Deserialize)]
struct ErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
    mode: LoginMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    otp: Option<&'a str>,
}

#[derive(Serialize)]
struct RefreshBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    mode: LoginMode,
}

impl RefreshBody {
    /// A `session` login is continued in `session` mode. Otherwise send the
    /// stored refresh token when there is one, or rely on the cookie Directus
    /// set at login.
    fn new(store: &TokenStore, login_mode: Option<LoginMode>) -> Self {
        if login_mode == Some(LoginMode::Session) {
            return Self {
                refresh_token: None,
                mode: LoginMode::Session,
            };
        }
        match store.get().refresh_token {
            Some(token) => Self {
                refresh_token: Some(token),
                mode: LoginMode::Json,
            },
            None => Self {
                refresh_token: None,
                mode: LoginMode::Cookie,
            },
        }
    }
}

#[derive(Serialize)]
struct PasswordRequestBody<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_url: Option<&'a str>,
}

#[derive(Serialize)]
struct TokenPasswordBody<'a> {
    token: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct InviteBody<'a> {
    email: &'a str,
    role: &'a RoleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    invite_url: Option<&'a str>,
}

impl RestClient {
    /// Create a client bound to one session's token store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: RestConfig, store: TokenStore) -> Result<Self, Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            config,
            http,
            store,
            login_mode: Arc::default(),
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Mode of the last successful login, cleared by logout.
    #[must_use]
    pub fn login_mode(&self) -> Option<LoginMode> {
        *self.login_mode.lock()
    }

    fn refresh_body(&self) -> RefreshBody {
        RefreshBody::new(&self.store, self.login_mode())
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint {path}: {e}")))
    }

    /// Bearer token for a request made with `static_token`.
    fn bearer(&self, static_token: &StaticToken) -> Option<String> {
        match static_token {
            StaticToken::Disabled => self.store.get().access_token,
            StaticToken::Configured => self.config.static_token.clone(),
            StaticToken::Explicit(token) => Some(token.clone()),
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<String>,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        let mut request = self.http.post(self.endpoint(path)?).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        Self::ensure_success(response, operation).await
    }

    async fn issue_tokens(
        &self,
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<TokenSet, Error> {
        let payload = response.json::<Envelope<AuthPayload>>().await?.data;
        let tokens = payload.into_token_set(now_ms());
        self.store.set(Some(tokens.clone()));
        tracing::debug!(operation, expires = ?tokens.expires, "Stored issued tokens");
        Ok(tokens)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(parse_error_body(operation, status, &body))
    }
}

fn parse_error_body(operation: &'static str, status: u16, body: &str) -> Error {
    let first = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next());
    let (message, code) = match first {
        Some(entry) => (entry.message, entry.extensions.and_then(|ext| ext.code)),
        None => (None, None),
    };
    tracing::debug!(operation, status, code = ?code, "Directus request failed");
    Error::Api {
        operation,
        status: Some(status),
        message,
        code,
    }
}

fn now_ms() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

impl AuthApi for RestClient {
    async fn login(
        &self,
        identifier: &str,
        password: &str,
        options: &LoginOptions,
    ) -> Result<TokenSet, Error> {
        let body = LoginBody {
            email: identifier,
            password,
            mode: options.mode(),
            otp: options.otp.as_deref(),
        };
        let response = self.post("auth/login", &body, None, "login").await?;
        let tokens = self.issue_tokens(response, "login").await?;
        *self.login_mode.lock() = Some(body.mode);
        Ok(tokens)
    }

    async fn refresh(&self) -> Result<TokenSet, Error> {
        let body = self.refresh_body();
        let response = self.post("auth/refresh", &body, None, "refresh").await?;
        self.issue_tokens(response, "refresh").await
    }

    async fn logout(&self) -> Result<(), Error> {
        let body = self.refresh_body();
        let result = self.post("auth/logout", &body, None, "logout").await;
        *self.login_mode.lock() = None;
        result?;
        self.store.set(None);
        Ok(())
    }

    async fn password_request(
        &self,
        email: &str,
        reset_url: Option<&str>,
        static_token: &StaticToken,
    ) -> Result<(), Error> {
        let body = PasswordRequestBody { email, reset_url };
        self.post(
            "auth/password/request",
            &body,
            self.bearer(static_token),
            "password request",
        )
        .await?;
        Ok(())
    }

    async fn password_reset(
        &self,
        token: &str,
        password: &str,
        static_token: &StaticToken,
    ) -> Result<(), Error> {
        let body = TokenPasswordBody { token, password };
        self.post(
            "auth/password/reset",
            &body,
            self.bearer(static_token),
            "password reset",
        )
        .await?;
        Ok(())
    }

    async fn invite_user(
        &self,
        email: &str,
        role: &RoleId,
        invite_url: Option<&str>,
        static_token: &StaticToken,
    ) -> Result<(), Error> {
        let body = InviteBody {
            email,
            role,
            invite_url,
        };
        self.post("users/invite", &body, self.bearer(static_token), "invite")
            .await?;
        Ok(())
    }

    async fn accept_user_invite(
        &self,
        token: &str,
        password: &str,
        static_token: &StaticToken,
    ) -> Result<(), Error> {
        let body = TokenPasswordBody { token, password };
        self.post(
            "users/invite/accept",
            &body,
            self.bearer(static_token),
            "accept invite",
        )
        .await?;
        Ok(())
    }
}

impl IdentityProvider for RestClient {
    async fn read_me(&self, options: ReadMeOptions) -> Result<(), Error> {
        let bearer = self.bearer(&StaticToken::from(options.use_static_token));
        let mut request = self.http.get(self.endpoint("users/me")?);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = Self::ensure_success(request.send().await?, "read me").await?;
        let profile = response.json::<Envelope<UserProfile>>().await?.data;
        tracing::debug!(user_id = %profile.id, "Fetched current user");
        self.store.context().set_identity(Some(profile));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::{MemoryCookies, SessionConfig, SessionContext, StorageMode};

    fn client(mode: StorageMode) -> RestClient {
        let config = SessionConfig::new().with_storage_mode(mode);
        let store = TokenStore::new(&config, SessionContext::new(), Arc::new(MemoryCookies::new()));
        RestClient::new(
            RestConfig::new("https://cms.example.com/api".parse().unwrap())
                .with_static_token("static-1"),
            store,
        )
        .unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = RestConfig::new("https://cms.example.com/api".parse().unwrap());
        assert_eq!(config.base_url().as_str(), "https://cms.example.com/api/");

        let config = RestConfig::new("https://cms.example.com".parse().unwrap());
        assert_eq!(config.base_url().as_str(), "https://cms.example.com/");
    }

    #[test]
    fn endpoints_join_under_base_path() {
        let client = client(StorageMode::StateOnly);
        assert_eq!(
            client.endpoint("auth/login").unwrap().as_str(),
            "https://cms.example.com/api/auth/login"
        );
    }

    #[test]
    fn config_debug_redacts_static_token() {
        let config = RestConfig::new("https://cms.example.com".parse().unwrap())
            .with_static_token("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn bearer_selection() {
        let client = client(StorageMode::StateOnly);
        assert_eq!(client.bearer(&StaticToken::Disabled), None);

        client.store().set(Some(TokenSet {
            access_token: Some("access-1".into()),
            ..TokenSet::default()
        }));
        assert_eq!(client.bearer(&StaticToken::Disabled).as_deref(), Some("access-1"));
        assert_eq!(client.bearer(&StaticToken::Configured).as_deref(), Some("static-1"));
        assert_eq!(
            client.bearer(&StaticToken::Explicit("other".into())).as_deref(),
            Some("other")
        );
    }

    #[test]
    fn refresh_body_depends_on_known_refresh_token() {
        let client = client(StorageMode::StateOnly);
        let body = serde_json::to_value(client.refresh_body()).unwrap();
        assert_eq!(body, serde_json::json!({ "mode": "cookie" }));

        client.store().set(Some(TokenSet {
            refresh_token: Some("refresh-1".into()),
            ..TokenSet::default()
        }));
        let body = serde_json::to_value(client.refresh_body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "refresh_token": "refresh-1", "mode": "json" })
        );
    }

    #[test]
    fn session_login_is_refreshed_in_session_mode() {
        let client = client(StorageMode::CookiePersisted);
        client.store().set(Some(TokenSet {
            refresh_token: Some("refresh-1".into()),
            ..TokenSet::default()
        }));
        *client.login_mode.lock() = Some(LoginMode::Session);

        let body = serde_json::to_value(client.refresh_body()).unwrap();
        assert_eq!(body, serde_json::json!({ "mode": "session" }));
    }

    #[test]
    fn custom_http_client_keeps_config_and_store() {
        let client = client(StorageMode::StateOnly).with_http_client(reqwest::Client::new());
        assert_eq!(client.config().static_token(), Some("static-1"));
        assert_eq!(client.store().mode(), StorageMode::StateOnly);
        assert!(client.login_mode().is_none());
    }

    #[test]
    fn auth_payload_computes_expires_at() {
        let payload: Envelope<AuthPayload> = serde_json::from_str(
            r#"{"data":{"access_token":"a","refresh_token":"r","expires":900000}}"#,
        )
        .unwrap();
        let tokens = payload.data.into_token_set(1_000);
        assert_eq!(tokens.access_token.as_deref(), Some("a"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("r"));
        assert_eq!(tokens.expires, Some(900_000));
        assert_eq!(tokens.expires_at, Some(901_000));
    }

    #[test]
    fn error_body_first_entry_wins() {
        let body = r#"{"errors":[
            {"message":"Invalid user credentials.","extensions":{"code":"INVALID_CREDENTIALS"}},
            {"message":"second"}
        ]}"#;
        match parse_error_body("login", 401, body) {
            Error::Api {
                operation,
                status,
                message,
                code,
            } => {
                assert_eq!(operation, "login");
                assert_eq!(status, Some(401));
                assert_eq!(message.as_deref(), Some("Invalid user credentials."));
                assert_eq!(code.as_deref(), Some("INVALID_CREDENTIALS"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_body_not_json_has_no_message() {
        let err = parse_error_body("refresh", 502, "Bad Gateway");
        assert!(err.message().is_none());
    }
}
