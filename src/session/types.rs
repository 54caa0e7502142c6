use serde::{Deserialize, Serialize};

use super::config::StorageMode;

/// How the auth service hands back the refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    /// Refresh token in the response body.
    Json,
    /// Refresh token in an HTTP-only cookie set by the auth service.
    Cookie,
    /// Session cookie set by the auth service, no tokens in the body.
    Session,
}

impl LoginMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Cookie => "cookie",
            Self::Session => "session",
        }
    }
}

/// Options passed to [`AuthApi::login`](super::AuthApi::login).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginOptions {
    pub mode: Option<LoginMode>,
    /// One-time password for accounts with 2FA enabled.
    pub otp: Option<String>,
}

impl LoginOptions {
    #[must_use]
    pub fn with_mode(mut self, mode: LoginMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_otp(mut self, otp: impl Into<String>) -> Self {
        self.otp = Some(otp.into());
        self
    }

    /// Defaults for a store in `mode`: when this crate persists the refresh
    /// token itself it asks for it in the body (`json`), otherwise it leaves
    /// persistence to the auth service's own cookie (`cookie`).
    #[must_use]
    pub fn defaults_for(mode: StorageMode) -> Self {
        let mode = match mode {
            StorageMode::CookiePersisted => LoginMode::Json,
            StorageMode::StateOnly => LoginMode::Cookie,
        };
        Self::default().with_mode(mode)
    }

    /// Shallow merge: every field set in `overrides` replaces the field in
    /// `self`, unset fields keep `self`'s value.
    #[must_use]
    pub fn merge(self, overrides: Option<LoginOptions>) -> Self {
        let Some(overrides) = overrides else {
            return self;
        };
        Self {
            mode: overrides.mode.or(self.mode),
            otp: overrides.otp.or(self.otp),
        }
    }

    /// Effective mode, `json` when unset.
    #[must_use]
    pub fn mode(&self) -> LoginMode {
        self.mode.unwrap_or(LoginMode::Json)
    }
}

/// Credential a request-style operation is sent with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StaticToken {
    /// The session's access token.
    #[default]
    Disabled,
    /// The static token from the client configuration.
    Configured,
    /// This token.
    Explicit(String),
}

impl From<bool> for StaticToken {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Configured
        } else {
            Self::Disabled
        }
    }
}

impl From<&str> for StaticToken {
    fn from(token: &str) -> Self {
        Self::Explicit(token.to_owned())
    }
}

impl From<String> for StaticToken {
    fn from(token: String) -> Self {
        Self::Explicit(token)
    }
}

/// Per-call parameters for password and invite operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub use_static_token: StaticToken,
}

impl RequestParams {
    #[must_use]
    pub fn with_static_token(token: impl Into<StaticToken>) -> Self {
        Self {
            use_static_token: token.into(),
        }
    }
}

/// Per-call parameters for [`invite_user`](super::SessionController::invite_user).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InviteParams {
    pub use_static_token: StaticToken,
    /// Custom invite-acceptance page.
    pub invite_url: Option<String>,
}

impl InviteParams {
    #[must_use]
    pub fn with_invite_url(mut self, url: impl Into<String>) -> Self {
        self.invite_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_static_token(mut self, token: impl Into<StaticToken>) -> Self {
        self.use_static_token = token.into();
        self
    }
}

/// Options for [`IdentityProvider::read_me`](super::IdentityProvider::read_me).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadMeOptions {
    /// Authenticate with the configured static token instead of the session.
    pub use_static_token: bool,
}
