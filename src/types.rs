use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};

/// Credential record issued by the auth service.
///
/// Every field is optional: an all-`None` set means "no active session".
/// `expires_at` (epoch millis) and `expires` (millis until expiry) are both
/// carried through unchanged from the auth response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub expires: Option<i64>,
}

impl TokenSet {
    /// The "no active session" record.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::empty()
    }

    /// `true` when a non-empty access token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether the access token is expired at `now_ms` (epoch millis).
    ///
    /// A set without `expires_at` never expires.
    #[must_use]
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|at| now_ms >= at)
    }

    /// Whether the access token expires within `buffer_ms` of `now_ms`.
    #[must_use]
    pub fn needs_refresh_at(&self, now_ms: i64, buffer_ms: i64) -> bool {
        self.expires_at
            .is_some_and(|at| now_ms.saturating_add(buffer_ms) >= at)
    }
}

/// Directus user identifier (opaque string, usually a UUID).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, FromStr, Into,
)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Directus role identifier, assigned to invited users.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, FromStr, Into,
)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Profile of the currently authenticated user (`/users/me`).
///
/// Fields outside the common set are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<RoleId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Create a profile with only the required `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            email: None,
            first_name: None,
            last_name: None,
            role: None,
            status: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<RoleId>) -> Self {
        self.role = Some(role.into());
        self
    }
}
