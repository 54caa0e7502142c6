//! Client-side session management for Directus authentication.
//!
//! [`TokenStore`] keeps the current [`TokenSet`](crate::TokenSet): the
//! access token always in the [`SessionContext`], the refresh token either
//! there too or in a persisted cookie. [`SessionController`] drives login,
//! refresh, logout and account recovery on top of it and never lets a
//! collaborator error escape to the caller.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use directus_session::session::{MemoryCookies, SessionConfig, SessionContext, SessionController, TokenStore};
//! use directus_session::{RestClient, RestConfig};
//!
//! // 1. One context per request / app session, cookies from the host
//! let config = SessionConfig::from_env()?;
//! let cookies = Arc::new(MemoryCookies::from_header(cookie_header));
//! let store = TokenStore::new(&config, SessionContext::new(), cookies.clone());
//!
//! // 2. Wire the REST client as both auth API and identity provider
//! let client = RestClient::new(RestConfig::from_env()?, store.clone())?;
//! let session = SessionController::new(client.clone(), client, store);
//!
//! // 3. Use it
//! if let Some(tokens) = session.login("admin@example.com", "secret", None).await {
//!     println!("hello {:?}", session.user());
//! }
//! let set_cookie_headers = cookies.set_cookie_headers();
//! ```

mod config;
mod controller;
mod cookies;
mod error;
mod state;
mod store;
mod traits;
mod types;

pub use config::{SessionConfig, StorageMode};
pub use controller::SessionController;
pub use cookies::{MemoryCookies, RefreshTokenCookie};
pub use error::AuthFailure;
pub use state::SessionContext;
pub use store::TokenStore;
pub use traits::{AuthApi, CookieStorage, IdentityProvider};
pub use types::{InviteParams, LoginMode, LoginOptions, ReadMeOptions, RequestParams, StaticToken};

/// Re-export cookie attribute type for the builder API.
pub use cookie::SameSite;
