#![doc = include_str!("../README.md")]

pub mod error;
#[cfg(feature = "rest")]
pub mod rest;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use error::Error;
#[cfg(feature = "rest")]
pub use rest::{RestClient, RestConfig};
pub use session::{
    AuthApi, AuthFailure, CookieStorage, IdentityProvider, SessionConfig, SessionContext,
    SessionController, StorageMode, TokenStore,
};
pub use types::{RoleId, TokenSet, UserId, UserProfile};
