use std::future::Future;

use cookie::Cookie;

use super::types::{LoginOptions, ReadMeOptions, StaticToken};
use crate::error::Error;
use crate::types::{RoleId, TokenSet};

/// Remote authentication service.
///
/// Implementations that issue credentials (`login`, `refresh`) are expected
/// to write the new [`TokenSet`] into the session's
/// [`TokenStore`](super::TokenStore) before returning, and `logout` to clear
/// it. [`RestClient`](crate::RestClient) is the HTTP implementation.
///
/// # Example
///
/// ```rust,ignore
/// impl AuthApi for MyBackend {
///     async fn login(
///         &self,
///         identifier: &str,
///         password: &str,
///         options: &LoginOptions,
///     ) -> Result<TokenSet, Error> {
///         let tokens = self.remote.login(identifier, password, options.mode()).await?;
///         self.store.set(Some(tokens.clone()));
///         Ok(tokens)
///     }
///     // ...
/// }
/// ```
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token set.
    fn login(
        &self,
        identifier: &str,
        password: &str,
        options: &LoginOptions,
    ) -> impl Future<Output = Result<TokenSet, Error>> + Send;

    /// Mint a new token set from the stored refresh token.
    fn refresh(&self) -> impl Future<Output = Result<TokenSet, Error>> + Send;

    /// Invalidate the current refresh token.
    fn logout(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Send a password-reset email, optionally pointing at `reset_url`.
    fn password_request(
        &self,
        email: &str,
        reset_url: Option<&str>,
        static_token: &StaticToken,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Set a new password using a token issued by [`password_request`](Self::password_request).
    fn password_reset(
        &self,
        token: &str,
        password: &str,
        static_token: &StaticToken,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Invite `email` into `role`, optionally pointing at `invite_url`.
    fn invite_user(
        &self,
        email: &str,
        role: &RoleId,
        invite_url: Option<&str>,
        static_token: &StaticToken,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Complete an invitation by setting the invited account's password.
    fn accept_user_invite(
        &self,
        token: &str,
        password: &str,
        static_token: &StaticToken,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Source of the current user's profile.
///
/// `read_me` always performs a live fetch and writes the result into the
/// session's identity cache.
pub trait IdentityProvider: Send + Sync {
    fn read_me(&self, options: ReadMeOptions) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Host-provided cookie plumbing for one request/response cycle.
///
/// `set` receives a fully built cookie; a cookie whose max-age is zero is a
/// removal. [`MemoryCookies`](super::MemoryCookies) is an in-process
/// implementation.
pub trait CookieStorage: Send + Sync {
    /// Current value of the named cookie.
    fn get(&self, name: &str) -> Option<String>;

    /// Queue a cookie write.
    fn set(&self, cookie: Cookie<'static>);
}
