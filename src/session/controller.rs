use super::error::AuthFailure;
use super::state::SessionContext;
use super::store::TokenStore;
use super::traits::{AuthApi, IdentityProvider};
use super::types::{InviteParams, LoginOptions, ReadMeOptions, RequestParams};
use crate::types::{RoleId, TokenSet, UserProfile};

/// Orchestrates login, refresh, logout and account recovery for one session.
///
/// The public operations never fail: errors are logged through `tracing` and
/// collapse to `None` / `()`. The `try_*` variants return the typed
/// [`AuthFailure`] instead.
///
/// On a successful login or refresh the identity cache is refreshed before the
/// call returns, so [`user()`](Self::user) is consistent with the returned
/// tokens. Logout clears both the identity cache and the [`TokenStore`]
/// whatever the auth service answers.
pub struct SessionController<A, I> {
    api: A,
    identity: I,
    store: TokenStore,
}

impl<A: AuthApi, I: IdentityProvider> SessionController<A, I> {
    #[must_use]
    pub fn new(api: A, identity: I, store: TokenStore) -> Self {
        Self {
            api,
            identity,
            store,
        }
    }

    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        options: Option<LoginOptions>,
    ) -> Option<TokenSet> {
        contain(
            "Couldn't login user.",
            self.try_login(identifier, password, options).await,
        )
    }

    /// Log in with `options` merged over the storage-mode defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFailure`] if the auth service or the identity fetch fails.
    pub async fn try_login(
        &self,
        identifier: &str,
        password: &str,
        options: Option<LoginOptions>,
    ) -> Result<TokenSet, AuthFailure> {
        let options = LoginOptions::defaults_for(self.store.mode()).merge(options);
        tracing::debug!(mode = options.mode().as_str(), "Logging in");

        let tokens = self.api.login(identifier, password, &options).await?;
        self.sync_identity(&tokens).await?;
        Ok(tokens)
    }

    pub async fn refresh_tokens(&self) -> Option<TokenSet> {
        contain("Couldn't refresh tokens.", self.try_refresh_tokens().await)
    }

    /// # Errors
    ///
    /// Returns [`AuthFailure`] if the auth service or the identity fetch fails.
    pub async fn try_refresh_tokens(&self) -> Result<TokenSet, AuthFailure> {
        let tokens = self.api.refresh().await?;
        self.sync_identity(&tokens).await?;
        Ok(tokens)
    }

    pub async fn logout(&self) {
        contain("Couldn't logout user.", self.try_logout().await);
    }

    /// # Errors
    ///
    /// Returns [`AuthFailure`] if the auth service rejects the logout. The
    /// local session is cleared either way.
    pub async fn try_logout(&self) -> Result<(), AuthFailure> {
        let _reset = ResetOnDrop { store: &self.store };
        self.api.logout().await?;
        tracing::info!("User logged out");
        Ok(())
    }

    pub async fn password_request(
        &self,
        email: &str,
        reset_url: Option<&str>,
        params: Option<RequestParams>,
    ) {
        contain(
            "Couldn't request password reset.",
            self.try_password_request(email, reset_url, params).await,
        );
    }

    /// # Errors
    ///
    /// Returns [`AuthFailure`] if the auth service rejects the request.
    pub async fn try_password_request(
        &self,
        email: &str,
        reset_url: Option<&str>,
        params: Option<RequestParams>,
    ) -> Result<(), AuthFailure> {
        let params = params.unwrap_or_default();
        self.api
            .password_request(email, reset_url, &params.use_static_token)
            .await?;
        Ok(())
    }

    pub async fn password_reset(
        &self,
        token: &str,
        password: &str,
        params: Option<RequestParams>,
    ) {
        contain(
            "Couldn't reset password.",
            self.try_password_reset(token, password, params).await,
        );
    }

    /// # Errors
    ///
    /// Returns [`AuthFailure`] if the auth service rejects the reset.
    pub async fn try_password_reset(
        &self,
        token: &str,
        password: &str,
        params: Option<RequestParams>,
    ) -> Result<(), AuthFailure> {
        let params = params.unwrap_or_default();
        self.api
            .password_reset(token, password, &params.use_static_token)
            .await?;
        Ok(())
    }

    pub async fn invite_user(&self, email: &str, role: &RoleId, params: Option<InviteParams>) {
        contain(
            "Couldn't invite user.",
            self.try_invite_user(email, role, params).await,
        );
    }

    /// # Errors
    ///
    /// Returns [`AuthFailure`] if the auth service rejects the invite.
    pub async fn try_invite_user(
        &self,
        email: &str,
        role: &RoleId,
        params: Option<InviteParams>,
    ) -> Result<(), AuthFailure> {
        let params = params.unwrap_or_default();
        self.api
            .invite_user(
                email,
                role,
                params.invite_url.as_deref(),
                &params.use_static_token,
            )
            .await?;
        Ok(())
    }

    pub async fn accept_user_invite(
        &self,
        token: &str,
        password: &str,
        params: Option<RequestParams>,
    ) {
        contain(
            "Couldn't accept user invite.",
            self.try_accept_user_invite(token, password, params).await,
        );
    }

    /// # Errors
    ///
    /// Returns [`AuthFailure`] if the auth service rejects the invite token.
    pub async fn try_accept_user_invite(
        &self,
        token: &str,
        password: &str,
        params: Option<RequestParams>,
    ) -> Result<(), AuthFailure> {
        let params = params.unwrap_or_default();
        self.api
            .accept_user_invite(token, password, &params.use_static_token)
            .await?;
        Ok(())
    }

    /// Cached profile of the logged-in user.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.store.context().identity()
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        self.store.context()
    }

    async fn sync_identity(&self, tokens: &TokenSet) -> Result<(), AuthFailure> {
        if tokens.is_authenticated() {
            self.identity
                .read_me(ReadMeOptions {
                    use_static_token: false,
                })
                .await?;
        }
        Ok(())
    }
}

/// Clears identity and tokens when dropped, including on early return and
/// cancellation.
struct ResetOnDrop<'a> {
    store: &'a TokenStore,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.store.context().clear_identity();
        self.store.set(None);
    }
}

fn contain<T>(context: &str, result: Result<T, AuthFailure>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(failure) => {
            failure.report(context);
            None
        }
    }
}
