//! Delegated login over the authorization-code grant.
//!
//! A login attempt moves through
//! `Idle → AwaitingCallback → Exchanging → ResolvingIdentity → Issued`.
//! Each transition is a method that consumes the previous step's output, so
//! steps cannot be skipped or reordered. Any failure is terminal and reported
//! as a [`FlowError`] naming the stage it happened in.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use thiserror::Error;
use tracing::{info, warn};

use super::AuthError;
use super::jwt::TokenIssuer;
use super::provider::{AccessCredential, IdentityProvider};
use super::resolver::{Resolution, resolve_by_email};
use super::store::UserStore;
use crate::models::auth::{ExternalProfile, User};

/// Random bytes in an anti-forgery state value.
const STATE_BYTES: usize = 24;

/// Stages of a delegated login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Idle,
    AwaitingCallback,
    Exchanging,
    ResolvingIdentity,
    Issued,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginStage::Idle => "idle",
            LoginStage::AwaitingCallback => "awaiting_callback",
            LoginStage::Exchanging => "exchanging",
            LoginStage::ResolvingIdentity => "resolving_identity",
            LoginStage::Issued => "issued",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a login attempt.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("anti-forgery state mismatch")]
    StateMismatch,

    #[error("authorization code missing")]
    MissingCode,

    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    #[error("identity resolution failed: {0}")]
    ResolveFailed(#[source] AuthError),
}

impl FlowError {
    /// Stage the attempt was in when it failed.
    pub fn stage(&self) -> LoginStage {
        match self {
            FlowError::StateMismatch | FlowError::MissingCode => LoginStage::AwaitingCallback,
            FlowError::ExchangeFailed(_) => LoginStage::Exchanging,
            FlowError::ProfileFetchFailed(_) | FlowError::ResolveFailed(_) => {
                LoginStage::ResolvingIdentity
            }
        }
    }
}

/// Generate an anti-forgery state value (URL-safe, unpadded).
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Output of `Idle → AwaitingCallback`: the state to bind to the browser and
/// where to send it.
#[derive(Debug, Clone)]
pub struct LoginInitiation {
    pub state: String,
    pub redirect_url: String,
}

/// Parameters received on the provider callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams<'a> {
    /// `state` query parameter echoed by the provider.
    pub received_state: Option<&'a str>,
    /// State value read back from the browser's cookie.
    pub cookie_state: Option<&'a str>,
    /// Authorization code.
    pub code: Option<&'a str>,
}

/// A callback whose state matched; only constructible by
/// [`DelegatedLogin::verify_callback`].
#[derive(Debug)]
pub struct VerifiedCallback {
    code: String,
}

/// Output of `ResolvingIdentity → Issued`.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub user: User,
    /// Whether the user was created by this login.
    pub created: bool,
}

/// Drives one delegated login attempt against a provider, a user store and
/// a token issuer.
pub struct DelegatedLogin<'a> {
    provider: &'a dyn IdentityProvider,
    store: &'a dyn UserStore,
    tokens: &'a TokenIssuer,
}

impl<'a> DelegatedLogin<'a> {
    pub fn new(
        provider: &'a dyn IdentityProvider,
        store: &'a dyn UserStore,
        tokens: &'a TokenIssuer,
    ) -> Self {
        Self {
            provider,
            store,
            tokens,
        }
    }

    /// `Idle → AwaitingCallback`. Always succeeds.
    pub fn initiate(&self) -> LoginInitiation {
        let state = generate_state();
        let redirect_url = self.provider.authorization_url(&state);
        LoginInitiation {
            state,
            redirect_url,
        }
    }

    /// Check the callback against the state bound to this browser.
    ///
    /// An absent or empty cookie is a mismatch. State is checked before the
    /// code.
    pub fn verify_callback(params: &CallbackParams<'_>) -> Result<VerifiedCallback, FlowError> {
        let cookie = params
            .cookie_state
            .filter(|s| !s.is_empty())
            .ok_or(FlowError::StateMismatch)?;
        let received = params.received_state.ok_or(FlowError::StateMismatch)?;
        if !constant_time_eq(received.as_bytes(), cookie.as_bytes()) {
            return Err(FlowError::StateMismatch);
        }

        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(FlowError::MissingCode)?;
        Ok(VerifiedCallback {
            code: code.to_string(),
        })
    }

    /// `Exchanging`: redeem the code for an access credential.
    pub async fn exchange(&self, callback: VerifiedCallback) -> Result<AccessCredential, FlowError> {
        self.provider
            .exchange_code(&callback.code)
            .await
            .map_err(|e| FlowError::ExchangeFailed(e.to_string()))
    }

    /// Fetch the external profile with the access credential.
    pub async fn fetch_profile(
        &self,
        credential: &AccessCredential,
    ) -> Result<ExternalProfile, FlowError> {
        let profile = self
            .provider
            .fetch_profile(credential)
            .await
            .map_err(|e| FlowError::ProfileFetchFailed(e.to_string()))?;
        if profile.email.is_empty() {
            return Err(FlowError::ProfileFetchFailed(
                "profile has no email".into(),
            ));
        }
        Ok(profile)
    }

    /// `ResolvingIdentity → Issued`: map the profile to a local user and issue
    /// a session token for it.
    pub async fn resolve_and_issue(
        &self,
        profile: ExternalProfile,
    ) -> Result<IssuedSession, FlowError> {
        let resolution = resolve_by_email(
            self.store,
            &profile.email,
            &profile.given_name,
            &profile.family_name,
        )
        .await
        .map_err(FlowError::ResolveFailed)?;

        let created = matches!(resolution, Resolution::Created(_));
        let user = resolution.into_user();
        let token = self
            .tokens
            .issue(user.id, user.role)
            .map_err(FlowError::ResolveFailed)?;

        Ok(IssuedSession {
            token,
            user,
            created,
        })
    }

    /// Run the callback half of the flow in order.
    pub async fn complete(&self, params: &CallbackParams<'_>) -> Result<IssuedSession, FlowError> {
        let result = self.run(params).await;
        match &result {
            Ok(session) => info!(
                user_id = %session.user.id,
                created = session.created,
                stage = %LoginStage::Issued,
                "delegated login succeeded"
            ),
            Err(e) => warn!(stage = %e.stage(), "delegated login failed: {e}"),
        }
        result
    }

    async fn run(&self, params: &CallbackParams<'_>) -> Result<IssuedSession, FlowError> {
        let callback = Self::verify_callback(params)?;
        let credential = self.exchange(callback).await?;
        let profile = self.fetch_profile(&credential).await?;
        self.resolve_and_issue(profile).await
    }
}

/// Compare two byte strings without short-circuiting on the first
/// difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
