//! Accounts, login sessions and CSRF tokens.

use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};
use validator::ValidateEmail;

use crate::application::services::password::{hash_password, validate_password, verify_password};
use crate::domain::entities::{AuthProvider, NewSession, NewUser, Role, User};
use crate::domain::repositories::{SessionRepository, UserRepository};
use crate::error::AppError;
use crate::infrastructure::oauth::OAuthIdentity;

type HmacSha256 = Hmac<Sha256>;

const SESSION_TOKEN_BYTES: usize = 32;
const CSRF_NONCE_BYTES: usize = 18;

#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HMAC key for session token hashes and CSRF signatures.
    pub session_secret: String,
    pub session_ttl: Duration,
    /// Link quota given to new accounts.
    pub default_link_limit: i32,
}

/// A freshly created session. `token` goes into the `sid` cookie and is
/// never stored.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// An authenticated request's user and raw session token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

/// Service for account and session management.
///
/// Session tokens are hashed with HMAC-SHA256 (keyed by the session secret)
/// before storage and lookup, so a database dump alone does not yield usable
/// cookies.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    settings: AuthSettings,
}

fn random_token(bytes: usize) -> Result<String, AppError> {
    let mut buffer = vec![0u8; bytes];
    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal("Random generator failure", json!({ "reason": e.to_string() }))
    })?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials", json!({}))
}

fn account_blocked() -> AppError {
    AppError::unauthorized("Account is blocked", json!({}))
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(AppError::bad_request(
            "Invalid email address",
            json!({ "email": email }),
        ));
    }
    Ok(email)
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            sessions,
            settings,
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.settings.session_secret.as_bytes())
            .expect("HMAC accepts any key length")
    }

    /// Hex HMAC-SHA256 of a session token.
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac = self.mac();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn start_session(&self, user: User) -> Result<SessionGrant, AppError> {
        let token = random_token(SESSION_TOKEN_BYTES)?;
        let expires_at = Utc::now() + self.settings.session_ttl;

        self.sessions
            .create(NewSession {
                token_hash: self.hash_token(&token),
                user_id: user.id,
                expires_at,
            })
            .await?;

        Ok(SessionGrant {
            user,
            token,
            expires_at,
        })
    }

    /// Creates a local account with the `USER` role.
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] for a malformed email or a password outside
    /// 8-128 characters, [`AppError::Conflict`] if the email is registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        self.create_user(email, password, Role::User).await
    }

    /// Creates a local account with an explicit role. Used by the admin CLI.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let email = normalize_email(email)?;
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(email_taken(&email));
        }

        let new_user = NewUser {
            email: email.clone(),
            password_hash: Some(hash_password(password)?),
            provider: AuthProvider::Local,
            role,
            link_limit: self.settings.default_link_limit,
        };

        let user = match self.users.create(new_user).await {
            Err(AppError::Conflict { .. }) => return Err(email_taken(&email)),
            other => other?,
        };

        info!(user_id = user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Verifies credentials and opens a session.
    ///
    /// Unknown emails, accounts without a password and wrong passwords all
    /// produce the same [`AppError::Unauthorized`].
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionGrant, AppError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("Login failed: unknown email");
            return Err(invalid_credentials());
        };

        let Some(hash) = user.password_hash.as_deref() else {
            warn!(user_id = user.id, "Login failed: account has no password");
            return Err(invalid_credentials());
        };

        if !verify_password(password, hash)? {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(invalid_credentials());
        }

        if user.is_blocked {
            warn!(user_id = user.id, "Login refused: account blocked");
            return Err(account_blocked());
        }

        let grant = self.start_session(user).await?;
        info!(user_id = grant.user.id, "User logged in");
        Ok(grant)
    }

    /// Signs in with an external identity, creating the account on first use.
    pub async fn login_oauth(&self, identity: &OAuthIdentity) -> Result<SessionGrant, AppError> {
        let email = normalize_email(&identity.email)?;

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                let user = self
                    .users
                    .create(NewUser {
                        email,
                        password_hash: None,
                        provider: AuthProvider::Google,
                        role: Role::User,
                        link_limit: self.settings.default_link_limit,
                    })
                    .await?;
                info!(user_id = user.id, "User registered via Google");
                user
            }
        };

        if user.is_blocked {
            return Err(account_blocked());
        }

        self.start_session(user).await
    }

    /// Deletes the session behind `token`. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.sessions
            .delete_by_token_hash(&self.hash_token(token))
            .await?;
        Ok(())
    }

    /// Resolves a session token to its user.
    ///
    /// # Errors
    ///
    /// [`AppError::Unauthorized`] when the session is unknown or expired, the
    /// user no longer exists, or the user is blocked.
    pub async fn authenticate(&self, token: &str) -> Result<Authenticated, AppError> {
        let token_hash = self.hash_token(token);

        let session = self
            .sessions
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::unauthorized("Not authenticated", json!({})))?;

        if session.is_expired() {
            self.sessions.delete_by_token_hash(&token_hash).await?;
            return Err(AppError::unauthorized(
                "Session expired",
                json!({ "reason": "expired" }),
            ));
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Not authenticated", json!({})))?;

        if user.is_blocked {
            return Err(account_blocked());
        }

        Ok(Authenticated {
            user,
            token: token.to_string(),
        })
    }

    /// Changes a local account's password and signs out its other sessions.
    ///
    /// `current_token` is the caller's session, which stays valid.
    pub async fn change_password(
        &self,
        user: &User,
        current_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::bad_request(
                "Account uses external sign-in and has no password",
                json!({ "provider": user.provider.as_str() }),
            ));
        };

        if !verify_password(current_password, hash)? {
            return Err(AppError::unauthorized("Current password is incorrect", json!({})));
        }

        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        if !self.users.set_password_hash(user.id, &new_hash).await? {
            return Err(AppError::not_found("User not found", json!({ "id": user.id })));
        }

        let revoked = self
            .sessions
            .delete_for_user(user.id, Some(self.hash_token(current_token)))
            .await?;

        info!(user_id = user.id, revoked, "Password changed");
        Ok(())
    }

    /// Deletes sessions past their expiry.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        self.sessions.delete_expired(Utc::now()).await
    }

    /// Issues a CSRF token of the form `nonce.signature`.
    pub fn issue_csrf_token(&self) -> Result<String, AppError> {
        let nonce = random_token(CSRF_NONCE_BYTES)?;
        let mut mac = self.mac();
        mac.update(nonce.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{nonce}.{signature}"))
    }

    /// Double-submit check: the header must equal the cookie, and the cookie
    /// must carry a valid signature.
    pub fn verify_csrf(&self, cookie: Option<&str>, header: Option<&str>) -> Result<(), AppError> {
        let rejected = |reason: &str| {
            AppError::forbidden("Invalid CSRF token", json!({ "reason": reason }))
        };

        let (Some(cookie), Some(header)) = (cookie, header) else {
            return Err(rejected("missing"));
        };

        if cookie != header {
            return Err(rejected("mismatch"));
        }

        let (nonce, signature) = cookie.split_once('.').ok_or_else(|| rejected("malformed"))?;
        let signature = hex::decode(signature).map_err(|_| rejected("malformed"))?;

        let mut mac = self.mac();
        mac.update(nonce.as_bytes());
        mac.verify_slice(&signature).map_err(|_| rejected("signature"))
    }
}

fn email_taken(email: &str) -> AppError {
    AppError::conflict("Email is already registered", json!({ "email": email }))
}
