//! Registration, sign-in sessions and profile editing.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use metrics::counter;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{
    CreateSessionParams, CreateUserParams, RepoError, SessionsRepo, UpdateProfileParams,
    UsersRepo,
};
use crate::domain::accounts::{
    validate_email, validate_name, validate_new_password, validate_username,
};
use crate::domain::entities::UserRecord;
use crate::domain::error::FieldErrors;

pub const SESSION_TOKEN_PREFIX: &str = "ss";
const MIN_SECRET_LEN: usize = 32;

pub const METRIC_SIGN_IN_TOTAL: &str = "blogicum_sign_in_total";
pub const METRIC_SIGN_IN_FAILED_TOTAL: &str = "blogicum_sign_in_failed_total";

const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("account form is invalid")]
    Invalid(FieldErrors),
    #[error("username or password is incorrect")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("user not found")]
    NotFound,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session token")]
    Invalid,
    #[error("expired session")]
    Expired,
    #[error("session store unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileCommand {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: UserRecord,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
    session_lifetime: Duration,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        sessions: Arc<dyn SessionsRepo>,
        session_lifetime: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_lifetime,
        }
    }

    pub async fn register(&self, cmd: RegisterCommand) -> Result<UserRecord, AccountError> {
        let mut errors = FieldErrors::new();
        let username = validate_username(&cmd.username).unwrap_or_else(|err| {
            errors.extend_from(err);
            String::new()
        });
        let email = validate_email(&cmd.email).unwrap_or_else(|err| {
            errors.extend_from(err);
            String::new()
        });
        if let Err(err) = validate_new_password(&cmd.password1, &cmd.password2) {
            errors.extend_from(err);
        }
        if !username.is_empty() && self.users.find_by_username(&username).await?.is_some() {
            errors.push("username", DUPLICATE_USERNAME);
        }
        if !errors.is_empty() {
            return Err(AccountError::Invalid(errors));
        }

        let password_hash = hash_password(&cmd.password1)?;
        let user = self
            .users
            .create_user(CreateUserParams {
                username,
                email,
                first_name: String::new(),
                last_name: String::new(),
                password_hash,
            })
            .await
            .map_err(duplicate_username)?;

        info!(
            target = "blogicum::application::accounts",
            user_id = user.id,
            username = %user.username,
            "account registered"
        );
        Ok(user)
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<IssuedSession, AccountError> {
        let user = match self.users.find_by_username(username.trim()).await? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                counter!(METRIC_SIGN_IN_FAILED_TOTAL).increment(1);
                warn!(
                    target = "blogicum::application::accounts",
                    username = %username.trim(),
                    "sign-in rejected"
                );
                return Err(AccountError::InvalidCredentials);
            }
        };

        let prefix = generate_prefix();
        let secret = generate_secret();
        let token = format!("{SESSION_TOKEN_PREFIX}_{prefix}_{secret}");
        let expires_at = OffsetDateTime::now_utc() + self.session_lifetime;

        self.sessions
            .create_session(CreateSessionParams {
                user_id: user.id,
                prefix,
                hashed_secret: hash_secret(&secret),
                expires_at,
            })
            .await?;

        counter!(METRIC_SIGN_IN_TOTAL).increment(1);
        info!(
            target = "blogicum::application::accounts",
            user_id = user.id,
            "session issued"
        );

        Ok(IssuedSession {
            user,
            token,
            expires_at,
        })
    }

    /// Resolve a session token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<UserRecord, SessionError> {
        let parsed = parse_token(token).ok_or(SessionError::Invalid)?;
        let record = self
            .sessions
            .find_by_prefix(&parsed.prefix)
            .await
            .map_err(|_| SessionError::Unavailable)?
            .ok_or(SessionError::Invalid)?;

        let hashed_input = hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(SessionError::Invalid);
        }
        if record.expires_at <= OffsetDateTime::now_utc() {
            return Err(SessionError::Expired);
        }

        self.users
            .find_by_id(record.user_id)
            .await
            .map_err(|_| SessionError::Unavailable)?
            .ok_or(SessionError::Invalid)
    }

    /// Revoke the session behind `token`. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> Result<(), AccountError> {
        let Some(parsed) = parse_token(token) else {
            return Ok(());
        };
        let Some(record) = self.sessions.find_by_prefix(&parsed.prefix).await? else {
            return Ok(());
        };
        if record.hashed_secret.ct_eq(&hash_secret(&parsed.secret)).unwrap_u8() == 0 {
            return Ok(());
        }
        self.sessions.delete_session(record.id).await?;
        Ok(())
    }

    pub async fn prune_expired_sessions(&self) -> Result<u64, AccountError> {
        let removed = self
            .sessions
            .delete_expired(OffsetDateTime::now_utc())
            .await?;
        Ok(removed)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        cmd: ProfileCommand,
    ) -> Result<UserRecord, AccountError> {
        let current = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::NotFound)?;

        let mut errors = FieldErrors::new();
        let mut field = |result: Result<String, _>| {
            result.unwrap_or_else(|err| {
                errors.extend_from(err);
                String::new()
            })
        };
        let username = field(validate_username(&cmd.username));
        let first_name = field(validate_name("first_name", &cmd.first_name));
        let last_name = field(validate_name("last_name", &cmd.last_name));
        let email = field(validate_email(&cmd.email));

        if !username.is_empty() && username != current.username {
            if let Some(existing) = self.users.find_by_username(&username).await? {
                if existing.id != current.id {
                    errors.push("username", DUPLICATE_USERNAME);
                }
            }
        }
        if !errors.is_empty() {
            return Err(AccountError::Invalid(errors));
        }

        self.users
            .update_profile(UpdateProfileParams {
                id: current.id,
                username,
                first_name,
                last_name,
                email,
            })
            .await
            .map_err(duplicate_username)
    }
}

fn duplicate_username(err: RepoError) -> AccountError {
    match err {
        RepoError::Duplicate { .. } => {
            let mut errors = FieldErrors::new();
            errors.push("username", DUPLICATE_USERNAME);
            AccountError::Invalid(errors)
        }
        other => AccountError::Repo(other),
    }
}

pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Hashing(err.to_string()))
}

/// Malformed stored hashes never verify.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_prefix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn parse_token(token: &str) -> Option<ParsedToken> {
    let mut parts = token.splitn(3, '_');
    if parts.next()? != SESSION_TOKEN_PREFIX {
        return None;
    }
    let prefix = parts.next()?;
    let secret = parts.next()?;
    if prefix.is_empty() || secret.len() < MIN_SECRET_LEN {
        return None;
    }
    Some(ParsedToken {
        prefix: prefix.to_string(),
        secret: secret.to_string(),
    })
}

struct ParsedToken {
    prefix: String,
    secret: String,
}
