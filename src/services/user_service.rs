use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{self, AccessToken, BcryptError, Claims, JwtError};
use crate::config::SecurityConfig;
use crate::database::models::{NewUser, User};
use crate::database::store::{StoreError, UserStore};
use crate::types::UserId;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;
const EMAIL_MAX: usize = 255;

// Hashed once per service; verified against when the account does not exist
const DUMMY_PASSWORD: &str = "no-such-account";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User {0} not found")]
    NotFound(UserId),

    #[error("Registration is disabled")]
    RegistrationDisabled,

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl UserError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        UserError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<BcryptError> for UserError {
    fn from(err: BcryptError) -> Self {
        UserError::Hashing(err.to_string())
    }
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniquenessConflict(_) => {
                UserError::Conflict("Username or email already exists.".to_string())
            }
            other => UserError::Store(other.to_string()),
        }
    }
}

/// Full registration: explicit username.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Token registration: the username is derived from the email.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRegister {
    pub email: String,
    pub password: String,
}

/// Login by username or email. Email wins when both are given.
#[derive(Debug, Clone, Deserialize)]
pub struct UserLogin {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    security: Arc<SecurityConfig>,
    dummy_hash: Option<Arc<str>>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, security: Arc<SecurityConfig>) -> Self {
        let dummy_hash = match auth::hash_password(DUMMY_PASSWORD, security.password_cost) {
            Ok(hash) => Some(Arc::from(hash)),
            Err(e) => {
                warn!("cannot prepare dummy password hash: {}", e);
                None
            }
        };

        Self {
            store,
            security,
            dummy_hash,
        }
    }

    pub async fn register(&self, input: &UserCreate) -> Result<User, UserError> {
        self.ensure_registration_allowed()?;

        let username = input.username.trim();
        let email = input.email.trim();
        validate_username(username)?;
        validate_email(email)?;
        validate_password(&input.password)?;

        let password_hash = self.hash(&input.password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "registered user");
        Ok(user)
    }

    /// Register with email and password only, picking a free username.
    pub async fn register_with_email(&self, input: &UserRegister) -> Result<User, UserError> {
        self.ensure_registration_allowed()?;

        let email = input.email.trim();
        validate_email(email)?;
        validate_password(&input.password)?;

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(UserError::Conflict("Email already registered".to_string()));
        }

        let base = username_base(email);
        let mut username = base.clone();
        let mut counter = 1;
        while self.store.find_user_by_username(&username).await?.is_some() {
            username = format!("{base}{counter}");
            counter += 1;
        }

        self.register(&UserCreate {
            username,
            email: email.to_string(),
            password: input.password.clone(),
        })
        .await
    }

    pub async fn authenticate(&self, input: &UserLogin) -> Result<User, UserError> {
        let user = match (input.email.as_deref(), input.username.as_deref()) {
            (Some(email), _) if !email.trim().is_empty() => {
                self.store.find_user_by_email(email.trim()).await?
            }
            (_, Some(username)) if !username.trim().is_empty() => {
                self.store.find_user_by_username(username.trim()).await?
            }
            _ => {
                return Err(UserError::validation(
                    "username",
                    "Either username or email must be provided",
                ))
            }
        };

        match user {
            Some(user) => {
                if self.verify(&input.password, &user.password_hash).await {
                    debug!(user_id = user.id, "authenticated user");
                    Ok(user)
                } else {
                    warn!(user_id = user.id, "rejected login: wrong password");
                    Err(UserError::InvalidCredentials)
                }
            }
            None => {
                if let Some(dummy) = &self.dummy_hash {
                    self.verify(&input.password, dummy).await;
                }
                warn!("rejected login: unknown account");
                Err(UserError::InvalidCredentials)
            }
        }
    }

    pub async fn find(&self, id: UserId) -> Result<User, UserError> {
        self.store
            .find_user_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    pub fn issue_token(&self, user: &User) -> Result<AccessToken, UserError> {
        let claims = Claims::new(&user.email, user.id, self.security.jwt_expiry_minutes);
        let token = auth::generate_jwt(&claims, &self.security)?;
        Ok(AccessToken::bearer(token))
    }

    // bcrypt is CPU-bound; keep it off the async workers
    async fn hash(&self, password: &str) -> Result<String, UserError> {
        let password = password.to_string();
        let cost = self.security.password_cost;
        tokio::task::spawn_blocking(move || auth::hash_password(&password, cost))
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))?
            .map_err(UserError::from)
    }

    async fn verify(&self, password: &str, hash: &str) -> bool {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
            .await
            .unwrap_or(false)
    }

    fn ensure_registration_allowed(&self) -> Result<(), UserError> {
        if !self.security.allow_registration {
            return Err(UserError::RegistrationDisabled);
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), UserError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(UserError::validation(
            "username",
            format!("must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(UserError::validation(
            "password",
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), UserError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(UserError::validation("email", "is not a valid email address"))
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Lower-cased local part of the email, kept inside the username length rules.
fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default().to_lowercase();
    // Leave room for a numeric suffix
    let mut base: String = local.chars().take(USERNAME_MAX - 6).collect();
    if base.chars().count() < USERNAME_MIN {
        base = format!("user_{base}");
    }
    base
}
