use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::dto::{AuthResponse, PublicUser};
use super::jwt::JwtKeys;
use super::password::{spawn_hash, spawn_verify, validate_password};
use super::repo::UserRepo;
use super::repo_types::NewUser;
use crate::db::StoreError;
use crate::error::AppError;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login and token verification over a user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepo>,
    keys: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepo>, keys: JwtKeys) -> Self {
        Self {
            users,
            keys: Arc::new(keys),
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::validation("Invalid email"));
        }
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict("User already exists".into()));
        }

        let password_hash = spawn_hash(password.to_owned()).await?;
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);

        let user = self
            .users
            .create(NewUser {
                email,
                password_hash,
                name,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict => AppError::Conflict("User already exists".into()),
                other => other.into(),
            })?;

        let token = self.keys.sign(user.id)?;
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("Email and password are required"));
        }

        let user = self.users.find_by_email(&email).await?;
        let stored = user.as_ref().map(|u| u.password_hash.clone());
        let matches = spawn_verify(password.to_owned(), stored).await?;

        let user = match user {
            Some(user) if matches => user,
            Some(user) => {
                warn!(user_id = user.id, "login invalid password");
                return Err(AppError::auth(INVALID_CREDENTIALS));
            }
            None => {
                warn!(email = %email, "login unknown email");
                return Err(AppError::auth(INVALID_CREDENTIALS));
            }
        };

        let token = self.keys.sign(user.id)?;
        info!(user_id = user.id, "user logged in");
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }

    /// Yields the user id embedded in a valid token.
    pub fn verify_token(&self, token: Option<&str>) -> Result<i64, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::auth("No token, authorization denied"))?;

        match self.keys.verify(token) {
            Ok(claims) => claims
                .user_id()
                .ok_or_else(|| AppError::auth("Invalid or expired token")),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err(AppError::auth("Invalid or expired token"))
            }
        }
    }

    pub async fn profile(&self, user_id: i64) -> Result<PublicUser, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
