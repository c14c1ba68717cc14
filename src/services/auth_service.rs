use std::sync::Arc;

use crate::config::{AdminSeed, Config};
use crate::dto::auth_dto::{AuthResponse, AuthUser, LoginRequest, RegisterRequest};
use crate::error::{Error, Result};
use crate::models::user::{is_guest_email, ContactDetails, NewUser, User, UserRole};
use crate::repositories::Repositories;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::issue_token;

#[derive(Clone)]
pub struct AuthService {
    repos: Repositories,
    config: Arc<Config>,
}

impl AuthService {
    pub fn new(repos: Repositories, config: Arc<Config>) -> Self {
        Self { repos, config }
    }

    fn respond(&self, user: &User) -> Result<AuthResponse> {
        let token = issue_token(user, &self.config.jwt_secret, self.config.jwt_expire_hours)?;
        Ok(AuthResponse {
            token,
            user: AuthUser::from(user),
        })
    }

    /// Email and password must match a live account holding `role`.
    pub async fn login(&self, req: LoginRequest, role: UserRole) -> Result<AuthResponse> {
        let email = req.email.trim().to_lowercase();
        let user = self
            .repos
            .users
            .find_by_email(&email)
            .await?
            .filter(|u| u.role == role);

        let Some(user) = user else {
            tracing::warn!(role = %role, "login for unknown account");
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        };
        if !verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(user_id = user.id, "login with wrong password");
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }

        tracing::info!(user_id = user.id, role = %role, "login succeeded");
        self.respond(&user)
    }

    pub async fn register_student(&self, req: RegisterRequest) -> Result<AuthResponse> {
        if is_guest_email(&req.email) {
            return Err(Error::BadRequest("This email domain is reserved".to_string()));
        }
        let user = self
            .repos
            .users
            .create(NewUser {
                email: req.email.trim().to_lowercase(),
                password_hash: hash_password(&req.password)?,
                name: req.name.trim().to_string(),
                role: UserRole::Student,
                contact: ContactDetails::default(),
            })
            .await?;
        tracing::info!(user_id = user.id, "student self-registered");
        self.respond(&user)
    }

    /// Creates the configured admin account unless the email is already taken.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<bool> {
        let email = seed.email.trim().to_lowercase();
        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Ok(false);
        }
        let user = self
            .repos
            .users
            .create(NewUser {
                email,
                password_hash: hash_password(&seed.password)?,
                name: seed.name.clone(),
                role: UserRole::Admin,
                contact: ContactDetails::default(),
            })
            .await?;
        tracing::info!(user_id = user.id, "admin account seeded");
        Ok(true)
    }
}
