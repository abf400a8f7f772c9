//! User persistence and credential checks.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::StoreError;
use crate::models::{Identity, NewUser, RegisterRequest, User, UserId, UserRole};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch the `{id, name, role}` projection used by the authentication gate.
    async fn find_identity(&self, id: &UserId) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user. Fails with [`StoreError::Conflict`] on a duplicate email or username.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_identity(&self, id: &UserId) -> Result<Option<Identity>, StoreError> {
        let identity =
            sqlx::query_as::<_, Identity>("SELECT id, name, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(UserId::random())
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(StoreError::Conflict("user"))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process user table for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn delete(&self, id: &UserId) -> Option<User> {
        self.users.write().await.remove(id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_identity(&self, id: &UserId) -> Result<Option<Identity>, StoreError> {
        Ok(self.users.read().await.get(id).map(Identity::from))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.email == user.email || existing.username == user.username)
        {
            return Err(StoreError::Conflict("user"));
        }

        let now = Utc::now();
        let created = User {
            id: UserId::random(),
            name: user.name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registration and login on top of a [`UserStore`].
pub struct UserService {
    store: Arc<dyn UserStore>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_hash_cost(store, bcrypt::DEFAULT_COST)
    }

    pub fn with_hash_cost(store: Arc<dyn UserStore>, hash_cost: u32) -> Self {
        Self { store, hash_cost }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, UserServiceError> {
        let password_hash = self.hash_password(request.password).await?;
        let user = self
            .store
            .create(NewUser {
                name: request.name,
                username: request.username,
                email: request.email.to_lowercase(),
                password_hash,
                role: UserRole::User,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check an email/password pair. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        let user = self
            .store
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| UserServiceError::Hashing(e.to_string()))?
            .map_err(|e| UserServiceError::Hashing(e.to_string()))?;

        if matches {
            Ok(user)
        } else {
            Err(UserServiceError::InvalidCredentials)
        }
    }

    pub async fn find(&self, id: &UserId) -> Result<Option<User>, UserServiceError> {
        Ok(self.store.find_by_id(id).await?)
    }

    async fn hash_password(&self, password: String) -> Result<String, UserServiceError> {
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| UserServiceError::Hashing(e.to_string()))?
            .map_err(|e| UserServiceError::Hashing(e.to_string()))
    }
}
