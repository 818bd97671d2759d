use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, User};
use crate::db::StoreResult;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, name, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::UserRepo;
    use crate::auth::repo_types::{NewUser, User};
    use crate::db::{StoreError, StoreResult};

    #[derive(Default)]
    pub struct InMemoryUserRepo {
        rows: Mutex<Vec<User>>,
    }

    impl InMemoryUserRepo {
        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn remove(&self, id: i64) {
            self.rows.lock().unwrap().retain(|u| u.id != id);
        }
    }

    #[async_trait]
    impl UserRepo for InMemoryUserRepo {
        async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|u| u.id == id).cloned())
        }

        async fn create(&self, user: NewUser) -> StoreResult<User> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|u| u.email == user.email) {
                return Err(StoreError::Conflict);
            }
            let row = User {
                id: rows.iter().map(|u| u.id).max().unwrap_or(0) + 1,
                email: user.email,
                password_hash: user.password_hash,
                name: user.name,
                created_at: OffsetDateTime::now_utc(),
            };
            rows.push(row.clone());
            Ok(row)
        }
    }
}
