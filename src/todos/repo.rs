use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewTodo, Todo, TodoChanges, TodoRow};
use crate::db::StoreResult;

/// Todo storage. Every method is scoped by the owning user's id.
#[async_trait]
pub trait TodoRepo: Send + Sync {
    async fn list_by_user(&self, user_id: i64, limit: i64, offset: i64) -> StoreResult<Vec<Todo>>;
    async fn count_by_user(&self, user_id: i64) -> StoreResult<i64>;
    async fn get(&self, user_id: i64, id: i64) -> StoreResult<Option<Todo>>;
    async fn insert(&self, user_id: i64, todo: NewTodo) -> StoreResult<Todo>;
    /// Returns `None` when no row with that id belongs to the user.
    async fn update(&self, user_id: i64, id: i64, changes: TodoChanges) -> StoreResult<Option<Todo>>;
    /// Returns whether a row was removed.
    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgTodoRepo {
    db: PgPool,
}

impl PgTodoRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoRepo for PgTodoRepo {
    async fn list_by_user(&self, user_id: i64, limit: i64, offset: i64) -> StoreResult<Vec<Todo>> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, user_id, title, description, status, created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn count_by_user(&self, user_id: i64) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todos WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(total)
    }

    async fn get(&self, user_id: i64, id: i64) -> StoreResult<Option<Todo>> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, user_id, title, description, status, created_at, updated_at
            FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Todo::from))
    }

    async fn insert(&self, user_id: i64, todo: NewTodo) -> StoreResult<Todo> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            INSERT INTO todos (user_id, title, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.status.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, user_id: i64, id: i64, changes: TodoChanges) -> StoreResult<Option<Todo>> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos
               SET title = $3, description = $4, status = $5, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.status.as_str())
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Todo::from))
    }

    async fn delete(&self, user_id: i64, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::TodoRepo;
    use crate::db::StoreResult;
    use crate::todos::repo_types::{NewTodo, Todo, TodoChanges};

    #[derive(Default)]
    struct Inner {
        rows: Vec<Todo>,
        next_id: i64,
    }

    #[derive(Default)]
    pub struct InMemoryTodoRepo {
        inner: Mutex<Inner>,
    }

    #[async_trait]
    impl TodoRepo for InMemoryTodoRepo {
        async fn list_by_user(&self, user_id: i64, limit: i64, offset: i64) -> StoreResult<Vec<Todo>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .rows
                .iter()
                .filter(|t| t.user_id == user_id)
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn count_by_user(&self, user_id: i64) -> StoreResult<i64> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.rows.iter().filter(|t| t.user_id == user_id).count() as i64)
        }

        async fn get(&self, user_id: i64, id: i64) -> StoreResult<Option<Todo>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .rows
                .iter()
                .find(|t| t.id == id && t.user_id == user_id)
                .cloned())
        }

        async fn insert(&self, user_id: i64, todo: NewTodo) -> StoreResult<Todo> {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            let now = OffsetDateTime::now_utc();
            let row = Todo {
                id: inner.next_id,
                user_id,
                title: todo.title,
                description: todo.description,
                status: todo.status,
                created_at: now,
                updated_at: now,
            };
            inner.rows.push(row.clone());
            Ok(row)
        }

        async fn update(&self, user_id: i64, id: i64, changes: TodoChanges) -> StoreResult<Option<Todo>> {
            let mut inner = self.inner.lock().unwrap();
            let Some(row) = inner
                .rows
                .iter_mut()
                .find(|t| t.id == id && t.user_id == user_id)
            else {
                return Ok(None);
            };
            row.title = changes.title;
            row.description = changes.description;
            row.status = changes.status;
            row.updated_at = OffsetDateTime::now_utc();
            Ok(Some(row.clone()))
        }

        async fn delete(&self, user_id: i64, id: i64) -> StoreResult<bool> {
            let mut inner = self.inner.lock().unwrap();
            let before = inner.rows.len();
            inner.rows.retain(|t| !(t.id == id && t.user_id == user_id));
            Ok(inner.rows.len() < before)
        }
    }
}
