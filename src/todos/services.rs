use std::sync::Arc;

use tracing::{debug, info};

use super::dto::{CreateTodoRequest, DeletedTodo, Pagination, TodoPage, UpdateTodoRequest};
use super::repo::TodoRepo;
use super::repo_types::{NewTodo, Todo, TodoChanges, TodoStatus};
use crate::error::AppError;

const NOT_FOUND: &str = "Todo not found";

/// CRUD over the caller's todos. Every call is scoped by `user_id`; a todo
/// owned by someone else is indistinguishable from a missing one.
#[derive(Clone)]
pub struct TodoService {
    todos: Arc<dyn TodoRepo>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoRepo>) -> Self {
        Self { todos }
    }

    pub async fn list(&self, user_id: i64, pagination: Pagination) -> Result<TodoPage, AppError> {
        let items = self
            .todos
            .list_by_user(user_id, pagination.limit, pagination.offset())
            .await?;
        let total = self.todos.count_by_user(user_id).await?;
        debug!(user_id, total, page = pagination.page, "todos listed");

        Ok(TodoPage {
            items,
            total,
            page: pagination.page,
            total_pages: pagination.total_pages(total),
            limit: pagination.limit,
        })
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Todo, AppError> {
        self.todos
            .get(user_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn create(&self, user_id: i64, req: CreateTodoRequest) -> Result<Todo, AppError> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title is required"));
        }
        // Unknown statuses fall back to the default on create.
        let status = req
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let todo = self
            .todos
            .insert(
                user_id,
                NewTodo {
                    title: title.to_string(),
                    description: req.description,
                    status,
                },
            )
            .await?;
        info!(user_id, todo_id = todo.id, "todo created");
        Ok(todo)
    }

    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        req: UpdateTodoRequest,
    ) -> Result<Todo, AppError> {
        let current = self.get(user_id, id).await?;

        let title = match req.title.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("Title cannot be empty")),
            Some(t) => t.to_string(),
            None => current.title,
        };
        let status = match req.status.as_deref() {
            Some(raw) => raw.parse::<TodoStatus>().map_err(|e| {
                AppError::validation(format!(
                    "Invalid status '{}': expected pending, in-progress or completed",
                    e.0
                ))
            })?,
            None => current.status,
        };
        let description = req.description.unwrap_or(current.description);

        let todo = self
            .todos
            .update(
                user_id,
                id,
                TodoChanges {
                    title,
                    description,
                    status,
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
        info!(user_id, todo_id = id, "todo updated");
        Ok(todo)
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<DeletedTodo, AppError> {
        if !self.todos.delete(user_id, id).await? {
            return Err(AppError::not_found(NOT_FOUND));
        }
        info!(user_id, todo_id = id, "todo deleted");
        Ok(DeletedTodo { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todos::repo::memory::InMemoryTodoRepo;

    const OWNER: i64 = 1;
    const INTRUDER: i64 = 2;

    fn service() -> TodoService {
        TodoService::new(Arc::new(InMemoryTodoRepo::default()))
    }

    fn create_req(title: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let svc = service();
        let created = svc
            .create(
                OWNER,
                CreateTodoRequest {
                    title: "Buy milk".into(),
                    description: Some("2%".into()),
                    status: Some("in-progress".into()),
                },
            )
            .await
            .unwrap();

        let fetched = svc.get(OWNER, created.id).await.unwrap();
        assert_eq!(fetched.title, "Buy milk");
        assert_eq!(fetched.description.as_deref(), Some("2%"));
        assert_eq!(fetched.status, TodoStatus::InProgress);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_defaults_status_and_rejects_blank_title() {
        let svc = service();
        let todo = svc.create(OWNER, create_req("Buy milk")).await.unwrap();
        assert_eq!(todo.status, TodoStatus::Pending);

        let odd = svc
            .create(
                OWNER,
                CreateTodoRequest {
                    title: "Walk dog".into(),
                    status: Some("someday".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(odd.status, TodoStatus::Pending);

        let err = svc.create(OWNER, create_req("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn other_users_never_reach_a_todo() {
        let svc = service();
        let todo = svc.create(OWNER, create_req("Private")).await.unwrap();

        assert!(matches!(svc.get(INTRUDER, todo.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.update(INTRUDER, todo.id, UpdateTodoRequest::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(svc.delete(INTRUDER, todo.id).await, Err(AppError::NotFound(_))));

        let page = svc.list(INTRUDER, Pagination::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);

        // still intact for the owner
        assert_eq!(svc.get(OWNER, todo.id).await.unwrap().title, "Private");
    }

    #[tokio::test]
    async fn status_only_update_keeps_other_fields() {
        let svc = service();
        let todo = svc
            .create(
                OWNER,
                CreateTodoRequest {
                    title: "Buy milk".into(),
                    description: Some("2%".into()),
                    status: None,
                },
            )
            .await
            .unwrap();

        let updated = svc
            .update(
                OWNER,
                todo.id,
                UpdateTodoRequest {
                    status: Some("completed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, TodoStatus::Completed);
        assert_eq!(updated.title, todo.title);
        assert_eq!(updated.description, todo.description);
        assert_eq!(updated.created_at, todo.created_at);
        assert!(updated.updated_at >= todo.updated_at);
    }

    #[tokio::test]
    async fn update_can_clear_description_and_rejects_bad_input() {
        let svc = service();
        let todo = svc
            .create(
                OWNER,
                CreateTodoRequest {
                    title: "Buy milk".into(),
                    description: Some("2%".into()),
                    status: None,
                },
            )
            .await
            .unwrap();

        let cleared = svc
            .update(
                OWNER,
                todo.id,
                UpdateTodoRequest {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.title, "Buy milk");

        let bad_status = UpdateTodoRequest {
            status: Some("done".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(OWNER, todo.id, bad_status).await,
            Err(AppError::Validation(_))
        ));

        let blank_title = UpdateTodoRequest {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(OWNER, todo.id, blank_title).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_immediate() {
        let svc = service();
        let todo = svc.create(OWNER, create_req("Gone soon")).await.unwrap();

        assert_eq!(svc.delete(OWNER, todo.id).await.unwrap().id, todo.id);
        assert!(matches!(svc.get(OWNER, todo.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.delete(OWNER, todo.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn pages_split_twenty_five_items_by_ten() {
        let svc = service();
        for i in 1..=25 {
            svc.create(OWNER, create_req(&format!("todo {i}"))).await.unwrap();
        }
        svc.create(INTRUDER, create_req("not mine")).await.unwrap();

        let mut sizes = Vec::new();
        for page in 1..=3 {
            let res = svc
                .list(OWNER, Pagination { page, limit: 10 })
                .await
                .unwrap();
            assert_eq!(res.total, 25);
            assert_eq!(res.total_pages, 3);
            sizes.push(res.items.len());
        }
        assert_eq!(sizes, vec![10, 10, 5]);

        let first = svc.list(OWNER, Pagination { page: 1, limit: 10 }).await.unwrap();
        assert_eq!(first.items[0].title, "todo 1");

        let beyond = svc.list(OWNER, Pagination { page: 4, limit: 10 }).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 25);
    }
}
