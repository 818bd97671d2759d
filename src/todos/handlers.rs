use axum::{
    extract::State,
    routing::get,
    Router,
};
use tracing::instrument;

use super::dto::{CreateTodoRequest, DeletedTodo, PageQuery, TodoPage, UpdateTodoRequest};
use super::repo_types::Todo;
use super::services::TodoService;
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extractors::{ApiJson, ApiPath, ApiQuery},
    response::ApiResponse,
    state::AppState,
};

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_todos).post(create_todo))
        .route(
            "/items/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

#[instrument(skip(todos))]
pub async fn list_todos(
    State(todos): State<TodoService>,
    AuthUser(user_id): AuthUser,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> Result<ApiResponse<TodoPage>, AppError> {
    let page = todos.list(user_id, q.into()).await?;
    Ok(ApiResponse::ok("Todos retrieved successfully", page))
}

#[instrument(skip(todos))]
pub async fn get_todo(
    State(todos): State<TodoService>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<Todo>, AppError> {
    let todo = todos.get(user_id, id).await?;
    Ok(ApiResponse::ok("Todo retrieved successfully", todo))
}

#[instrument(skip(todos, body))]
pub async fn create_todo(
    State(todos): State<TodoService>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateTodoRequest>,
) -> Result<ApiResponse<Todo>, AppError> {
    let todo = todos.create(user_id, body).await?;
    Ok(ApiResponse::created("Todo created successfully", todo))
}

#[instrument(skip(todos, body))]
pub async fn update_todo(
    State(todos): State<TodoService>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateTodoRequest>,
) -> Result<ApiResponse<Todo>, AppError> {
    let todo = todos.update(user_id, id, body).await?;
    Ok(ApiResponse::ok("Todo updated successfully", todo))
}

#[instrument(skip(todos))]
pub async fn delete_todo(
    State(todos): State<TodoService>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiResponse<DeletedTodo>, AppError> {
    let deleted = todos.delete(user_id, id).await?;
    Ok(ApiResponse::ok("Todo deleted successfully", deleted))
}
