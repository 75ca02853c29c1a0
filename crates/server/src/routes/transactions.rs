use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use models::{CreateTransaction, Transaction, UpdateTransaction, UserSummary};
use serde::Deserialize;
use service::{pagination::Pagination, ListFilter};
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::metrics;
use crate::routes::ServerState;

/// `GET /transactions` 查询参数；全部可选
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub user: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    fn into_filter(self) -> ListFilter {
        ListFilter {
            user: self.user,
            pagination: Pagination::from_parts(self.page, self.per_page),
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, JsonApiError> {
    Uuid::parse_str(raw).map_err(|_| JsonApiError::invalid_uuid())
}

async fn refresh_stored_gauge(state: &ServerState) {
    metrics::set_stored(state.store.count().await);
}

/// 创建交易
#[utoipa::path(post, path = "/transactions", tag = "transactions", request_body = crate::openapi::CreateTransactionDoc, responses((status = 201, description = "Created", body = crate::openapi::TransactionDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorResponse), (status = 500, description = "Persist failed", body = crate::openapi::ErrorResponse)))]
pub async fn create_transaction(
    State(state): State<ServerState>,
    payload: Result<Json<CreateTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), JsonApiError> {
    let Json(input) = payload?;
    let tx = state
        .store
        .create(input)
        .await
        .map_err(|e| JsonApiError::from_service(e, "failed to save transaction"))?;
    metrics::TRANSACTIONS_CREATED_TOTAL.inc();
    refresh_stored_gauge(&state).await;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// 列出交易（写入顺序），支持 user 过滤与分页
#[utoipa::path(get, path = "/transactions", tag = "transactions", params(("user" = Option<String>, Query, description = "exact user match"), ("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "1..=100, default 20")), responses((status = 200, description = "OK", body = [crate::openapi::TransactionDoc])))]
pub async fn list_transactions(
    State(state): State<ServerState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, JsonApiError> {
    let Query(q) = query?;
    Ok(Json(state.store.list(&q.into_filter()).await))
}

/// 获取指定交易
#[utoipa::path(get, path = "/transactions/{id}", tag = "transactions", params(("id" = String, Path, description = "transaction uuid")), responses((status = 200, description = "OK", body = crate::openapi::TransactionDoc), (status = 400, description = "Invalid uuid", body = crate::openapi::ErrorResponse), (status = 404, description = "Not Found", body = crate::openapi::ErrorResponse)))]
pub async fn get_transaction(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, JsonApiError> {
    let id = parse_id(&id)?;
    state.store.get(id).await.map(Json).ok_or_else(JsonApiError::not_found)
}

/// 部分更新指定交易
#[utoipa::path(put, path = "/transactions/{id}", tag = "transactions", params(("id" = String, Path, description = "transaction uuid")), request_body = crate::openapi::UpdateTransactionDoc, responses((status = 200, description = "Updated", body = crate::openapi::TransactionDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorResponse), (status = 404, description = "Not Found", body = crate::openapi::ErrorResponse), (status = 500, description = "Persist failed", body = crate::openapi::ErrorResponse)))]
pub async fn update_transaction(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTransaction>, JsonRejection>,
) -> Result<Json<Transaction>, JsonApiError> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let tx = state
        .store
        .update(id, input)
        .await
        .map_err(|e| JsonApiError::from_service(e, "failed to save changes"))?;
    metrics::TRANSACTIONS_UPDATED_TOTAL.inc();
    Ok(Json(tx))
}

/// 删除指定交易
#[utoipa::path(delete, path = "/transactions/{id}", tag = "transactions", params(("id" = String, Path, description = "transaction uuid")), responses((status = 204, description = "Deleted"), (status = 400, description = "Invalid uuid", body = crate::openapi::ErrorResponse), (status = 404, description = "Not Found", body = crate::openapi::ErrorResponse), (status = 500, description = "Persist failed", body = crate::openapi::ErrorResponse)))]
pub async fn delete_transaction(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    let id = parse_id(&id)?;
    match state.store.delete(id).await {
        Ok(true) => {
            metrics::TRANSACTIONS_DELETED_TOTAL.inc();
            refresh_stored_gauge(&state).await;
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(JsonApiError::not_found()),
        Err(e) => Err(JsonApiError::from_service(e, "failed to persist delete")),
    }
}

/// 用户汇总：笔数、总额与明细
#[utoipa::path(get, path = "/users/{user}/summary", tag = "users", params(("user" = String, Path, description = "exact user name")), responses((status = 200, description = "OK", body = crate::openapi::UserSummaryDoc)))]
pub async fn user_summary(
    State(state): State<ServerState>,
    Path(user): Path<String>,
) -> Json<UserSummary> {
    Json(state.store.summary(&user).await)
}
