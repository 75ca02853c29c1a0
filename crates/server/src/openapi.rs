use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorResponse { pub error: String }

#[derive(ToSchema)]
pub struct TransactionDoc {
    pub id: Uuid,
    pub user: String,
    pub item: String,
    pub amount: f64,
    /// UNIX seconds
    pub timestamp: u64,
}

#[derive(ToSchema)]
pub struct CreateTransactionDoc {
    pub user: String,
    pub item: String,
    pub amount: f64,
    /// defaults to the current time
    pub timestamp: Option<u64>,
}

#[derive(ToSchema)]
pub struct UpdateTransactionDoc {
    pub user: Option<String>,
    pub item: Option<String>,
    pub amount: Option<f64>,
    pub timestamp: Option<u64>,
}

#[derive(ToSchema)]
pub struct UserSummaryDoc {
    pub user: String,
    pub count: u64,
    pub total_amount: f64,
    pub transactions: Vec<TransactionDoc>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::transactions::create_transaction,
        crate::routes::transactions::list_transactions,
        crate::routes::transactions::get_transaction,
        crate::routes::transactions::update_transaction,
        crate::routes::transactions::delete_transaction,
        crate::routes::transactions::user_summary,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            TransactionDoc,
            CreateTransactionDoc,
            UpdateTransactionDoc,
            UserSummaryDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "transactions"),
        (name = "users")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}
