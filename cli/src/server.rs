use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

use fridge_core::db::Database;
use fridge_core::models::{
    Ingredient, NewIngredient, RecipeDetail, RecipeSuggestion, UpdateIngredient, non_empty,
    parse_expiry_date, validate_new_ingredient,
};
use fridge_core::receipt::{ExtractionError, ReceiptExtractor, ReceiptItem};
use fridge_core::suggestions::suggest_recipes;

const BODY_LIMIT: usize = 20 * 1024 * 1024; // 20 MB, receipt photos arrive as base64

#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Database>>,
    extractor: Arc<dyn ReceiptExtractor>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct CreateIngredientRequest {
    name: Option<String>,
    category: Option<String>,
    quantity: Option<i64>,
    unit: Option<String>,
    expiry_date: Option<String>,
}

/// Every field is written as given; absent ones become NULL.
#[derive(Deserialize)]
struct UpdateIngredientRequest {
    name: Option<String>,
    category: Option<String>,
    quantity: Option<i64>,
    unit: Option<String>,
    expiry_date: Option<String>,
}

#[derive(Deserialize)]
struct ScanReceiptRequest {
    image: Option<String>,
}

#[derive(Serialize)]
struct ScanReceiptResponse {
    items: Vec<ReceiptItem>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unprocessable(String),
    BadGateway(String),
    /// Body could not be read as the expected JSON; keeps axum's status.
    Rejected(JsonRejection),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Rejected(rejection) => (rejection.status(), rejection.body_text()),
            Self::Internal(err) => {
                let message = format!("{err:#}");
                error!(error = %message, "internal server error");
                // Store errors go back to the client verbatim.
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::InvalidImage => Self::BadRequest(err.to_string()),
            ExtractionError::Unparseable => {
                Self::Unprocessable(format!("{err}. Try demo mode instead."))
            }
            ExtractionError::Request(_) => Self::BadGateway(err.to_string()),
        }
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn create_ingredient(
    State(state): State<AppState>,
    payload: Result<Json<CreateIngredientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Ingredient>), ApiError> {
    let Json(req) = payload?;
    let (name, quantity, expiry_date) = validate_new_ingredient(
        req.name.as_deref(),
        req.quantity,
        req.expiry_date.as_deref(),
    )
    .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let ingredient = db
        .insert_ingredient(&NewIngredient {
            name,
            category: non_empty(req.category),
            quantity,
            unit: non_empty(req.unit),
            expiry_date,
        })
        .context("failed to insert ingredient")?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let ingredients = db.list_ingredients().context("database error")?;
    Ok(Json(ingredients))
}

async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateIngredientRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;

    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if db
        .get_ingredient(id)
        .context("database error")?
        .is_none()
    {
        return Err(ApiError::NotFound("Ingredient not found".to_string()));
    }

    let expiry_date = req
        .expiry_date
        .as_deref()
        .map(parse_expiry_date)
        .transpose()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let update = UpdateIngredient {
        name: req.name,
        category: req.category,
        quantity: req.quantity,
        unit: req.unit,
        expiry_date,
    };

    if db
        .update_ingredient(id, &update)
        .context("failed to update ingredient")?
    {
        Ok(Json(MessageResponse {
            message: "Ingredient updated successfully",
        }))
    } else {
        Err(ApiError::NotFound("Ingredient not found".to_string()))
    }
}

async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if db.delete_ingredient(id).context("database error")? {
        Ok(Json(MessageResponse {
            message: "Ingredient deleted successfully",
        }))
    } else {
        Err(ApiError::NotFound("Ingredient not found".to_string()))
    }
}

async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<RecipeDetail>>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipes = db.list_recipes().context("database error")?;
    Ok(Json(recipes))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let db = state
        .db
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let detail = db
        .get_recipe(id)
        .context("database error")?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;
    Ok(Json(detail))
}

async fn recipe_suggestions(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeSuggestion>>, ApiError> {
    let (ingredients, recipes) = {
        let db = state
            .db
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let ingredients = db.list_ingredients().context("database error")?;
        let recipes = db.list_recipes().context("database error")?;
        (ingredients, recipes)
    };
    Ok(Json(suggest_recipes(&ingredients, recipes, Utc::now())))
}

async fn scan_receipt(
    State(state): State<AppState>,
    payload: Result<Json<ScanReceiptRequest>, JsonRejection>,
) -> Result<Json<ScanReceiptResponse>, ApiError> {
    let Json(req) = payload?;
    let image = non_empty(req.image)
        .ok_or_else(|| ApiError::BadRequest("Image is required".to_string()))?;

    let items = state.extractor.extract(&image).await?;
    info!(count = items.len(), "extracted receipt items");
    Ok(Json(ScanReceiptResponse { items }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Fridge API is running",
    })
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/ingredients",
            post(create_ingredient).get(list_ingredients),
        )
        .route(
            "/api/ingredients/{id}",
            put(update_ingredient).delete(delete_ingredient),
        )
        .route("/api/recipes", get(list_recipes))
        .route("/api/recipes/suggestions", get(recipe_suggestions))
        .route("/api/recipes/{id}", get(get_recipe))
        .route("/api/receipts/scan", post(scan_receipt))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    db: Database,
    extractor: Arc<dyn ReceiptExtractor>,
    port: u16,
    bind: &str,
) -> anyhow::Result<()> {
    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        extractor,
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    info!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
