//! Router, handlers, and error-to-status mapping.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use sigil_auth::{AuthError, AuthService};
use sigil_rpc::proto::{
    ErrorBody, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};
use sigil_rpc::status::Code;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/register", post(register))
        .with_state(state)
}

/// A request rejection: structured status class plus message, rendered as
/// the shared error envelope.
struct ApiError {
    code: Code,
    message: String,
}

impl ApiError {
    fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn invalid_argument(message: &str) -> Self {
        Self::new(Code::InvalidArgument, message)
    }
}

fn http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists => StatusCode::CONFLICT,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::Aborted => StatusCode::CONFLICT,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::Cancelled => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (http_status(self.code), Json(body)).into_response()
    }
}

/// Translate service failures into wire statuses.
///
/// Domain-recognized kinds map to specific classes; everything else is an
/// opaque `internal` so backend details never leak to callers.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::new(Code::Unauthenticated, "invalid email or password")
            }
            AuthError::InvalidApplication => {
                ApiError::new(Code::InvalidArgument, "invalid app_id")
            }
            AuthError::UserAlreadyExists => {
                ApiError::new(Code::AlreadyExists, "user already exists")
            }
            AuthError::Password(_) | AuthError::Token(_) | AuthError::Storage(_) => {
                ApiError::new(Code::Internal, "internal error")
            }
        }
    }
}

fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    if req.email.is_empty() {
        return Err(ApiError::invalid_argument("email is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::invalid_argument("password is required"));
    }
    if req.app_id == 0 {
        return Err(ApiError::invalid_argument("app_id is required"));
    }
    Ok(())
}

fn validate_register(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.email.is_empty() {
        return Err(ApiError::invalid_argument("email is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::invalid_argument("password is required"));
    }
    if req.first_name.is_empty() {
        return Err(ApiError::invalid_argument("first_name is required"));
    }
    if req.last_name.is_empty() {
        return Err(ApiError::invalid_argument("last_name is required"));
    }
    Ok(())
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_login(&req)?;

    let token = state
        .auth
        .login(&req.email, &req.password, req.app_id)
        .await?;

    Ok(Json(LoginResponse { token }))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    validate_register(&req)?;

    let user_id = state
        .auth
        .register(
            &req.email,
            &req.password,
            &req.first_name,
            &req.last_name,
            &req.middle_name,
        )
        .await?;

    Ok(Json(RegisterResponse { user_id }))
}
