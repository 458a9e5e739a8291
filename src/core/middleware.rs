use crate::core::error::AppError;
use crate::features::accounts::repositories::AccountRepository;
use crate::features::auth::model::{Caller, CallerAccount};
use crate::features::auth::JwtValidator;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::{debug, Span};
use uuid::Uuid;

/// Time-ordered request ids so log lines sort with the requests they belong to
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request span carrying method, uri and the `x-request-id` value
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Decoded `user:password` from a `Basic` Authorization header
fn basic_credentials(req: &Request) -> Option<String> {
    let encoded = req
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(decoded).ok()
}

/// Guards the Swagger UI when docs credentials are configured
pub async fn basic_auth_middleware(
    State(expected): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Response {
    if basic_credentials(&req).as_deref() == Some(expected.as_str()) {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Elevate API docs\"")],
        "Unauthorized",
    )
        .into_response()
}

/// Shared state for the identity middlewares
#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<JwtValidator>,
    pub accounts: Arc<dyn AccountRepository>,
}

impl AuthState {
    pub fn new(validator: Arc<JwtValidator>, accounts: Arc<dyn AccountRepository>) -> Self {
        Self {
            validator,
            accounts,
        }
    }

    async fn resolve(&self, token: &str) -> Result<Caller, AppError> {
        let identity = self.validator.validate_token(token).await?;
        let account = self
            .accounts
            .find_by_subject(&identity.sub)
            .await?
            .map(CallerAccount::from);

        Ok(Caller { identity, account })
    }
}

/// `Ok(None)` when no Authorization header is present
fn bearer_token(req: &Request) -> Result<Option<&str>, AppError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| Some(token.trim()))
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

/// Requires a valid bearer token and stores the resolved `Caller`
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let caller = state.resolve(token).await?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

/// For public routes: a valid token attaches the `Caller`, a missing or
/// rejected one leaves the request anonymous
pub async fn optional_auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req).ok().flatten().map(str::to_string);

    if let Some(token) = token {
        match state.resolve(&token).await {
            Ok(caller) => {
                req.extensions_mut().insert(caller);
            }
            Err(AppError::Auth(reason)) | Err(AppError::Unauthorized(reason)) => {
                debug!("Ignoring rejected token on public route: {}", reason);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(next.run(req).await)
}
