use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use axum::http::StatusCode;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

/// Route-group guard: one instance per role-gated router.
pub struct AuthState {
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
    pub required_role: &'static str,
}

impl AuthState {
    pub fn new(jwt_utils: Arc<JwtTokenUtilsImpl>, required_role: &'static str) -> Self {
        AuthState { jwt_utils, required_role }
    }
}

pub async fn require_role(
    State(state): State<Arc<AuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // Extract the Authorization header
    let auth_header = req.headers().get("authorization").and_then(|v| v.to_str().ok());
    let auth_header = match auth_header {
        Some(h) => h,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    // Extract and validate the token
    let token = match state.jwt_utils.extract_token_from_header(auth_header) {
        Ok(t) => t,
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };
    let claims = match state.jwt_utils.validate_access_token(&token) {
        Ok(c) => c,
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };

    // Check the role for this route group
    if !state.jwt_utils.check_role_permission(&claims.role, state.required_role) {
        return Err(StatusCode::FORBIDDEN);
    }

    // Handlers read the caller's identity from the claims
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
