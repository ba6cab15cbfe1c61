use axum::{
    extract::{FromRef, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};
use url::form_urlencoded;

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, GithubCallbackQuery, GoogleLoginRequest,
            LoginRequest, PublicUser, RegisterRequest, ResetPasswordRequest,
        },
        github,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::{ApiError, ApiJson, ProviderError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google_login))
        .route("/auth/github", get(github_authorize))
        .route("/auth/github/callback", get(github_callback))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Absent and empty-string fields are the same thing to this API.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

fn invalid_credentials() -> ApiError {
    ApiError::Auth("Invalid email or password".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (email, password) = match (present(payload.email), present(payload.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::Validation("Email and password required".into())),
    };

    let hash = hash_password(&password)?;
    // No existence pre-check: the unique index on email is the authority,
    // and a duplicate insert comes back as a conflict.
    let user = User::create(&state.db, &email, &hash).await?;

    let token = JwtKeys::from_ref(&state).sign_auth(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".into(),
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (email, password) = match (present(payload.email), present(payload.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::Validation("Email and password required".into())),
    };

    // Unknown email, social-only account and wrong password all produce the
    // same answer so account existence does not leak.
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login password mismatch");
        return Err(invalid_credentials());
    }

    let token = JwtKeys::from_ref(&state).sign_auth(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn google_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let credential = present(payload.credential)
        .ok_or_else(|| ApiError::Validation("Missing Google credential".into()))?;

    let email = state
        .google
        .verify_credential(&credential)
        .await
        .map_err(|err| match err {
            ProviderError::Rejected(reason) => {
                warn!(%reason, "google credential rejected");
                ApiError::Auth("Google login failed".into())
            }
            ProviderError::Upstream(reason) => {
                error!(%reason, "google verification unavailable");
                ApiError::Upstream("Google login failed".into())
            }
        })?;

    let user = User::find_or_create_social(&state.db, &email).await?;
    let token = JwtKeys::from_ref(&state).sign_auth(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "google login");
    Ok(Json(AuthResponse {
        message: "Google login successful".into(),
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn github_authorize(State(state): State<AppState>) -> impl IntoResponse {
    let url = github::authorize_url(
        &state.config.github.client_id,
        &state.config.github.callback_url,
    );
    // 302, not axum's 303/307 helpers; the user agent must re-request as GET.
    (StatusCode::FOUND, [(header::LOCATION, url)])
}

/// Failures here are plain text, not JSON: the caller is a browser halfway
/// through a redirect chain, not the SPA.
#[instrument(skip(state, query))]
pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<GithubCallbackQuery>,
) -> Result<Response, (StatusCode, String)> {
    let code = match present(query.code) {
        Some(code) => code,
        None => return Err((StatusCode::BAD_REQUEST, "Missing code".into())),
    };

    let email = state.github.resolve_email(&code).await.map_err(|err| {
        error!(error = ?err, "github email resolution failed");
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })?;

    let user = User::find_or_create_social(&state.db, &email)
        .await
        .map_err(|err| {
            error!(error = %err, "github user provisioning failed");
            github_login_failed()
        })?;

    let token = JwtKeys::from_ref(&state)
        .sign_auth(user.id, &user.email)
        .map_err(|err| {
            error!(error = %err, "github token signing failed");
            github_login_failed()
        })?;

    info!(user_id = %user.id, email = %user.email, "github login");
    let target = frontend_login_url(&state.config.frontend_url, &token, &user.email);
    Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
}

fn github_login_failed() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "GitHub login failed".into())
}

/// Hands the token and email back to the SPA in the fragment query of its
/// login route.
fn frontend_login_url(frontend_url: &str, token: &str, email: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("githubToken", token)
        .append_pair("email", email)
        .finish();
    format!("{frontend_url}/#!/login?{query}")
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email =
        present(payload.email).ok_or_else(|| ApiError::Validation("Email required".into()))?;

    // Same response whether or not the account exists.
    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let token = JwtKeys::from_ref(&state).sign_reset(user.id, &user.email)?;
        let link = format!("{}/#!/reset-password/{}", state.config.frontend_url, token);
        // There is no mailer; the operator delivers the link from the log.
        debug!(user_id = %user.id, %link, "password reset link issued");
    }

    Ok(Json(json!({
        "message": "If an account with that email exists, a reset link has been sent."
    })))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (token, password) = match (present(payload.token), present(payload.password)) {
        (Some(token), Some(password)) => (token, password),
        _ => {
            return Err(ApiError::Validation(
                "Token and new password required".into(),
            ))
        }
    };

    let claims = JwtKeys::from_ref(&state)
        .verify_reset(&token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired reset token".into()))?;

    let hash = hash_password(&password)?;
    let updated = User::update_password(&state.db, claims.sub, &hash).await?;
    if !updated {
        // Token outlived the account.
        return Err(ApiError::Unauthorized("Invalid or expired reset token".into()));
    }

    info!(user_id = %claims.sub, "password reset");
    Ok(Json(json!({ "message": "Password reset successful" })))
}
