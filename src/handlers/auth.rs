use crate::{
    auth::{
        AuthError, AuthRouterExt, AuthUser, LoginRequest, LoginResponse, LogoutResponse,
        PublicUser, RegisterRequest, TokenPair, REFRESH_COOKIE,
    },
    errors::ApiError,
    handlers::common::{created_response, json_body, success_response},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Creates the router for session endpoints
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", post(me).get(me).with_auth())
        .route("/logout", post(logout).with_auth())
}

fn refresh_cookie(pair: &TokenPair, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, pair.refresh_token.clone()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(pair.refresh_expires_in as i64))
        .build()
}

fn session_response(
    state: &AppState,
    jar: CookieJar,
    user: crate::auth::user::Model,
    pair: TokenPair,
) -> impl IntoResponse {
    let jar = jar.add(refresh_cookie(&pair, state.auth.config.refresh_cookie_secure));
    let body = LoginResponse {
        access_token: pair.access_token,
        token_type: "bearer".to_string(),
        expires_in: pair.expires_in,
        user: user.into(),
    };
    (jar, Json(body))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = PublicUser),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let account = state.auth.register(payload).await?;
    Ok(created_response(PublicUser::from(account)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; refresh token set as cookie", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AuthError::InvalidCredentials.into());
    };

    let (account, pair) = state.auth.login(&email, &password).await?;
    Ok(session_response(&state, jar, account, pair))
}

/// Rotate the refresh cookie into a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Tokens rotated", body = LoginResponse),
        (status = 401, description = "Missing, expired, revoked or wrong-type refresh token")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let (account, pair) = state.auth.refresh(token.as_deref()).await?;
    Ok(session_response(&state, jar, account, pair))
}

/// Current user
#[utoipa::path(
    post,
    path = "/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = PublicUser),
        (status = 401, description = "Missing, invalid or revoked access token")
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn me(user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let account = state.auth.current_user(&user).await?;
    Ok(success_response(PublicUser::from(account)))
}

/// Log out: revoke the access token and the refresh cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Missing, invalid or revoked access token")
    ),
    security(("Bearer" = [])),
    tag = "Auth"
)]
pub async fn logout(
    user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    state.auth.logout(&user, refresh_token.as_deref()).await?;

    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((
        jar,
        Json(LogoutResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_cookie_is_locked_down() {
        let pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in: 3600,
            refresh_expires_in: 1_209_600,
        };
        let cookie = refresh_cookie(&pair, true);

        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.value(), "r");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(1_209_600)));
    }
}
