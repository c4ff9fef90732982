/*!
 * # Authentication Module
 *
 * Session handling for the catalog API:
 *
 * - short-lived access JWTs presented as `Authorization: Bearer …`
 * - long-lived refresh JWTs carried only in an HttpOnly cookie and rotated on every use
 * - persisted revocation for both, so no token state lives in process memory
 *
 * Every token check funnels through [`AuthService::inspect`], which classifies a raw token
 * as a [`TokenCheck`]; callers then demand the token type they need with
 * [`TokenCheck::require`].
 */

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::{ApiError, FieldErrors, ServiceError};

// Entity modules
pub mod refresh_token;
pub mod revoked_token;
pub mod user;

mod password;
mod types;

pub use password::{hash_password, verify_password};
pub use types::*;

/// Name of the cookie holding the refresh token
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Distinguishes the two kinds of JWT this service signs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// Claim structure for JWT tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,           // Subject (user ID)
    pub name: Option<String>,  // User's name, access tokens only
    pub email: Option<String>, // User's email, access tokens only
    pub token_type: TokenType,
    pub jti: String, // JWT ID (unique identifier for this token)
    pub iat: i64,    // Issued at time
    pub exp: i64,    // Expiration time
    pub nbf: i64,    // Not valid before time
    pub iss: String, // Issuer
    pub aud: String, // Audience
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Outcome of inspecting a raw token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenCheck {
    Valid(Claims),
    Expired,
    Invalid,
    Missing,
}

impl TokenCheck {
    /// Accepts only a valid token of the `expected` type.
    pub fn require(self, expected: TokenType) -> Result<Claims, AuthError> {
        match self {
            TokenCheck::Valid(claims) if claims.token_type == expected => Ok(claims),
            TokenCheck::Valid(claims) => Err(AuthError::WrongTokenType {
                expected,
                found: claims.token_type,
            }),
            TokenCheck::Expired => Err(AuthError::TokenExpired),
            TokenCheck::Invalid => Err(AuthError::InvalidToken),
            TokenCheck::Missing => Err(AuthError::MissingToken),
        }
    }
}

/// Authenticated principal inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.user_id()?,
            expires_at: claims.expires_at(),
            name: claims.name,
            email: claims.email,
            token_id: claims.jti,
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
    pub refresh_cookie_secure: bool,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
            refresh_token_expiration,
            refresh_cookie_secure: true,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            access_token_expiration: Duration::from_secs(cfg.jwt_expiration),
            refresh_token_expiration: Duration::from_secs(cfg.refresh_token_expiration),
            refresh_cookie_secure: cfg.refresh_cookie_secure,
        }
    }
}

/// Authentication service that handles registration, token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Creates an account. Field problems come back as `ApiError::InvalidFields`.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<user::Model, ApiError> {
        if let Err(errors) = request.validate() {
            return Err(ApiError::InvalidFields(errors.into()));
        }

        let (Some(name), Some(email), Some(password)) =
            (request.name, request.email, request.password)
        else {
            return Err(ApiError::InvalidFields(FieldErrors::single(
                "email",
                "required",
                "email is required",
            )));
        };
        let email = normalize_email(&email);

        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::from)?;
        if taken.is_some() {
            return Err(email_taken());
        }

        let password_hash = hash_password(&password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let now = Utc::now();
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = match account.insert(self.db.as_ref()).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => return Err(email_taken()),
            Err(err) => return Err(ServiceError::from(err).into()),
        };

        info!(user_id = %created.id, "user registered");
        Ok(created)
    }

    /// Verifies credentials and issues a fresh token pair.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(user::Model, TokenPair), AuthError> {
        let account = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(self.db.as_ref())
            .await?;

        let Some(account) = account else {
            warn!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash) {
            warn!(user_id = %account.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_tokens(self.db.as_ref(), &account).await?;
        info!(user_id = %account.id, "user logged in");
        Ok((account, pair))
    }

    /// Consumes a refresh token and rotates it into a brand-new pair.
    ///
    /// The stored row is revoked with a conditional update, so of two concurrent
    /// refreshes with the same token exactly one succeeds.
    #[instrument(skip(self, token))]
    pub async fn refresh(&self, token: Option<&str>) -> Result<(user::Model, TokenPair), AuthError> {
        let claims = self.inspect(token).require(TokenType::Refresh)?;
        let user_id = claims.user_id()?;

        let txn = self.db.begin().await?;

        let consumed = refresh_token::Entity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .filter(refresh_token::Column::TokenId.eq(claims.jti.as_str()))
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&txn)
            .await?;

        if consumed.rows_affected != 1 {
            let known = refresh_token::Entity::find()
                .filter(refresh_token::Column::TokenId.eq(claims.jti.as_str()))
                .one(&txn)
                .await?;
            warn!(jti = %claims.jti, "refresh rejected: token not redeemable");
            return Err(match known {
                Some(_) => AuthError::RevokedToken,
                None => AuthError::InvalidToken,
            });
        }

        let account = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let pair = self.issue_tokens(&txn, &account).await?;
        txn.commit().await?;

        debug!(user_id = %account.id, "refresh token rotated");
        Ok((account, pair))
    }

    /// Loads the account behind an authenticated request.
    pub async fn current_user(&self, auth_user: &AuthUser) -> Result<user::Model, AuthError> {
        user::Entity::find_by_id(auth_user.user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Revokes the access token until its expiry and, when present, the refresh token.
    #[instrument(skip(self, auth_user, refresh_token), fields(user_id = %auth_user.user_id))]
    pub async fn logout(
        &self,
        auth_user: &AuthUser,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        revoked_token::Entity::delete_many()
            .filter(revoked_token::Column::ExpiresAt.lt(now))
            .exec(&txn)
            .await?;

        let entry = revoked_token::ActiveModel {
            jti: Set(auth_user.token_id.clone()),
            expires_at: Set(auth_user.expires_at),
            revoked_at: Set(now),
        };
        revoked_token::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(revoked_token::Column::Jti)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&txn)
            .await?;

        // A stale or foreign refresh cookie must not block logout.
        if let TokenCheck::Valid(claims) = self.inspect(refresh_token) {
            if claims.token_type == TokenType::Refresh && claims.sub == auth_user.user_id.to_string()
            {
                refresh_token::Entity::update_many()
                    .col_expr(refresh_token::Column::Revoked, Expr::value(true))
                    .filter(refresh_token::Column::TokenId.eq(claims.jti.as_str()))
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;
        info!("user logged out");
        Ok(())
    }

    /// Decodes and classifies a raw token without touching the database.
    pub fn inspect(&self, token: Option<&str>) -> TokenCheck {
        let token = match token.map(str::trim) {
            None | Some("") => return TokenCheck::Missing,
            Some(token) => token,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.validate_nbf = true;

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => TokenCheck::Valid(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => TokenCheck::Expired,
                _ => TokenCheck::Invalid,
            },
        }
    }

    /// Full access-token check: signature, expiry, type and revocation.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        let claims = self.inspect(token).require(TokenType::Access)?;
        if self.is_revoked(&claims.jti).await? {
            return Err(AuthError::RevokedToken);
        }
        Ok(claims)
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        let hit = revoked_token::Entity::find_by_id(jti.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(hit.is_some())
    }

    /// Signs a token of the given type for `account`.
    pub fn sign(
        &self,
        account: &user::Model,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Claims, AuthError> {
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        let (name, email) = match token_type {
            TokenType::Access => (Some(account.name.clone()), Some(account.email.clone())),
            TokenType::Refresh => (None, None),
        };

        Ok(Claims {
            sub: account.id.to_string(),
            name,
            email,
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            nbf: issued_at.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        })
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    async fn issue_tokens<C>(&self, conn: &C, account: &user::Model) -> Result<TokenPair, AuthError>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        let access = self.sign(
            account,
            TokenType::Access,
            now,
            self.config.access_token_expiration,
        )?;
        let refresh = self.sign(
            account,
            TokenType::Refresh,
            now,
            self.config.refresh_token_expiration,
        )?;

        refresh_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(account.id),
            token_id: Set(refresh.jti.clone()),
            created_at: Set(now),
            expires_at: Set(refresh.expires_at()),
            revoked: Set(false),
        }
        .insert(conn)
        .await?;

        Ok(TokenPair {
            access_token: self.encode(&access)?,
            refresh_token: self.encode(&refresh)?,
            expires_in: self.config.access_token_expiration.as_secs(),
            refresh_expires_in: self.config.refresh_token_expiration.as_secs(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_taken() -> ApiError {
    ApiError::InvalidFields(FieldErrors::single(
        "email",
        "unique",
        "The email has already been taken.",
    ))
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Expected a {expected} token but received a {found} token")]
    WrongTokenType {
        expected: TokenType,
        found: TokenType,
    },

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<DbErr> for AuthError {
    fn from(err: DbErr) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            Self::MissingToken => "AUTH_MISSING_TOKEN",
            Self::InvalidToken => "AUTH_INVALID_TOKEN",
            Self::TokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::WrongTokenType { .. } => "AUTH_WRONG_TOKEN_TYPE",
            Self::RevokedToken => "AUTH_REVOKED_TOKEN",
            Self::UserNotFound => "AUTH_USER_NOT_FOUND",
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                "AUTH_INTERNAL_ERROR"
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::MissingToken => "No authentication token provided".to_string(),
            Self::InvalidToken => "Invalid authentication token".to_string(),
            Self::TokenExpired => "Token has expired".to_string(),
            Self::WrongTokenType { .. } => self.to_string(),
            Self::RevokedToken => "Authentication token has been revoked".to_string(),
            Self::UserNotFound => "User not found".to_string(),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                "Authentication failed due to an internal error".to_string()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "authentication failed internally");
        }

        let body = Json(serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            },
            "request_id": crate::tracing::current_request_id().map(|id| id.0),
        }));

        (status, body).into_response()
    }
}

/// Reads `Authorization: Bearer <token>`; a present but malformed header yields `Some("")`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok().unwrap_or("");
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => Some(token.trim()),
        _ => Some(""),
    }
}

/// Authentication middleware that validates the bearer access token
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    let result = match bearer_token(request.headers()) {
        None => Err(AuthError::MissingToken),
        Some("") => Err(AuthError::InvalidToken),
        Some(token) => auth_service.authenticate(Some(token)).await,
    };

    match result.and_then(AuthUser::try_from) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            debug!(code = e.code(), "request rejected by auth middleware");
            e.into_response()
        }
    }
}

/// Extension methods to put routes behind [`auth_middleware`]
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.route_layer(axum::middleware::from_fn(auth_middleware))
    }
}

impl<S> AuthRouterExt for MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.route_layer(axum::middleware::from_fn(auth_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> AuthService {
        let config = AuthConfig::new(
            "unit-test-secret-unit-test-secret-unit-test-secret-unit-test-secret".to_string(),
            "catalog-api".to_string(),
            "catalog-auth".to_string(),
            Duration::from_secs(900),
            Duration::from_secs(86_400),
        );
        AuthService::new(config, Arc::new(DatabaseConnection::Disconnected))
    }

    fn account() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn access_token_round_trips_through_inspect() {
        let svc = service();
        let user = account();
        let claims = svc
            .sign(&user, TokenType::Access, Utc::now(), Duration::from_secs(60))
            .unwrap();
        let token = svc.encode(&claims).unwrap();

        let checked = svc.inspect(Some(&token)).require(TokenType::Access).unwrap();
        assert_eq!(checked.sub, user.id.to_string());
        assert_eq!(checked.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn refresh_token_carries_no_profile() {
        let svc = service();
        let claims = svc
            .sign(&account(), TokenType::Refresh, Utc::now(), Duration::from_secs(60))
            .unwrap();
        assert!(claims.name.is_none());
        assert!(claims.email.is_none());
    }

    #[test]
    fn wrong_type_is_reported() {
        let svc = service();
        let claims = svc
            .sign(&account(), TokenType::Refresh, Utc::now(), Duration::from_secs(60))
            .unwrap();
        let token = svc.encode(&claims).unwrap();

        let err = svc.inspect(Some(&token)).require(TokenType::Access).unwrap_err();
        assert_matches!(
            err,
            AuthError::WrongTokenType {
                expected: TokenType::Access,
                found: TokenType::Refresh
            }
        );
        assert_eq!(err.code(), "AUTH_WRONG_TOKEN_TYPE");
    }

    #[test]
    fn expired_and_garbage_tokens_are_classified() {
        let svc = service();
        let issued = Utc::now() - ChronoDuration::hours(3);
        let claims = svc
            .sign(&account(), TokenType::Access, issued, Duration::from_secs(60))
            .unwrap();
        let token = svc.encode(&claims).unwrap();

        assert_eq!(svc.inspect(Some(&token)), TokenCheck::Expired);
        assert_eq!(svc.inspect(Some("not.a.jwt")), TokenCheck::Invalid);
        assert_eq!(svc.inspect(Some("   ")), TokenCheck::Missing);
        assert_eq!(svc.inspect(None), TokenCheck::Missing);
    }

    #[test]
    fn token_from_another_issuer_is_invalid() {
        let svc = service();
        let mut other = service();
        other.config.jwt_issuer = "someone-else".to_string();
        let claims = other
            .sign(&account(), TokenType::Access, Utc::now(), Duration::from_secs(60))
            .unwrap();
        let token = other.encode(&claims).unwrap();

        assert_eq!(svc.inspect(Some(&token)), TokenCheck::Invalid);
    }

    #[test]
    fn error_codes_and_statuses() {
        assert_eq!(AuthError::TokenExpired.code(), "AUTH_TOKEN_EXPIRED");
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::DatabaseError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::DatabaseError("x".into()).code(),
            "AUTH_INTERNAL_ERROR"
        );
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some(""));
    }
}
