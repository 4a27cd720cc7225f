//! Authentication service
//!
//! Registration, login and token refresh. Passwords are hashed with
//! bcrypt; sessions use short-lived access tokens plus refresh tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
}

/// User record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub token_use: String,
    pub exp: i64,
    pub iat: i64,
}

/// Input for registration
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Input for login
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for token refresh
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Issued token pair
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Login/registration response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a new user
    pub async fn register(&self, jwt: &JwtConfig, input: RegisterInput) -> AppResult<AuthResponse> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation {
                field: "email".to_string(),
                message: "a valid email address is required".to_string(),
            });
        }
        if input.password.len() < 8 {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: "password must be at least 8 characters".to_string(),
            });
        }

        let exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
                .bind(&email)
                .fetch_one(&self.db)
                .await?;
        if exists > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, full_name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, full_name, created_at
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(&input.full_name)
        .fetch_one(&self.db)
        .await?;

        let tokens = issue_token_pair(jwt, user.id, &user.email)?;
        Ok(AuthResponse {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            tokens,
        })
    }

    /// Authenticate a user with email and password
    pub async fn login(&self, jwt: &JwtConfig, input: LoginInput) -> AppResult<AuthResponse> {
        let email = input.email.trim().to_lowercase();

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, full_name, created_at FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = bcrypt::verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = issue_token_pair(jwt, user.id, &user.email)?;
        Ok(AuthResponse {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            tokens,
        })
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, jwt: &JwtConfig, input: RefreshInput) -> AppResult<TokenPair> {
        let claims = decode::<Claims>(
            &input.refresh_token,
            &DecodingKey::from_secret(jwt.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?
        .claims;

        if claims.token_use != "refresh" {
            return Err(AppError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        // User must still exist
        let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::InvalidToken)?;

        issue_token_pair(jwt, user_id, &email)
    }
}

/// Issue an access/refresh token pair for a user
fn issue_token_pair(jwt: &JwtConfig, user_id: Uuid, email: &str) -> AppResult<TokenPair> {
    let now = Utc::now().timestamp();

    let access_claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_use: "access".to_string(),
        exp: now + jwt.access_token_expiry,
        iat: now,
    };
    let refresh_claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_use: "refresh".to_string(),
        exp: now + jwt.refresh_token_expiry,
        iat: now,
    };

    let key = EncodingKey::from_secret(jwt.secret.as_bytes());
    let access_token = encode(&Header::default(), &access_claims, &key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
    let refresh_token = encode(&Header::default(), &refresh_claims, &key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: jwt.access_token_expiry,
    })
}
