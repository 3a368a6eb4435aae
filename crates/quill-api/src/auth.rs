use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use quill_db::models::{NewUser, decode_id, encode_time};
use quill_db::{Database, users};
use quill_types::api::{Claims, LoginRequest, LoginResponse, SignupRequest, SignupResponse};
use quill_types::validation::{normalize_email, normalize_username};

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::extract::{ValidatedJson, reply};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

/// A freshly issued credential and the user it names.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = blocking(&state, move |s| register(&s.db, &s.auth, req)).await?;

    Ok(reply(
        StatusCode::CREATED,
        "Account created!",
        SignupResponse {
            token: session.token,
            username: session.username,
            email: session.email,
        },
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = blocking(&state, move |s| authenticate(&s.db, &s.auth, req)).await?;

    Ok(reply(
        StatusCode::OK,
        &format!("welcome {}", session.username),
        LoginResponse {
            token: session.token,
            user_id: session.user_id,
        },
    ))
}

/// Creates a user and issues its first credential. Username and email are
/// compared after normalisation, so uniqueness is case-insensitive.
pub fn register(db: &Database, auth: &AuthConfig, req: SignupRequest) -> Result<Session, ApiError> {
    let username = normalize_username(&req.username);
    let email = normalize_email(&req.email);

    // Hash before taking the write lock
    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    db.with_tx(|tx| {
        if users::find_by_email(tx, &email)?.is_some() {
            return Err(ApiError::Conflict("Email already in use.".into()));
        }
        if users::find_by_username(tx, &username)?.is_some() {
            return Err(ApiError::Conflict("User already taken.".into()));
        }

        users::insert(
            tx,
            &NewUser {
                id: user_id.to_string(),
                username: username.clone(),
                email: email.clone(),
                password_hash,
                created_at: encode_time(chrono::Utc::now()),
            },
        )?;
        Ok(())
    })?;

    let token = issue_token(auth, user_id, &username)?;
    info!(%user_id, %username, "User registered");

    Ok(Session {
        user_id,
        username,
        email,
        token,
    })
}

pub fn authenticate(db: &Database, auth: &AuthConfig, req: LoginRequest) -> Result<Session, ApiError> {
    let username = normalize_username(&req.username);

    let user = db
        .with_conn(|conn| users::find_by_username(conn, &username))?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;

    if let Err(e) = verify_password(&req.password, &user.password) {
        warn!(%username, "Rejected login");
        return Err(e);
    }

    let user_id = decode_id(&user.id)?;
    let token = issue_token(auth, user_id, &user.username)?;
    info!(%user_id, %username, "User logged in");

    Ok(Session {
        user_id,
        username: user.username,
        email: user.email,
        token,
    })
}

/// Checks signature and expiry, then resolves the subject to a user that
/// still exists.
pub fn verify_credential(db: &Database, auth: &AuthConfig, token: &str) -> Result<CurrentUser, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected credential: {}", e);
        ApiError::Unauthenticated
    })?;

    let user_id = data.claims.sub;
    let user = db
        .with_conn(|conn| users::find_by_id(conn, &user_id.to_string()))?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(CurrentUser {
        id: user_id,
        username: user.username,
    })
}

pub fn issue_token(auth: &AuthConfig, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + auth.token_ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("corrupt password hash: {}", e))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::InvalidCredential)
}
