use crate::{
    auth::{
        generate_opaque_token, hash_password_blocking, refresh_cookie, removal_cookie,
        verify_password_blocking, AccessTokenResponse, AuthResponse, ForgotPasswordRequest,
        LoginRequest, RegisterRequest, ResetPasswordRequest, TokenRequest, REFRESH_COOKIE,
    },
    error::AppError,
    mail::Email,
    models::{normalize_email, User},
    response::{respond, Envelope},
    state::AppState,
    store::EMAIL_TAKEN,
};
use actix_web::{get, http::StatusCode, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

/// Reported for every credential mismatch so callers cannot probe which part was wrong.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(INVALID_CREDENTIALS.into())
}

/// Mail delivery is best effort: a failure is logged, the request still succeeds.
async fn send_mail(state: &AppState, email: Email) {
    if let Err(e) = state.mailer.send(&email).await {
        log::warn!("Could not send \"{}\" to {}: {}", email.subject, email.to, e);
    }
}

/// Issues an access token in the body and a refresh token cookie.
fn start_session(state: &AppState, user: User) -> Result<HttpResponse, AppError> {
    let token = state.tokens.generate_access_token(user.id)?;
    let refresh = state.tokens.generate_refresh_token(user.id)?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(
            refresh,
            state.tokens.refresh_ttl(),
            state.config.cookie_secure,
        ))
        .json(Envelope::new(StatusCode::OK, AuthResponse { user, token })))
}

/// Register a new user with email and password
///
/// The account starts unverified; a verification link is emailed to the address.
///
/// ## Responses:
/// - `201 Created`: `{ user }`
/// - `400 Bad Request`: per-field validation errors
/// - `409 Conflict`: the email is already registered
#[post("/register/basic")]
pub async fn register_basic(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let RegisterRequest { email, password } = payload.into_inner();
    let email = normalize_email(&email);

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("email", EMAIL_TAKEN));
    }

    let password_hash = hash_password_blocking(password, state.config.bcrypt_cost).await?;
    let verification_token = generate_opaque_token();
    let user = User::new_basic(&email, password_hash, verification_token.clone());

    // A concurrent registration can still win the race; the store reports it as a conflict.
    state.users.insert(&user).await?;
    log::info!("Registered user {}", user.id);

    send_mail(
        &state,
        Email::verification(&user.email, &state.config.frontend_url, &verification_token),
    )
    .await;

    Ok(respond(StatusCode::CREATED, json!({ "user": user })))
}

/// Confirm an email address with the token from the verification mail
///
/// ## Responses:
/// - `202 Accepted`: `{ user }`
/// - `401 Unauthorized`: missing, unknown or already used token
#[post("/verify")]
pub async fn verify_email(
    state: web::Data<AppState>,
    payload: web::Json<TokenRequest>,
) -> Result<HttpResponse, AppError> {
    let invalid_token = || AppError::Unauthorized("Invalid verification token".into());

    // An empty token is just another token that matches nobody.
    if payload.token.trim().is_empty() {
        return Err(invalid_token());
    }

    let mut user = state
        .users
        .find_by_verification_token(&payload.token)
        .await?
        .ok_or_else(invalid_token)?;

    user.mark_verified();
    state.users.update(&user).await?;
    log::info!("Verified email of user {}", user.id);

    Ok(respond(StatusCode::ACCEPTED, json!({ "user": user })))
}

/// Login with email and password
///
/// ## Responses:
/// - `200 OK`: `{ user, token }` plus the `refreshToken` cookie
/// - `400 Bad Request`: malformed payload
/// - `401 Unauthorized`: wrong credentials or unverified email, reported on `errors.form`
#[post("/login/basic")]
pub async fn login_basic(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let LoginRequest { email, password } = payload.into_inner();

    let user = state
        .users
        .find_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(invalid_credentials)?;

    // Accounts created through Facebook have no password until they reset one.
    let password_hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;
    if !verify_password_blocking(password, password_hash).await? {
        return Err(invalid_credentials());
    }

    if !user.verified {
        return Err(AppError::Unauthorized(
            "Email address has not been verified".into(),
        ));
    }

    log::info!("User {} logged in", user.id);
    start_session(&state, user)
}

/// Login with a Facebook access token
///
/// Finds the account by Facebook id, then by email (linking it), and otherwise creates one.
///
/// ## Responses:
/// - `200 OK`: `{ user, token }` plus the `refreshToken` cookie
/// - `401 Unauthorized`: Facebook rejected the token or shared no email
/// - `502 Bad Gateway`: Facebook could not be reached
#[post("/login/facebook")]
pub async fn login_facebook(
    state: web::Data<AppState>,
    payload: web::Json<TokenRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let profile = state.facebook.fetch_profile(&payload.token).await?;
    let email = profile
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Facebook account has no email address".into())
        })?;

    let user = match state.users.find_by_facebook_id(&profile.id).await? {
        Some(user) => user,
        None => match state.users.find_by_email(&email).await? {
            Some(mut user) => {
                user.link_facebook(&profile.id);
                state.users.update(&user).await?;
                log::info!("Linked Facebook account to user {}", user.id);
                user
            }
            None => {
                let user = User::new_facebook(&email, &profile.id);
                state.users.insert(&user).await?;
                log::info!("Registered user {} through Facebook", user.id);
                user
            }
        },
    };

    start_session(&state, user)
}

/// Exchange the refresh token cookie for a new access token
///
/// The cookie is re-issued with a fresh expiry.
///
/// ## Responses:
/// - `200 OK`: `{ token }`
/// - `401 Unauthorized`: missing, invalid or expired refresh token
#[get("/refresh_token")]
pub async fn refresh_token(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let cookie = req
        .cookie(REFRESH_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".into()))?;
    let claims = state.tokens.verify_refresh_token(cookie.value())?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".into()))?;

    let token = state.tokens.generate_access_token(user.id)?;
    let refresh = state.tokens.generate_refresh_token(user.id)?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(
            refresh,
            state.tokens.refresh_ttl(),
            state.config.cookie_secure,
        ))
        .json(Envelope::new(StatusCode::OK, AccessTokenResponse { token })))
}

/// Logout: drop the refresh token cookie
#[get("/logout")]
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(state.config.cookie_secure))
        .json(Envelope::new(StatusCode::OK, json!({ "loggedOut": true })))
}

/// Send a password reset link
///
/// Answers 200 whether or not the address is registered.
#[post("/password/forgot")]
pub async fn forgot_password(
    state: web::Data<AppState>,
    payload: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    match state.users.find_by_email(&normalize_email(&payload.email)).await? {
        Some(mut user) => {
            let token = generate_opaque_token();
            user.issue_reset_token(token.clone());
            state.users.update(&user).await?;
            log::info!("Issued password reset token for user {}", user.id);

            send_mail(
                &state,
                Email::password_reset(&user.email, &state.config.frontend_url, &token),
            )
            .await;
        }
        None => log::info!("Password reset requested for an unknown address"),
    }

    Ok(respond(
        StatusCode::OK,
        json!({ "message": "If the address is registered, a reset link has been sent" }),
    ))
}

/// Set a new password using the token from the reset mail
///
/// ## Responses:
/// - `202 Accepted`: `{ user }`
/// - `400 Bad Request`: the new password is too weak
/// - `401 Unauthorized`: unknown or expired token
#[post("/password/reset")]
pub async fn reset_password(
    state: web::Data<AppState>,
    payload: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let ResetPasswordRequest { token, password } = payload.into_inner();
    let invalid_token = || AppError::Unauthorized("Invalid or expired reset token".into());

    let mut user = state
        .users
        .find_by_reset_token(&token)
        .await?
        .ok_or_else(invalid_token)?;
    if user.reset_token_expired(Utc::now()) {
        return Err(invalid_token());
    }

    let password_hash = hash_password_blocking(password, state.config.bcrypt_cost).await?;
    user.set_password(password_hash);
    state.users.update(&user).await?;
    log::info!("Reset password of user {}", user.id);

    Ok(respond(StatusCode::ACCEPTED, json!({ "user": user })))
}
