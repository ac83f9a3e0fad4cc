#![cfg(not(tarpaulin_include))]

#[cfg(feature = "web")]
use crate::app::AppState;
use crate::config::{Role, UserEntry};
use crate::error::ValidationError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
#[cfg(feature = "web")]
use axum::{
    Form,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
#[cfg(feature = "web")]
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use log::{info, warn};
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(feature = "web")]
use std::sync::Arc;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Name of the cookie carrying the session ID
pub const SESSION_COOKIE: &str = "session";

const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Credential data posted by the login form
#[derive(Debug, Deserialize)]
pub struct UserCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Check a username/password pair against the configured accounts
///
/// # Errors
/// * `MissingCredentials` if either field is empty
/// * `BadCredentials` if no account matches
pub fn authenticate<'a>(
    users: &'a [UserEntry],
    username: &str,
    password: &str,
) -> Result<&'a UserEntry, ValidationError> {
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }

    users
        .iter()
        .find(|u| u.username == username && verify_password(password, &u.password_hash))
        .ok_or(ValidationError::BadCredentials)
}

/// Hash a password using Argon2 with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored hash; malformed hashes never match
fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Everything the server remembers about one logged-in browser
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub expires_at: SystemTime,
    /// Code shown on the edit page; drawn on first visit
    pub editor_code: Option<u32>,
    pub editor_unlocked: bool,
}

impl Session {
    pub fn new(username: &str, role: Role) -> Self {
        Session {
            username: username.to_string(),
            role,
            expires_at: SystemTime::now() + Duration::from_secs(SESSION_DURATION),
            editor_code: None,
            editor_unlocked: false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= SystemTime::now()
    }

    /// The six-digit code gating the editor, drawn once per session
    pub fn editor_code(&mut self) -> u32 {
        *self
            .editor_code
            .get_or_insert_with(|| rand::thread_rng().gen_range(100_000..=999_999))
    }

    /// Unlock the editor if `entered` repeats the displayed code
    pub fn unlock_editor(&mut self, entered: &str) -> Result<(), ValidationError> {
        let entered = entered.trim();
        if entered.is_empty() {
            return Err(ValidationError::WrongCode);
        }
        match (self.editor_code, entered.parse::<u32>()) {
            (Some(code), Ok(n)) if code == n => {
                self.editor_unlocked = true;
                Ok(())
            }
            _ => Err(ValidationError::WrongCode),
        }
    }

    /// Close the editor; the next visit shows a new code
    pub fn finish_editing(&mut self) {
        self.editor_unlocked = false;
        self.editor_code = None;
    }
}

/// Active sessions keyed by session ID
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session and return its ID
    pub fn create(&self, username: &str, role: Role) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, s| !s.is_expired());
        sessions.insert(session_id.clone(), Session::new(username, role));
        session_id
    }

    /// A copy of the session if it exists and has not expired
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .cloned()
    }

    /// Change a live session in place
    pub fn update<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions
            .get_mut(session_id)
            .filter(|s| !s.is_expired())
            .map(f)
    }

    pub fn remove(&self, session_id: &str) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_id)
    }
}

/// The logged-in session behind a request
///
/// Extraction fails with a redirect to the login page when the cookie is
/// missing, unknown or expired.
#[cfg(feature = "web")]
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: String,
    pub session: Session,
}

#[cfg(feature = "web")]
#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| {
                state.sessions.get(cookie.value()).map(|session| CurrentSession {
                    id: cookie.value().to_string(),
                    session,
                })
            })
            .ok_or_else(|| Redirect::to("/"))
    }
}

/// Handle login form submissions
///
/// Valid credentials start a session and set the session cookie; anything
/// else goes back to the login page with the reason in the query string.
#[cfg(feature = "web")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> Response {
    match authenticate(&state.users, &credentials.username, &credentials.password) {
        Ok(user) => {
            let session_id = state.sessions.create(&user.username, user.role);
            info!("user '{}' logged in", user.username);
            let cookie = Cookie::build((SESSION_COOKIE, session_id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Err(e) => {
            warn!("failed login for '{}': {}", credentials.username, e);
            Redirect::to(&format!("/?error={}", urlencoding::encode(&e.to_string())))
                .into_response()
        }
    }
}

/// Handle user logout
///
/// Drops the server-side session and clears the cookie.
#[cfg(feature = "web")]
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = state.sessions.remove(cookie.value()) {
            info!("user '{}' logged out", session.username);
        }
    }
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}
