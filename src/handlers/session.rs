//! Login, logout and session probing.

use askama::Template;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use axum_extra::extract::cookie::CookieJar;
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;

use crate::client::ClientAddr;
use crate::error::FileManagerError;
use crate::listing::LoginTemplate;
use crate::server::state::AppState;
use crate::session::cookie::{cleared_cookie, session_cookie, session_token};

const LOGOUT_ROUTE: &str = "/logout";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_page() -> Result<Html<String>, FileManagerError> {
    Ok(Html(LoginTemplate::new().render()?))
}

pub async fn login(
    State(state): State<AppState>,
    client: ClientAddr,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, FileManagerError> {
    let authenticator = Arc::clone(&state.authenticator);
    let username = form.username.clone();
    let password = form.password;
    let accepted =
        tokio::task::spawn_blocking(move || authenticator.authenticate(&username, &password))
            .await?;

    if !accepted {
        warn!(
            "Authentication failed for user: {} from IP: {}",
            form.username, client
        );
        return Ok(Html(LoginTemplate::failed().render()?).into_response());
    }

    let session = state.sessions.create(&form.username).await;
    info!("User {} logged in from IP: {}", form.username, client);
    let jar = jar.add(session_cookie(&session, state.settings.secure_cookies));
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    client: ClientAddr,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let target = logout_target(&headers);
    match session_token(&jar) {
        Some(token) => {
            state.sessions.invalidate(&token).await;
            info!("User logged out from IP: {}", client);
            let jar = jar.add(cleared_cookie(state.settings.secure_cookies));
            (jar, Redirect::to(&target)).into_response()
        }
        None => Redirect::to(&target).into_response(),
    }
}

/// Path of a same-site `Referer`, unless it is the logout route itself.
fn logout_target(headers: &HeaderMap) -> String {
    let Some(referer) = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
    else {
        return "/".to_string();
    };

    if let Some(authority) = referer.authority() {
        let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
        if host != Some(authority.as_str()) {
            return "/".to_string();
        }
    }

    let path = referer.path();
    if path.is_empty() || path == LOGOUT_ROUTE || !path.starts_with('/') || path.starts_with("//")
    {
        return "/".to_string();
    }
    path.to_string()
}

pub async fn check_session(State(state): State<AppState>, jar: CookieJar) -> StatusCode {
    match session_token(&jar) {
        Some(token) if state.sessions.validate(&token).await.is_some() => StatusCode::OK,
        _ => StatusCode::UNAUTHORIZED,
    }
}
