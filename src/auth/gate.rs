//! Authorization gate
//!
//! Mutating routes take an [`Authenticated`] argument. Extraction fails with
//! a redirect to the login page unless the request carries a live session;
//! the resolved identity is handed to the handler as a value.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::Method;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use log::{debug, warn};
use std::sync::Arc;

use crate::client::{Actor, ClientAddr};
use crate::error::{AuthError, FileManagerError};
use crate::session::SessionStore;
use crate::session::cookie::session_token;

/// Routes that modify the file tree.
pub const ACTION_ROUTES: [&str; 3] = ["/upload", "/create-folder", "/delete"];

/// Session check shared by every protected route.
#[derive(Debug, Clone)]
pub struct AuthGate {
    sessions: Arc<SessionStore>,
}

impl AuthGate {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    /// Returns the username of the live session behind `token`.
    ///
    /// Once a session is confirmed the request is forwarded regardless of
    /// method or route; the action-route classification below only affects
    /// logging.
    pub async fn check(
        &self,
        token: Option<&str>,
        method: &Method,
        path: &str,
    ) -> Result<String, AuthError> {
        let token = token.ok_or(AuthError::Unauthorized)?;
        let session = self
            .sessions
            .validate(token)
            .await
            .ok_or(AuthError::Unauthorized)?;

        if method == Method::POST && ACTION_ROUTES.iter().any(|route| path.starts_with(route)) {
            debug!("Action {} {} by {}", method, path, session.username);
        } else {
            debug!("Forwarding {} {} by {}", method, path, session.username);
        }
        Ok(session.username)
    }
}

/// Identity of a request that passed the [`AuthGate`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub Actor);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    AuthGate: FromRef<S>,
{
    type Rejection = FileManagerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = AuthGate::from_ref(state);
        let Ok(client_addr) = ClientAddr::from_request_parts(parts, state).await;
        let token = session_token(&CookieJar::from_headers(&parts.headers));

        match gate
            .check(token.as_deref(), &parts.method, parts.uri.path())
            .await
        {
            Ok(username) => Ok(Authenticated(Actor::user(username, client_addr))),
            Err(e) => {
                warn!(
                    "Unauthorized {} {} from {}",
                    parts.method,
                    parts.uri.path(),
                    client_addr
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode, header};
    use axum::response::IntoResponse;
    use std::time::Duration;

    fn gate() -> (AuthGate, Arc<SessionStore>) {
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(3600)));
        (AuthGate::new(Arc::clone(&sessions)), sessions)
    }

    #[tokio::test]
    async fn missing_or_unknown_token_is_unauthorized() {
        let (gate, _) = gate();
        assert!(matches!(
            gate.check(None, &Method::POST, "/upload").await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            gate.check(Some("forged"), &Method::POST, "/upload").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn valid_session_forwards_on_every_method_and_route() {
        let (gate, sessions) = gate();
        let token = sessions.create("alice").await.token;
        for (method, path) in [
            (Method::POST, "/upload"),
            (Method::POST, "/delete"),
            (Method::GET, "/create-folder"),
            (Method::POST, "/somewhere-else"),
            (Method::PUT, "/"),
        ] {
            assert_eq!(
                gate.check(Some(&token), &method, path).await.unwrap(),
                "alice",
                "{method} {path}"
            );
        }
    }

    #[tokio::test]
    async fn logged_out_token_is_rejected() {
        let (gate, sessions) = gate();
        let token = sessions.create("alice").await.token;
        sessions.invalidate(&token).await;
        assert!(gate.check(Some(&token), &Method::POST, "/delete").await.is_err());
    }

    #[tokio::test]
    async fn extractor_yields_actor_or_login_redirect() {
        let (gate, sessions) = gate();
        let token = sessions.create("bob").await.token;

        let request = Request::post("/delete")
            .header(header::COOKIE, format!("session_token={token}"))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let Authenticated(actor) = Authenticated::from_request_parts(&mut parts, &gate)
            .await
            .unwrap();
        assert_eq!(actor.username(), Some("bob"));

        let (mut parts, _) = Request::post("/delete").body(()).unwrap().into_parts();
        let rejection = Authenticated::from_request_parts(&mut parts, &gate)
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(rejection.status(), StatusCode::SEE_OTHER);
        assert_eq!(rejection.headers()[header::LOCATION], "/login");
    }
}
