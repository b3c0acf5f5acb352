//! Identity propagation. Credential verification happens upstream;
//! this layer only issues and verifies signed session tokens.
use std::collections::HashMap;

use futures::lock::Mutex;
use hyper::Method;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::{id, sign, verify};
use crate::{api, validators};

#[derive(Clone, Debug)]
pub struct Session {
    pub key: Uuid,
    pub username: String,
}

impl Session {
    pub fn new(username: &str) -> Session {
        Session {
            key: id(),
            username: username.to_string(),
        }
    }

    pub fn token(&self) -> String {
        let mut token = base64::encode(self.key.as_bytes());
        let signed = sign(&token);
        token.push('.');
        token.push_str(&signed);
        token
    }

    pub fn verify(token: &str) -> Option<Uuid> {
        let mut iter = token.split('.');
        let key = iter.next()?;
        let sign = iter.next()?;
        verify(key, sign)?;
        let key = base64::decode(key).ok()?;
        Uuid::from_slice(key.as_slice()).ok()
    }
}

pub struct SessionMap {
    inner: Mutex<HashMap<Uuid, Session>>,
}

static SESSION_MAP: OnceCell<SessionMap> = OnceCell::new();

impl SessionMap {
    pub fn new() -> SessionMap {
        SessionMap {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn start(&self, username: &str) -> Session {
        let mut inner = self.inner.lock().await;
        let session = Session::new(username);
        inner.insert(session.key, session.clone());
        session
    }

    pub async fn get_session(&self, key: &Uuid) -> Option<Session> {
        let inner = self.inner.lock().await;
        inner.get(key).cloned()
    }

    pub async fn end(&self, key: &Uuid) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        inner.remove(key)
    }

    pub fn get() -> &'static SessionMap {
        SESSION_MAP.get_or_init(SessionMap::new)
    }
}

fn get_cookie(value: &hyper::header::HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?;
    regex!(r#"\bsession=([^;\s]+)"#)
        .captures(value)?
        .get(1)
        .map(|m| m.as_str())
}

async fn token_session(token: &str) -> Option<Session> {
    let key = Session::verify(token)?;
    SessionMap::get().get_session(&key).await
}

pub async fn authenticate(req: &api::Request) -> Result<Session, AppError> {
    use hyper::header::{AUTHORIZATION, COOKIE};

    let headers = req.headers();
    if let Some(token) = headers.get(AUTHORIZATION) {
        let token = token.to_str().map_err(|_| AppError::Unauthenticated)?;
        return token_session(token).await.ok_or(AppError::Unauthenticated);
    }
    let cookie_value = headers
        .get(COOKIE)
        .and_then(get_cookie)
        .ok_or(AppError::Unauthenticated)?;
    token_session(cookie_value).await.ok_or(AppError::Unauthenticated)
}

/// WebSocket handshakes carry the token in the query string, since
/// browsers cannot set headers on an upgrade request.
pub async fn authenticate_with_token(req: &api::Request, token: Option<&str>) -> Result<Session, AppError> {
    if let Some(token) = token {
        return token_session(token).await.ok_or(AppError::Unauthenticated);
    }
    authenticate(req).await
}

#[derive(Deserialize, Debug)]
pub struct LoginForm {
    pub username: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LoginReturn {
    username: String,
    token: String,
}

async fn login(req: api::Request) -> api::AppResult {
    let LoginForm { username } = api::parse_body(req).await?;
    let username = username.trim();
    validators::USERNAME.run(username)?;
    let session = SessionMap::get().start(username).await;
    let token = session.token();
    log::info!("a session was started for {}", username);
    api::Return::new(&LoginReturn {
        username: session.username,
        token,
    })
    .build()
}

async fn logout(req: api::Request) -> api::AppResult {
    let session = authenticate(&req).await?;
    SessionMap::get().end(&session.key).await;
    api::Return::new(&true).build()
}

pub async fn router(req: api::Request, path: &str) -> api::AppResult {
    match (path, req.method().clone()) {
        ("/login", Method::POST) => login(req).await,
        ("/logout", Method::GET) => logout(req).await,
        _ => Err(AppError::missing()),
    }
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn test_session_sign() {
        std::env::set_var("SECRET", "just a test secret");
        let session = Session::new("orange");
        let token = session.token();
        assert_eq!(Session::verify(""), None);
        let key = Session::verify(&token).unwrap();
        assert_eq!(key, session.key);
    }

    #[tokio::test]
    async fn test_session_map() {
        std::env::set_var("SECRET", "just a test secret");
        let map = super::SessionMap::new();
        let session = map.start("orange").await;
        let found = map.get_session(&session.key).await.unwrap();
        assert_eq!(found.username, "orange");
        map.end(&session.key).await;
        assert!(map.get_session(&session.key).await.is_none());
    }
}
