use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "chatgate_session";

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub username: String,
    pub avatar: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub access_token: String,
    pub user: UserProfile,
    pub created_at: DateTime<Utc>,
}

/// In-memory session store keyed by an opaque session id carried in a
/// cookie. Entries expire after the configured TTL.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl: Duration::seconds(ttl_seconds.max(1)),
        }
    }

    pub fn create(&self, access_token: String, user: UserProfile) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            access_token,
            user,
            created_at: Utc::now(),
        };
        self.inner.insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        let session = self.inner.get(id).map(|entry| entry.value().clone())?;
        if Utc::now() - session.created_at > self.ttl {
            drop(self.inner.remove(id));
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, id: &str) {
        self.inner.remove(id);
    }
}

/// Pulls one cookie value out of the request's Cookie header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Test User".to_string(),
            username: "tester".to_string(),
            avatar: String::new(),
        }
    }

    #[test]
    fn create_then_get_roundtrips() {
        let store = SessionStore::new(3600);
        let session = store.create("hf_token".to_string(), profile());
        let found = store.get(&session.id).expect("session should exist");
        assert_eq!(found.access_token, "hf_token");
        assert_eq!(found.user.username, "tester");
    }

    #[test]
    fn expired_sessions_are_evicted() {
        let store = SessionStore::new(1);
        let session = store.create("hf_token".to_string(), profile());
        {
            let mut entry = store.inner.get_mut(&session.id).unwrap();
            entry.created_at = Utc::now() - Duration::seconds(10);
        }
        assert!(store.get(&session.id).is_none());
        assert!(store.inner.get(&session.id).is_none());
    }

    #[test]
    fn remove_drops_the_session() {
        let store = SessionStore::new(3600);
        let session = store.create("hf_token".to_string(), profile());
        store.remove(&session.id);
        assert!(store.get(&session.id).is_none());
    }

    #[test]
    fn cookie_value_finds_the_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "other=1; chatgate_session=abc-123; theme=dark".parse().unwrap(),
        );
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE),
            Some("abc-123".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
