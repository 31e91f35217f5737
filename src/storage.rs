use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::models::Conversation;

pub type SessionHandle = Arc<Mutex<Conversation>>;

struct Session {
  handle: SessionHandle,
  last_used: Instant,
}

impl Session {
  // a turn holds a clone of the handle while it runs
  fn in_use(&self) -> bool {
    Arc::strong_count(&self.handle) > 1
  }
}

pub struct SessionStore {
  sessions: Mutex<HashMap<String, Session>>,
  max_sessions: usize,
  idle: Duration,
}

impl Default for SessionStore {
  fn default() -> Self {
    Self::from_config(&AppConfig::default())
  }
}

impl SessionStore {
  pub fn from_config(config: &AppConfig) -> Self {
    Self::with_limits(config.max_sessions, Duration::from_secs(config.session_idle_secs))
  }

  pub fn with_limits(max_sessions: usize, idle: Duration) -> Self {
    Self {
      sessions: Mutex::default(),
      max_sessions: max_sessions.max(1),
      idle,
    }
  }

  /// Returns the named session, or a new empty one under a fresh id when the
  /// id is absent, unknown or expired.
  pub async fn open(&self, id: Option<&str>) -> (String, SessionHandle) {
    let mut sessions = self.sessions.lock().await;
    if let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) {
      if let Some(session) = sessions.get_mut(id) {
        session.last_used = Instant::now();
        return (id.to_string(), session.handle.clone());
      }
    }

    self.evict(&mut sessions);
    let id = uuid::Uuid::new_v4().to_string();
    let handle: SessionHandle = Arc::default();
    sessions.insert(
      id.clone(),
      Session {
        handle: handle.clone(),
        last_used: Instant::now(),
      },
    );
    (id, handle)
  }

  fn evict(&self, sessions: &mut HashMap<String, Session>) {
    sessions.retain(|_, s| s.in_use() || s.last_used.elapsed() < self.idle);
    while sessions.len() >= self.max_sessions {
      let oldest = sessions
        .iter()
        .filter(|(_, s)| !s.in_use())
        .min_by_key(|(_, s)| s.last_used)
        .map(|(id, _)| id.clone());
      match oldest {
        Some(id) => {
          sessions.remove(&id);
        }
        None => break,
      }
    }
  }

  pub async fn get(&self, id: &str) -> Option<SessionHandle> {
    let mut sessions = self.sessions.lock().await;
    let session = sessions.get_mut(id)?;
    session.last_used = Instant::now();
    Some(session.handle.clone())
  }

  pub async fn clear(&self, id: &str) -> bool {
    let Some(handle) = self.get(id).await else {
      return false;
    };
    handle.lock().await.clear();
    true
  }

  pub async fn len(&self) -> usize {
    self.sessions.lock().await.len()
  }
}
