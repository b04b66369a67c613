use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::session::Session;

/// Holds the authenticated session. `login` is the only way in and `logout`
/// (or token expiry) the only way out; every authenticated call receives the
/// session explicitly through [`SessionStore::require`].
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    file: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(None),
            file: None,
        }
    }

    /// Store mirrored to `path`; a previously saved session is restored.
    pub fn with_file(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let restored = load_from_file(&path)?;
        if restored.is_some() {
            info!(target: "app::session", path = %path.display(), "session restored");
        }
        Ok(Self {
            current: RwLock::new(restored),
            file: Some(path),
        })
    }

    pub fn login(&self, session: Session) -> AppResult<()> {
        if let Some(path) = &self.file {
            save_to_file(path, &session)?;
        }
        info!(target: "app::session", user_id = %session.user.id, "session started");
        *self.write() = Some(session);
        Ok(())
    }

    pub fn logout(&self) -> AppResult<()> {
        let previous = self.write().take();
        if let Some(path) = &self.file {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        if let Some(session) = previous {
            info!(target: "app::session", user_id = %session.user.id, "session ended");
        }
        Ok(())
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    /// Same check as [`SessionStore::require`], including expiry teardown.
    pub fn is_authenticated(&self) -> bool {
        self.require().is_ok()
    }

    /// Returns the session or a local authentication error, without any
    /// network traffic. Expired sessions are torn down here.
    pub fn require(&self) -> AppResult<Session> {
        let session = self.current().ok_or_else(AppError::unauthenticated)?;
        if session.is_expired_at(Utc::now()) {
            debug!(target: "app::session", user_id = %session.user.id, "token expired");
            if let Err(err) = self.logout() {
                warn!(target: "app::session", error = %err, "failed to clear expired session");
            }
            return Err(AppError::unauthenticated());
        }
        Ok(session)
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_from_file(path: &Path) -> AppResult<Option<Session>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => Ok(Some(session)),
        Err(err) => {
            warn!(
                target: "app::session",
                path = %path.display(),
                error = %err,
                "discarding unreadable session file"
            );
            Ok(None)
        }
    }
}

fn save_to_file(path: &Path, session: &Session) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(path, json)?;
    Ok(())
}
