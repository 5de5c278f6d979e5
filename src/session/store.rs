use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::session::session_model::SessionContext;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed session storage. Written at sign-in, removed at sign-out.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session. A missing file is an empty session, not an error.
    pub fn load(&self) -> Result<SessionContext, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SessionContext::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&content).map_err(|source| SessionError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, session: &SessionContext) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|source| SessionError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the stored session. Clearing an absent session succeeds.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
