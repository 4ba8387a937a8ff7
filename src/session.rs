use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{error::SessionError, test::test_config::TestConfig};

const SESSION_FILE: &str = "session.json";

/// Parameters of the running test, kept on disk so that a later `status` or
/// `stop` invocation can recover them.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, conf: &TestConfig) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io(e))?;
        }
        let json = serde_json::to_string_pretty(conf)?;
        fs::write(&self.path, json).map_err(|e| self.io(e))
    }

    /// `Ok(None)` when no session has been recorded.
    pub fn load(&self) -> Result<Option<TestConfig>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io(e)),
        }
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io(e)),
        }
    }

    fn io(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
