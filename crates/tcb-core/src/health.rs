//! File-based health marker polled by container health checks.

use std::path::PathBuf;

use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthState {
    Starting,
    Running,
    Stopping,
}

impl HealthState {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Starting => "starting",
            HealthState::Running => "running",
            HealthState::Stopping => "stopping",
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthMarker {
    path: PathBuf,
}

impl HealthMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn set(&self, state: HealthState) -> Result<()> {
        std::fs::write(&self.path, state.as_str())?;
        tracing::debug!(
            path = %self.path.display(),
            state = state.as_str(),
            "health marker updated"
        );
        Ok(())
    }

    /// Best-effort variant for shutdown and error paths.
    pub fn set_quiet(&self, state: HealthState) {
        if let Err(e) = self.set(state) {
            tracing::warn!(path = %self.path.display(), "failed to write health marker: {e}");
        }
    }

    /// Remove the marker; a missing file is not an error.
    pub fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to remove health marker: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tcb-health-{}-{name}", std::process::id()))
    }

    #[test]
    fn writes_state_and_removes() {
        let path = temp_path("cycle");
        let marker = HealthMarker::new(&path);

        marker.set(HealthState::Starting).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "starting");
        marker.set(HealthState::Running).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "running");

        marker.remove();
        assert!(!path.exists());
        // Second removal is a no-op.
        marker.remove();
    }

    #[test]
    fn set_fails_for_missing_directory() {
        let marker = HealthMarker::new(temp_path("missing-dir").join("nested").join("marker"));
        assert!(marker.set(HealthState::Running).is_err());
    }
}
