//! Single-instance guard: one bot process per lock file.
//!
//! Two processes polling with the same token make Telegram reject both
//! (`409 Conflict`), and two schedulers would double-post.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use crate::{errors::Error, Result};

/// A lock file without a readable pid younger than this is treated as held.
const UNREADABLE_GRACE: Duration = Duration::from_secs(10);

/// Held for the lifetime of the process; the lock file is removed on drop.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        Self::acquire_with(path.as_ref(), std::process::id(), pid_alive, UNREADABLE_GRACE)
    }

    fn acquire_with(
        path: &Path,
        pid: u32,
        is_alive: impl Fn(u32) -> bool,
        grace: Duration,
    ) -> Result<Self> {
        // One retry: the first attempt may find a stale lock and remove it.
        for _ in 0..2 {
            match publish_pid(path, pid) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), pid, "instance lock acquired");
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let holder = fs::read_to_string(path)
                        .ok()
                        .and_then(|s| s.trim().parse::<u32>().ok());
                    let held = match holder {
                        Some(other) => other != pid && is_alive(other),
                        None => modified_within(path, grace),
                    };
                    if held {
                        return Err(Error::AlreadyRunning(format!(
                            "another bot instance ({}) holds {}",
                            holder.map_or("pid unknown".to_string(), |p| format!("pid {p}")),
                            path.display()
                        )));
                    }
                    tracing::warn!(
                        path = %path.display(),
                        ?holder,
                        "removing stale instance lock"
                    );
                    match fs::remove_file(path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::AlreadyRunning(format!(
            "could not acquire {}",
            path.display()
        )))
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Write the pid to a private file, then hard-link it into place, so the
/// lock path never exists without a pid in it.
fn publish_pid(path: &Path, pid: u32) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{pid}.tmp"));
    let tmp = PathBuf::from(tmp);

    let res = write_pid(&tmp, pid).and_then(|()| fs::hard_link(&tmp, path));
    let _ = fs::remove_file(&tmp);
    res
}

fn write_pid(path: &Path, pid: u32) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    writeln!(file, "{pid}")?;
    file.sync_all()
}

fn modified_within(path: &Path, grace: Duration) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| SystemTime::now().duration_since(t).ok())
        .is_some_and(|age| age < grace)
}

fn pid_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_secs(60);

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tcb-lock-{}-{name}", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn second_acquire_fails_while_holder_is_alive() {
        let path = temp_path("live");

        let lock = InstanceLock::acquire_with(&path, 100, |_| true, GRACE).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "100");
        let err = InstanceLock::acquire_with(&path, 200, |_| true, GRACE).unwrap_err();
        assert!(matches!(err, Error::AlreadyRunning(_)));

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn stale_lock_is_replaced() {
        let path = temp_path("stale");
        fs::write(&path, "4242\n").unwrap();

        let _lock = InstanceLock::acquire_with(&path, 100, |_| false, GRACE).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "100");
    }

    #[test]
    fn fresh_lock_without_pid_is_held() {
        let path = temp_path("fresh-empty");
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();

        let err = InstanceLock::acquire_with(&path, 200, |_| true, GRACE).unwrap_err();
        assert!(matches!(err, Error::AlreadyRunning(_)));
        assert!(path.exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn old_lock_without_pid_is_replaced() {
        let path = temp_path("old-garbage");
        fs::write(&path, "not a pid").unwrap();

        let _lock = InstanceLock::acquire_with(&path, 100, |_| true, Duration::ZERO).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "100");
    }

    #[test]
    fn no_temp_file_is_left_behind() {
        let path = temp_path("tmp-cleanup");
        let _lock = InstanceLock::acquire_with(&path, 100, |_| true, GRACE).unwrap();

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".100.tmp");
        assert!(!PathBuf::from(tmp).exists());
    }

    #[test]
    fn current_process_is_alive() {
        assert!(pid_alive(std::process::id()));
    }
}
