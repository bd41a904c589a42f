//! Local session state and the role gate.
//!
//! The session file holds the backend's session cookie plus the cached
//! user/employee blob captured at login. Every consumer on the board reads
//! it through [`Session::employee`]; nothing in the task board writes it.
//! Role capabilities are derived once and passed around as a value, not
//! recomputed from raw storage reads.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::task::{Employee, User};

/// Stored session: opaque cookie string plus the user blob from login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub cookie: Option<String>,
    #[serde(default)]
    pub user: User,
}

impl Session {
    /// Default session directory, `~/.pmb`.
    pub fn default_dir() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".pmb")
    }

    /// Default session file path.
    pub fn default_path() -> PathBuf {
        Self::default_dir().join("session.json")
    }

    /// Load a session, returning `None` when the file is missing or
    /// unreadable; the caller decides whether that is an error.
    pub fn load(path: &Path) -> Option<Session> {
        let buf = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&buf) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("ignoring corrupt session file {}: {e}", path.display());
                None
            }
        }
    }

    /// Save the session using an atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self).expect("session serializes");
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Remove the stored session, ignoring a file that was never created.
    pub fn clear(path: &Path) -> std::io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// The single read API for the cached employee record.
    pub fn employee(&self) -> Option<&Employee> {
        self.user.employee.as_ref()
    }
}

/// Board of Directors: job level 3 exactly.
pub fn can_bod(employee: &Employee) -> bool {
    employee.job_level_id == Some(3)
}

/// Head of Department or above: job level 2 and up.
pub fn can_hod(employee: &Employee) -> bool {
    employee.job_level_id.is_some_and(|level| level >= 2)
}

/// Role capabilities derived once from the cached employee.
///
/// These gate which controls render and which commands proceed. They are
/// client-side affordance only; the backend re-validates every call and
/// remains the sole enforcement point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// May create annual projects.
    pub bod: bool,
    /// May create semesters and monthlies, and assign a PIC.
    pub hod: bool,
}

impl Capabilities {
    pub fn of(employee: Option<&Employee>) -> Self {
        match employee {
            Some(e) => Capabilities {
                bod: can_bod(e),
                hod: can_hod(e),
            },
            None => Capabilities::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee_at(level: i64) -> Employee {
        Employee {
            job_level_id: Some(level),
            ..Employee::default()
        }
    }

    #[test]
    fn bod_is_level_three_exactly() {
        assert!(!can_bod(&employee_at(1)));
        assert!(!can_bod(&employee_at(2)));
        assert!(can_bod(&employee_at(3)));
        assert!(!can_bod(&employee_at(4)));
        assert!(!can_bod(&Employee::default()));
    }

    #[test]
    fn hod_is_level_two_and_up() {
        assert!(!can_hod(&employee_at(1)));
        assert!(can_hod(&employee_at(2)));
        assert!(can_hod(&employee_at(3)));
        assert!(can_hod(&employee_at(4)));
        assert!(!can_hod(&Employee::default()));
    }

    #[test]
    fn capabilities_without_employee_grant_nothing() {
        assert_eq!(Capabilities::of(None), Capabilities::default());
        let caps = Capabilities::of(Some(&employee_at(3)));
        assert!(caps.bod && caps.hod);
        let staff = Capabilities::of(Some(&employee_at(1)));
        assert!(!staff.bod && !staff.hod);
    }

    #[test]
    fn session_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("pmb-session-test");
        let path = dir.join("session.json");
        let session = Session {
            cookie: Some("sid=abc123".into()),
            user: User {
                email: Some("rina@example.com".into()),
                role: None,
                employee: Some(employee_at(2)),
            },
        };
        session.save(&path).unwrap();
        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded.cookie.as_deref(), Some("sid=abc123"));
        assert!(Capabilities::of(loaded.employee()).hod);
        Session::clear(&path).unwrap();
        assert!(Session::load(&path).is_none());
    }
}
