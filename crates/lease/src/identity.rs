//! Value type identifying who holds a lease.

use std::fmt;

use nix::unistd::{self, Uid, User};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::probe::ProcessProbe;

/// Identifies a lease holder by user, host, and process.
///
/// Two identities are equal only when all three fields match; use
/// [`Self::is_same_machine`] to compare user and host alone.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HolderIdentity {
    username: String,
    hostname: String,
    pid: u32,
}

impl HolderIdentity {
    /// Creates an identity from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the username or hostname is
    /// empty, or the pid is zero.
    pub fn new(
        username: impl Into<String>,
        hostname: impl Into<String>,
        pid: u32,
    ) -> Result<Self> {
        let username = username.into();
        let hostname = hostname.into();

        if username.is_empty() {
            return Err(Error::MissingField("username"));
        }
        if hostname.is_empty() {
            return Err(Error::MissingField("hostname"));
        }
        if pid == 0 {
            return Err(Error::MissingField("pid"));
        }

        Ok(Self {
            username,
            hostname,
            pid,
        })
    }

    /// Creates an identity for the given username on the current host
    /// and process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the username is empty or the
    /// hostname cannot be determined.
    pub fn of(username: impl Into<String>) -> Result<Self> {
        let hostname = unistd::gethostname()
            .map_err(|_| Error::MissingField("hostname"))?
            .to_string_lossy()
            .into_owned();

        Self::new(username, hostname, std::process::id())
    }

    /// Creates an identity for the current user, host, and process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the effective user cannot be
    /// resolved or the hostname cannot be determined.
    pub fn current() -> Result<Self> {
        let username = User::from_uid(Uid::effective())
            .ok()
            .flatten()
            .map(|user| user.name)
            .ok_or(Error::MissingField("username"))?;

        Self::of(username)
    }

    /// The username of this identity.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The hostname of this identity.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The process id of this identity.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether this identity names the same user on the same host as
    /// `other`, ignoring the process id.
    #[must_use]
    pub fn is_same_machine(&self, other: &Self) -> bool {
        self.username == other.username && self.hostname == other.hostname
    }

    /// Whether this identity's process is still running, according to
    /// the given probe. Never fails: probes resolve ambiguity in favor
    /// of "alive" so a live holder's lease is never wrongly seized.
    pub fn is_process_alive<P: ProcessProbe + ?Sized>(&self, probe: &P) -> bool {
        probe.is_alive(self.pid)
    }
}

impl fmt::Display for HolderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (pid {})", self.username, self.hostname, self.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_fields() {
        assert!(matches!(
            HolderIdentity::new("", "host", 1),
            Err(Error::MissingField("username"))
        ));
        assert!(matches!(
            HolderIdentity::new("user", "", 1),
            Err(Error::MissingField("hostname"))
        ));
        assert!(matches!(
            HolderIdentity::new("user", "host", 0),
            Err(Error::MissingField("pid"))
        ));
    }

    #[test]
    fn test_of_uses_current_process() {
        let identity = HolderIdentity::of("operator").unwrap();

        assert_eq!(identity.username(), "operator");
        assert_eq!(identity.pid(), std::process::id());
        assert!(!identity.hostname().is_empty());
    }

    #[test]
    fn test_equality_requires_all_fields() {
        let a = HolderIdentity::new("user", "host", 10).unwrap();
        let b = HolderIdentity::new("user", "host", 11).unwrap();
        let c = HolderIdentity::new("user", "other", 10).unwrap();

        assert_ne!(a, b);
        assert!(a.is_same_machine(&b));
        assert!(!a.is_same_machine(&c));
    }

    #[test]
    fn test_json_round_trip() {
        let identity = HolderIdentity::new("user", "host", 42).unwrap();
        let json = serde_json::to_string(&identity).unwrap();
        let parsed: HolderIdentity = serde_json::from_str(&json).unwrap();

        assert_eq!(identity, parsed);
    }
}
