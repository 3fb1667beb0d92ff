//! Process liveness probing.

use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;

/// Checks whether a process id refers to a running process.
///
/// Probes are infallible: when the answer cannot be determined they
/// must report "alive", so an ambiguous probe never causes a live
/// holder's lease to be seized.
pub trait ProcessProbe: Send + Sync + 'static {
    /// Whether the process with the given pid is running.
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probe using signal 0, the conventional existence check.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignalProbe;

impl SignalProbe {
    /// Creates a new `SignalProbe`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessProbe for SignalProbe {
    fn is_alive(&self, pid: u32) -> bool {
        let Ok(pid) = i32::try_from(pid) else {
            return true;
        };

        match signal::kill(Pid::from_raw(pid), None) {
            // Delivered, so the process exists
            Ok(()) => true,
            // Exists but owned by another credential
            Err(Errno::EPERM) => true,
            Err(Errno::ESRCH) => false,
            // Unknown failure: assume alive
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_process_is_alive() {
        let probe = SignalProbe::new();

        assert!(probe.is_alive(std::process::id()));
    }

    #[test]
    fn test_init_is_alive() {
        // pid 1 exists on any unix host; killing it is denied, which
        // must still read as alive
        let probe = SignalProbe::new();

        assert!(probe.is_alive(1));
    }
}
