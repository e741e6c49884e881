//! Delivering termination signals to supervised processes.
//!
//! The graceful stop sequence sends SIGTERM first and escalates to a
//! forceful kill (via [`tokio::process::Child::kill`]) only after the
//! spec's `kill_timeout`. Signalling a pid that is already gone is treated
//! as already-stopped, not as an error.

use crate::error::ProcError;

/// Sends a graceful termination signal (SIGTERM) to `pid`.
///
/// Returns `Ok(())` when the signal was delivered *or* the process no
/// longer exists. A pid of 0 is never signalled (that would address the
/// whole process group).
#[cfg(unix)]
pub(crate) fn terminate(pid: u32) -> Result<(), ProcError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if pid == 0 {
        return Ok(());
    }
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => Ok(()),
        // Already gone: the exit path will observe it shortly.
        Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(ProcError::Signal {
            pid,
            source: std::io::Error::from_raw_os_error(errno as i32),
        }),
    }
}

/// Non-Unix fallback: no graceful signal is available; the caller falls
/// through to the forceful kill after `kill_timeout`.
#[cfg(not(unix))]
pub(crate) fn terminate(_pid: u32) -> Result<(), ProcError> {
    Ok(())
}
