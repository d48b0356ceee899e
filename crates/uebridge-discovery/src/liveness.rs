//! Process liveness probe.

/// Check whether a process with the given PID exists.
///
/// Sends signal 0, which performs the existence and permission checks without
/// delivering anything. `EPERM` means the process exists but belongs to another
/// user, so it counts as alive. PID 0 is never alive: signal 0 to PID 0 would
/// address our own process group.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }

    match signal::kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(Errno::ESRCH) => false,
        Err(e) => {
            tracing::debug!("Liveness probe for pid {pid} failed: {e}");
            false
        }
    }
}

/// Without a signal-0 probe every positive PID is assumed alive.
#[cfg(not(unix))]
pub fn is_alive(pid: u32) -> bool {
    pid != 0
}
