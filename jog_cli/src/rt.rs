//! Real-time process setup for `run --rt` (Linux, `rt` feature).

#[cfg(all(feature = "rt", target_os = "linux"))]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    fn lock_memory() -> std::io::Result<()> {
        // SAFETY: mlockall takes no pointers; failure is reported through errno.
        let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
        if rc == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    fn fifo_priority(prio: Option<i32>) -> std::io::Result<i32> {
        // SAFETY: plain queries of the scheduler limits.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(libc::SCHED_FIFO),
                libc::sched_get_priority_max(libc::SCHED_FIFO),
            )
        };
        let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
        let wanted = prio.unwrap_or(max).clamp(min, max);
        let param = libc::sched_param {
            sched_priority: wanted,
        };
        // SAFETY: `param` outlives the call; pid 0 is the calling process.
        let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
        if rc == 0 {
            Ok(wanted)
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    RT_ONCE.get_or_init(|| {
        match lock_memory() {
            Ok(()) => tracing::info!("rt: memory locked (current|future)"),
            Err(e) => tracing::warn!(
                error = %e,
                "rt: mlockall failed; needs CAP_IPC_LOCK or a larger `ulimit -l`"
            ),
        }
        match fifo_priority(prio) {
            Ok(p) => tracing::info!(prio = p, "rt: SCHED_FIFO applied"),
            Err(e) => tracing::warn!(
                error = %e,
                requested = ?prio,
                "rt: sched_setscheduler failed; needs CAP_SYS_NICE or root"
            ),
        }
    });
}

#[cfg(not(all(feature = "rt", target_os = "linux")))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        tracing::warn!("--rt ignored: built without the `rt` feature or not on Linux");
    }
}
