use std::ffi::OsStr;
use std::thread;
use std::time::Duration;

// Launch flags that mean someone wants to attach a debugger
const DEBUG_MARKERS: [&str; 2] = ["--inspect", "--debug"];

/// Whether any launch argument looks like a debugger flag, e.g. `--inspect`,
/// `--inspect-brk` or `--debug=9229`.
pub fn wants_debugger<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().any(|arg| {
        let arg = arg.as_ref().to_string_lossy();
        DEBUG_MARKERS.iter().any(|marker| arg.starts_with(marker))
    })
}

/// Gives a debugger time to reattach before anything interesting happens.
pub fn wait_for_debugger(delay: Duration) {
    tracing::info!("debug flag detected, waiting {:?} for a debugger", delay);
    thread::sleep(delay);
}
