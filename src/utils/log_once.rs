//! Logging that fires once per call site.

/// Log at `$lvl` the first time this call site runs.
///
/// Evaluates to `true` on the call that logged.
#[macro_export]
macro_rules! log_once {
    ($lvl:expr, $($arg:tt)+) => {{
        static FIRST: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);
        let first = FIRST.swap(false, std::sync::atomic::Ordering::Relaxed);
        if first {
            log::log!($lvl, $($arg)+);
        }
        first
    }};
}

#[macro_export]
macro_rules! warn_once {
    ($($arg:tt)+) => {
        $crate::log_once!(log::Level::Warn, $($arg)+)
    };
}

pub use crate::{log_once, warn_once};
