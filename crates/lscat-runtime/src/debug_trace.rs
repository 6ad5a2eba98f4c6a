#![forbid(unsafe_code)]

//! Env-gated debug trace for batch progress.
//!
//! Set `LSCAT_DEBUG_TRACE=1` (or `true`) to print timestamped drain events to
//! stderr, independently of the `tracing` feature. When unset the check is a
//! single static bool load.
//!
//! ```ignore
//! use lscat_runtime::debug_trace;
//! debug_trace!("draining {}", item);
//! ```

use std::sync::LazyLock;
use std::time::Instant;

/// Variable read once, on first use.
pub const DEBUG_TRACE_ENV: &str = "LSCAT_DEBUG_TRACE";

static DEBUG_TRACE_ENABLED: LazyLock<bool> =
    LazyLock::new(|| std::env::var(DEBUG_TRACE_ENV).is_ok_and(|v| flag_enabled(&v)));

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

fn flag_enabled(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[inline]
pub fn is_enabled() -> bool {
    *DEBUG_TRACE_ENABLED
}

/// Milliseconds since the first trace call, for correlating worker threads.
#[inline]
pub fn elapsed_ms() -> u64 {
    u64::try_from(START_TIME.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Print a timestamped line to stderr when `LSCAT_DEBUG_TRACE` is set.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::debug_trace::is_enabled() {
            eprintln!(
                "[lscat {:>8}ms] {}",
                $crate::debug_trace::elapsed_ms(),
                format_args!($($arg)*)
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        assert!(flag_enabled("1"));
        assert!(flag_enabled("TRUE"));
        assert!(!flag_enabled("0"));
        assert!(!flag_enabled("yes"));
    }

    #[test]
    fn elapsed_ms_is_monotonic() {
        let t1 = elapsed_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(elapsed_ms() >= t1);
    }

    #[test]
    fn macro_compiles_either_way() {
        let _ = is_enabled();
        crate::debug_trace!("trace {}", 1);
    }
}
