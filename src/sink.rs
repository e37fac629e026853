//! Logging sink seam.
//!
//! The interceptor formats lines and hands them to a [`LogSink`] with one of
//! two severities. The default [`TracingSink`] forwards to the `tracing`
//! crate; tests and embedders can supply their own sink to capture or
//! redirect output.

use std::error::Error;
use tracing::{debug, error};

/// Destination for formatted log lines.
///
/// Two severities only: `d` for informational lines (requests, successful
/// responses) and `e` for error lines (failed responses, call errors,
/// interceptor-internal failures). Implementations must be callable from any
/// thread the wrapped call runs on.
///
/// # Examples
///
/// ```rust
/// use debug_interceptor::LogSink;
///
/// struct StdoutSink;
///
/// impl LogSink for StdoutSink {
///     fn d(&self, line: &str) {
///         println!("{line}");
///     }
///
///     fn e(&self, line: &str, error: Option<&(dyn std::error::Error + 'static)>) {
///         match error {
///             Some(err) => eprintln!("{line}: {err}"),
///             None => eprintln!("{line}"),
///         }
///     }
/// }
/// ```
pub trait LogSink: Send + Sync + 'static {
    /// Emit an informational line.
    fn d(&self, line: &str);

    /// Emit an error line, optionally with the originating error attached.
    fn e(&self, line: &str, error: Option<&(dyn Error + 'static)>);
}

/// Default [`LogSink`] over the `tracing` crate.
///
/// Informational lines go out at `debug` level, error lines at `error`
/// level, both under the `debug_interceptor` target.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn d(&self, line: &str) {
        debug!(target: "debug_interceptor", "{line}");
    }

    fn e(&self, line: &str, error: Option<&(dyn Error + 'static)>) {
        match error {
            Some(err) => error!(target: "debug_interceptor", error = %err, "{line}"),
            None => error!(target: "debug_interceptor", "{line}"),
        }
    }
}
