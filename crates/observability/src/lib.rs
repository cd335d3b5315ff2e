//! Process-wide tracing setup shared by every binary.

/// Initialize process-wide observability (tracing/logging) on stdout.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Like [`init`], but logs go to stderr so stdout stays free for output.
pub fn init_stderr() {
    tracing::init_with_writer(std::io::stderr);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
