//! Progress reporting trait for long-running operations.
//!
//! Decouples tile and place progress from any rendering backend. The
//! binary supplies `indicatif` bars and library callers may pass none.

/// Trait for reporting progress from long-running operations.
///
/// Implementations must be `Send + Sync` so a single bar can be shared
/// across concurrently running tile fetches.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);

    /// Mark progress as complete and remove the progress indicator.
    fn finish_and_clear(&self);
}
