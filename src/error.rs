use thiserror::Error;

/// Detected precondition violations, as opposed to unexpected
/// environment failures which stay plain eyre reports. `main`
/// downcasts to this to decide between the warning banner and a
/// crash-style report.
#[derive(Debug, Error)]
pub enum Precondition {
    #[error("follower database has data from after {attempted} (latest run: {latest})")]
    OutOfOrderRun { attempted: String, latest: String },
    #[error("follower database has no data from {0}")]
    MissingRun(String),
    #[error("no raw follower data on disk for {0}")]
    MissingRawData(String),
}
