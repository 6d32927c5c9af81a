/// Completion marker for one pipeline stage, derived from whether the
/// stage's output already exists. A stage whose status is `Complete`
/// is skipped on re-runs; partial output still reads as `NotStarted`
/// for the fetcher (a dated raw directory counts as complete even if a
/// crash left it partial, so retrying needs manual cleanup).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    NotStarted,
    Complete,
}

impl StageStatus {
    pub fn from_exists(exists: bool) -> Self {
        if exists {
            Self::Complete
        } else {
            Self::NotStarted
        }
    }
}
