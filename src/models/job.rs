use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an analysis job as tracked by the client.
///
/// Transitions only move forward along `rank()`; `Done` and `Error` are
/// terminal. The extra `Uploading` state exists only on the client side,
/// before the backend has assigned a job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Uploading,
    Queued,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    /// Monotonic position in the job lifecycle. Both terminal states share
    /// the highest rank so that neither can displace the other.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Uploading => 0,
            JobStatus::Queued => 1,
            JobStatus::Processing => 2,
            JobStatus::Done | JobStatus::Error => 3,
        }
    }

    /// Terminal states stop all polling; nothing transitions out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

/// Snapshot of one tracked analysis job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Backend-assigned job id, immutable once returned by the upload call.
    pub id: String,
    pub status: JobStatus,
    /// Name of the submitted media file.
    pub source_file: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_is_strictly_increasing_along_the_happy_path() {
        let path = [
            JobStatus::Uploading,
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn error_outranks_every_non_terminal_status() {
        for status in [JobStatus::Uploading, JobStatus::Queued, JobStatus::Processing] {
            assert!(JobStatus::Error.rank() > status.rank());
        }
    }

    #[test]
    fn terminal_states_share_a_rank() {
        assert_eq!(JobStatus::Done.rank(), JobStatus::Error.rank());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(JobStatus::Done.to_string(), "done");
    }
}
