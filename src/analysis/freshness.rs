//! Freshness gate for the combined dataset.
//!
//! A single-entry TTL check: the previous output is reused when its
//! `last_updated` is younger than the configured maximum age. Any problem
//! reading or parsing it means the dataset is rebuilt.

use crate::models::CombinedDataset;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Why an existing dataset can't be reused.
#[derive(Debug, Clone, PartialEq)]
pub enum StaleReason {
    Missing,
    Unreadable(String),
    Malformed(String),
    Expired { age: Duration },
    FromFuture { ahead: Duration },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::Missing => write!(f, "no previous dataset"),
            StaleReason::Unreadable(e) => write!(f, "previous dataset unreadable: {}", e),
            StaleReason::Malformed(e) => write!(f, "previous dataset malformed: {}", e),
            StaleReason::Expired { age } => {
                write!(f, "previous dataset is {} old", format_age(*age))
            }
            StaleReason::FromFuture { ahead } => write!(
                f,
                "previous dataset is timestamped {} in the future",
                format_age(*ahead)
            ),
        }
    }
}

/// Result of the freshness check.
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    /// The dataset on disk is recent enough and was parsed successfully.
    Fresh(CombinedDataset),
    Stale(StaleReason),
}

impl Freshness {
    #[allow(dead_code)] // Convenience predicate
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh(_))
    }
}

/// Inspect the dataset at `path` relative to `now`.
pub fn check_freshness(path: &Path, max_age: Duration, now: DateTime<Utc>) -> Freshness {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Freshness::Stale(StaleReason::Missing)
        }
        Err(e) => return Freshness::Stale(StaleReason::Unreadable(e.to_string())),
    };

    let dataset: CombinedDataset = match serde_json::from_str(&content) {
        Ok(dataset) => dataset,
        Err(e) => return Freshness::Stale(StaleReason::Malformed(e.to_string())),
    };

    let age = now.signed_duration_since(dataset.last_updated);
    debug!(
        "Previous dataset last updated {} ({} ago)",
        dataset.last_updated,
        format_age(age)
    );

    if age < Duration::zero() {
        Freshness::Stale(StaleReason::FromFuture { ahead: -age })
    } else if age >= max_age {
        Freshness::Stale(StaleReason::Expired { age })
    } else {
        Freshness::Fresh(dataset)
    }
}

/// Human-readable `1d 2h 3m` style duration.
pub fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes().abs();
    let (days, hours, mins) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);
    match (days, hours) {
        (0, 0) => format!("{}m", mins),
        (0, _) => format!("{}h {}m", hours, mins),
        _ => format!("{}d {}h {}m", days, hours, mins),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn write_dataset(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("combined.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_recent_dataset_is_fresh() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(
            &dir,
            r#"{"last_updated":"2025-06-01T00:00:00Z","systems":[{"name":"Sol","anchor_system":"Sol"}]}"#,
        );

        match check_freshness(&path, Duration::hours(24), now()) {
            Freshness::Fresh(dataset) => {
                assert_eq!(dataset.systems.len(), 1);
                assert_eq!(dataset.systems[0].name, "Sol");
            }
            other => panic!("expected fresh, got {other:?}"),
        }
    }

    #[test]
    fn test_naive_timestamp_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(
            &dir,
            r#"{"last_updated":"2025-06-01T11:00:00.123456","systems":[]}"#,
        );
        assert!(check_freshness(&path, Duration::hours(24), now()).is_fresh());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(
            check_freshness(&path, Duration::hours(24), now()),
            Freshness::Stale(StaleReason::Missing)
        );
    }

    #[test]
    fn test_malformed_documents() {
        let dir = TempDir::new().unwrap();
        for content in [
            "",
            "not json",
            r#"{"systems":[]}"#,
            r#"{"last_updated":"soon","systems":[]}"#,
            r#"{"last_updated":"2025-06-01T11:00:00Z"}"#,
            r#"{"last_updated":"2025-06-01T11:00:00Z","systems":[{"id":1}]}"#,
        ] {
            let path = write_dataset(&dir, content);
            let result = check_freshness(&path, Duration::hours(24), now());
            assert!(
                matches!(result, Freshness::Stale(StaleReason::Malformed(_))),
                "content {content:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let dir = TempDir::new().unwrap();

        let path = write_dataset(&dir, r#"{"last_updated":"2025-05-31T12:00:01Z","systems":[]}"#);
        assert!(check_freshness(&path, Duration::hours(24), now()).is_fresh());

        let path = write_dataset(&dir, r#"{"last_updated":"2025-05-31T12:00:00Z","systems":[]}"#);
        assert_eq!(
            check_freshness(&path, Duration::hours(24), now()),
            Freshness::Stale(StaleReason::Expired {
                age: Duration::hours(24)
            })
        );
    }

    #[test]
    fn test_future_timestamp_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = write_dataset(&dir, r#"{"last_updated":"2025-06-02T12:00:00Z","systems":[]}"#);
        assert!(matches!(
            check_freshness(&path, Duration::hours(24), now()),
            Freshness::Stale(StaleReason::FromFuture { .. })
        ));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::minutes(5)), "5m");
        assert_eq!(format_age(Duration::minutes(125)), "2h 5m");
        assert_eq!(format_age(Duration::hours(50)), "2d 2h 0m");
    }
}
