//! User id to display name resolution

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Result, StatsError};
use crate::models::Dataset;

/// A user id seen with more than one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConflict {
    pub user_id: i64,
    /// Name kept in the map
    pub kept: String,
    pub ignored: String,
}

/// Names by user id, built from one dataset
///
/// The first name seen for an id wins. Later, different names for the same id
/// are recorded as conflicts and otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    names: HashMap<i64, String>,
    conflicts: Vec<NameConflict>,
}

impl IdentityMap {
    pub fn build(dataset: &Dataset) -> Self {
        let mut map = Self::default();
        map.rebuild(dataset);
        map
    }

    /// Replace the contents with the pairs of another dataset
    pub fn rebuild(&mut self, dataset: &Dataset) {
        self.clear();

        for record in dataset.iter() {
            match self.names.get(&record.user_id) {
                None => {
                    self.names.insert(record.user_id, record.user_name.clone());
                }
                Some(kept) if *kept != record.user_name => {
                    let already_flagged = self.conflicts.iter().any(|c| {
                        c.user_id == record.user_id && c.ignored == record.user_name
                    });
                    if !already_flagged {
                        warn!(
                            user_id = record.user_id,
                            kept = %kept,
                            ignored = %record.user_name,
                            "user id appears with more than one name"
                        );
                        self.conflicts.push(NameConflict {
                            user_id: record.user_id,
                            kept: kept.clone(),
                            ignored: record.user_name.clone(),
                        });
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Display name for a user id
    pub fn resolve(&self, user_id: i64) -> Result<&str> {
        self.names
            .get(&user_id)
            .map(String::as_str)
            .ok_or(StatsError::UnknownUser(user_id))
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.conflicts.clear();
    }

    pub fn conflicts(&self) -> &[NameConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityRecord, RunType, YearMonth};
    use chrono::{Duration, NaiveDate};

    fn record(user_id: i64, name: &str) -> ActivityRecord {
        ActivityRecord {
            end_time: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            status: String::new(),
            user_id,
            user_name: name.to_string(),
            gender: String::new(),
            distance: 5.0,
            duration: Duration::seconds(1800),
            run_type: RunType::Outdoor,
            pace: Duration::seconds(360),
            cadence: 0,
            stride_length: 0.0,
            year: 2023,
            month: YearMonth { year: 2023, month: 1 },
            week_no: 1,
        }
    }

    #[test]
    fn test_resolve() {
        let dataset = Dataset::new(vec![record(1, "Ann"), record(2, "Bo"), record(1, "Ann")]);
        let map = IdentityMap::build(&dataset);
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve(1).unwrap(), "Ann");
        assert_eq!(map.resolve(2).unwrap(), "Bo");
        assert!(map.conflicts().is_empty());
    }

    #[test]
    fn test_unknown_user() {
        let map = IdentityMap::build(&Dataset::new(vec![record(1, "Ann")]));
        assert!(matches!(map.resolve(9), Err(StatsError::UnknownUser(9))));
    }

    #[test]
    fn test_conflicting_names_first_wins() {
        let dataset = Dataset::new(vec![
            record(1, "Ann"),
            record(1, "Annie"),
            record(1, "Annie"),
        ]);
        let map = IdentityMap::build(&dataset);
        assert_eq!(map.resolve(1).unwrap(), "Ann");
        assert_eq!(
            map.conflicts(),
            &[NameConflict {
                user_id: 1,
                kept: "Ann".to_string(),
                ignored: "Annie".to_string(),
            }]
        );
    }

    #[test]
    fn test_rebuild_forgets_previous_dataset() {
        let mut map = IdentityMap::build(&Dataset::new(vec![record(1, "Ann")]));
        map.rebuild(&Dataset::new(vec![record(2, "Bo")]));
        assert!(map.resolve(1).is_err());
        assert_eq!(map.resolve(2).unwrap(), "Bo");

        map.clear();
        assert!(map.is_empty());
    }
}
