//! The consolidated, chronologically ordered collection of runs

use chrono::NaiveDate;

use super::ActivityRecord;

/// Activity records after loading and calendar derivation
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ActivityRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ActivityRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter()
    }

    /// Outdoor runs at or under the regular pace limit
    pub fn regular_runs(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter().filter(|r| r.is_regular())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last activity dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.end_time).min()?;
        let last = self.records.iter().map(|r| r.end_time).max()?;
        Some((first.date(), last.date()))
    }

    /// Whether `end_time` never decreases along the records
    pub fn is_chronological(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[0].end_time <= pair[1].end_time)
    }

    pub fn into_records(self) -> Vec<ActivityRecord> {
        self.records
    }
}
