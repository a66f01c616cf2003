use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A closed-open interval [start, end) of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The non-empty pieces of this window left after removing `block`.
    pub fn subtract(&self, block: &TimeWindow) -> Vec<TimeWindow> {
        if block.is_empty() || !self.overlaps(block) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if self.start < block.start {
            pieces.push(TimeWindow::new(self.start, block.start));
        }
        if block.end < self.end {
            pieces.push(TimeWindow::new(block.end, self.end));
        }
        pieces
    }
}

/// Per-date availability windows. Keys are UTC calendar dates; dates with
/// no windows are omitted entirely. Within a date, windows are sorted by
/// start and strictly non-overlapping.
pub type DailyAvailability = BTreeMap<NaiveDate, Vec<TimeWindow>>;

/// An unavailable sub-interval inside a technician's shift envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityGap {
    pub technician_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, h, m, 0).unwrap()
    }

    #[test]
    fn subtract_middle_splits() {
        let win = TimeWindow::new(at(9, 0), at(17, 0));
        let block = TimeWindow::new(at(12, 0), at(13, 0));
        assert_eq!(
            win.subtract(&block),
            vec![
                TimeWindow::new(at(9, 0), at(12, 0)),
                TimeWindow::new(at(13, 0), at(17, 0)),
            ]
        );
    }

    #[test]
    fn subtract_leading_edge() {
        let win = TimeWindow::new(at(9, 0), at(17, 0));
        let block = TimeWindow::new(at(8, 0), at(10, 0));
        assert_eq!(win.subtract(&block), vec![TimeWindow::new(at(10, 0), at(17, 0))]);
    }

    #[test]
    fn subtract_covering_block_removes_window() {
        let win = TimeWindow::new(at(9, 0), at(17, 0));
        let block = TimeWindow::new(at(8, 0), at(18, 0));
        assert!(win.subtract(&block).is_empty());
    }

    #[test]
    fn subtract_disjoint_is_noop() {
        let win = TimeWindow::new(at(9, 0), at(12, 0));
        let block = TimeWindow::new(at(13, 0), at(14, 0));
        assert_eq!(win.subtract(&block), vec![win]);
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = TimeWindow::new(at(9, 0), at(12, 0));
        let b = TimeWindow::new(at(12, 0), at(14, 0));
        assert!(!a.overlaps(&b));
    }
}
