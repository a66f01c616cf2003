//! Technician availability windows.
//!
//! Windows are computed per UTC calendar date from default weekly hours
//! and date-keyed exceptions, then locked jobs are subtracted. Gaps
//! between the remaining windows become optimizer unavailabilities.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::common::time::{parse_business_time, utc_date};
use crate::domains::jobs::models::{Job, JobStatus};
use crate::domains::scheduling::models::{AvailabilityGap, DailyAvailability, TimeWindow};
use crate::domains::technicians::models::{ExceptionKind, Technician};

/// Availability windows for each UTC date in [start_date, end_date].
///
/// An exception for the date wins over default hours: `custom_hours` with
/// both times set replaces them, anything else (time off, or custom hours
/// flagged unavailable) empties the day. Days without windows are omitted
/// from the map.
pub fn calculate_windows_for_technician(
    tech: &Technician,
    start_date: NaiveDate,
    end_date: NaiveDate,
    tz: Tz,
) -> DailyAvailability {
    let mut availability = DailyAvailability::new();

    let mut date = start_date;
    while date <= end_date {
        let windows = windows_for_date(tech, date, tz);
        if !windows.is_empty() {
            availability.insert(date, windows);
        }
        date += Duration::days(1);
    }

    availability
}

fn windows_for_date(tech: &Technician, date: NaiveDate, tz: Tz) -> Vec<TimeWindow> {
    let mut windows: Vec<TimeWindow> = Vec::new();

    if let Some(exception) = tech.exception_for(date) {
        let usable = exception.kind == ExceptionKind::CustomHours
            && exception.is_available
            && exception.start_time.is_some()
            && exception.end_time.is_some();
        if usable {
            if let Some(win) = parse_window(
                date,
                exception.start_time.as_deref().unwrap_or_default(),
                exception.end_time.as_deref().unwrap_or_default(),
                tz,
                tech.id,
            ) {
                windows.push(win);
            }
        }
        // time_off, or custom hours without usable times: the day stays empty.
    } else {
        let day_of_week = date.weekday().num_days_from_sunday();
        for hours in tech.default_hours_for(day_of_week) {
            if let Some(win) = parse_window(date, &hours.start_time, &hours.end_time, tz, tech.id) {
                windows.push(win);
            }
        }
    }

    windows.retain(|w| !w.is_empty());
    windows.sort_by_key(|w| w.start);
    windows
}

fn parse_window(
    date: NaiveDate,
    start: &str,
    end: &str,
    tz: Tz,
    technician_id: i64,
) -> Option<TimeWindow> {
    match (
        parse_business_time(date, start, tz),
        parse_business_time(date, end, tz),
    ) {
        (Ok(start), Ok(end)) => Some(TimeWindow::new(start, end)),
        (start_result, end_result) => {
            if let Some(error) = start_result.err().or(end_result.err()) {
                tracing::warn!(
                    technician_id,
                    %date,
                    error = %error,
                    "Dropping unparseable availability window"
                );
            }
            None
        }
    }
}

/// Subtract the technician's locked jobs on `target_date` from the day's
/// windows.
///
/// Fixed-time jobs block their fixed slot. En-route / in-progress jobs on
/// today block from `now` for their remaining duration, so the optimizer
/// cannot retroactively reclaim time that has already passed: a job that
/// ended before `now` blocks nothing, a job underway blocks
/// [now, now + remaining), and a job not yet started blocks its original
/// span. On other dates those statuses block their original span.
pub fn apply_locked_jobs_to_windows(
    windows: Vec<TimeWindow>,
    locked_jobs: &[Job],
    technician_id: i64,
    target_date: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<TimeWindow> {
    let is_today = target_date == utc_date(now);
    let mut result = windows;

    for job in locked_jobs {
        if job.assigned_technician != Some(technician_id) || !job.status.is_locked() {
            continue;
        }
        let Some(start) = job.locked_start() else {
            continue;
        };
        if utc_date(start) != target_date {
            continue;
        }
        let end = start + job.duration();

        let block = match job.status {
            JobStatus::FixedTime => TimeWindow::new(start, end),
            JobStatus::EnRoute | JobStatus::InProgress if is_today => {
                if now >= end {
                    // Already finished; nothing left to protect.
                    continue;
                } else if now >= start {
                    // Remaining duration, re-anchored at now.
                    TimeWindow::new(now, end)
                } else {
                    TimeWindow::new(start, end)
                }
            }
            _ => TimeWindow::new(start, end),
        };

        result = result
            .into_iter()
            .flat_map(|w| w.subtract(&block))
            .filter(|w| !w.is_empty())
            .collect();
    }

    result.sort_by_key(|w| w.start);
    result
}

/// Unavailable sub-intervals of the shift envelope not covered by any
/// window. The union of gaps and windows is exactly the envelope. An
/// empty window list yields one gap spanning the whole envelope.
pub fn find_availability_gaps(
    technician_id: i64,
    envelope: TimeWindow,
    windows: &[TimeWindow],
) -> Vec<AvailabilityGap> {
    let mut gaps = Vec::new();
    let mut push = |start: DateTime<Utc>, end: DateTime<Utc>| {
        let duration_seconds = (end - start).num_seconds();
        if duration_seconds > 0 {
            gaps.push(AvailabilityGap {
                technician_id,
                start,
                end,
                duration_seconds,
            });
        }
    };

    if windows.is_empty() {
        push(envelope.start, envelope.end);
        return gaps;
    }

    push(envelope.start, windows[0].start);
    for pair in windows.windows(2) {
        push(pair[0].end, pair[1].start);
    }
    push(windows[windows.len() - 1].end, envelope.end);

    gaps
}
