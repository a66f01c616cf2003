//! Availability window computation, locked-job subtraction and gap
//! derivation.

mod common;

use chrono_tz::Tz;
use common::fixtures::*;
use server_core::domains::scheduling::activities::{
    apply_locked_jobs_to_windows, calculate_windows_for_technician, find_availability_gaps,
};
use server_core::domains::scheduling::models::TimeWindow;

const UTC_TZ: Tz = chrono_tz::UTC;

#[test]
fn default_hours_produce_sorted_positive_windows() {
    let tech = technician(1);
    // 2024-07-15 is a Monday
    let availability =
        calculate_windows_for_technician(&tech, date(2024, 7, 15), date(2024, 7, 17), UTC_TZ);

    assert_eq!(availability.len(), 3);
    for (day, windows) in &availability {
        assert_eq!(windows.len(), 1, "one window on {}", day);
        let win = windows[0];
        assert!(win.start < win.end);
        assert_eq!(win.start.time().to_string(), "09:00:00");
        assert_eq!(win.end.time().to_string(), "18:30:00");
    }
}

#[test]
fn split_shift_windows_stay_sorted_and_disjoint() {
    let mut tech = technician(1);
    // Monday: afternoon block listed before the morning block
    tech.default_hours = vec![
        hours(1, "13:00:00", "17:00:00"),
        hours(1, "08:00:00", "12:00:00"),
    ];
    let availability =
        calculate_windows_for_technician(&tech, date(2024, 7, 15), date(2024, 7, 15), UTC_TZ);

    let windows = &availability[&date(2024, 7, 15)];
    assert_eq!(windows.len(), 2);
    assert!(windows[0].start < windows[1].start);
    assert!(windows[0].end <= windows[1].start);
}

#[test]
fn weekend_without_hours_is_omitted() {
    let tech = weekday_technician(1);
    // Fri 2024-07-19 .. Mon 2024-07-22
    let availability =
        calculate_windows_for_technician(&tech, date(2024, 7, 19), date(2024, 7, 22), UTC_TZ);

    assert!(availability.contains_key(&date(2024, 7, 19)));
    assert!(!availability.contains_key(&date(2024, 7, 20)));
    assert!(!availability.contains_key(&date(2024, 7, 21)));
    assert!(availability.contains_key(&date(2024, 7, 22)));
}

#[test]
fn time_off_exception_empties_the_day() {
    let mut tech = technician(1);
    tech.exceptions.push(time_off(date(2024, 7, 16)));

    let availability =
        calculate_windows_for_technician(&tech, date(2024, 7, 15), date(2024, 7, 17), UTC_TZ);

    assert!(availability.contains_key(&date(2024, 7, 15)));
    assert!(!availability.contains_key(&date(2024, 7, 16)));
    assert!(availability.contains_key(&date(2024, 7, 17)));
}

#[test]
fn custom_hours_exception_replaces_defaults_entirely() {
    let mut tech = technician(1);
    tech.exceptions
        .push(custom_hours(date(2024, 7, 16), "11:00:00", "14:00:00"));

    let availability =
        calculate_windows_for_technician(&tech, date(2024, 7, 16), date(2024, 7, 16), UTC_TZ);

    let windows = &availability[&date(2024, 7, 16)];
    assert_eq!(
        windows,
        &vec![TimeWindow::new(
            utc(2024, 7, 16, 11, 0),
            utc(2024, 7, 16, 14, 0)
        )]
    );
}

#[test]
fn inverted_window_is_discarded() {
    let mut tech = technician(1);
    tech.default_hours = vec![hours(1, "18:00:00", "09:00:00")];

    let availability =
        calculate_windows_for_technician(&tech, date(2024, 7, 15), date(2024, 7, 15), UTC_TZ);
    assert!(availability.is_empty());
}

#[test]
fn unavailable_default_hours_are_skipped() {
    let mut tech = technician(1);
    let mut entry = hours(1, "09:00:00", "18:30:00");
    entry.is_available = false;
    tech.default_hours = vec![entry];

    let availability =
        calculate_windows_for_technician(&tech, date(2024, 7, 15), date(2024, 7, 15), UTC_TZ);
    assert!(availability.is_empty());
}

// =============================================================================
// Locked-job subtraction
// =============================================================================

#[test]
fn fixed_time_job_blocks_its_slot() {
    let windows = vec![TimeWindow::new(
        utc(2024, 7, 15, 9, 0),
        utc(2024, 7, 15, 18, 0),
    )];
    let job = fixed_job(50, 500, Some(1), utc(2024, 7, 15, 12, 0), 60);

    let result = apply_locked_jobs_to_windows(
        windows,
        &[job],
        1,
        date(2024, 7, 15),
        utc(2024, 7, 15, 8, 0),
    );

    assert_eq!(
        result,
        vec![
            TimeWindow::new(utc(2024, 7, 15, 9, 0), utc(2024, 7, 15, 12, 0)),
            TimeWindow::new(utc(2024, 7, 15, 13, 0), utc(2024, 7, 15, 18, 0)),
        ]
    );
}

#[test]
fn ongoing_job_blocks_from_now_for_remaining_duration() {
    // In progress since 13:00, 120 min, now 14:30: the remainder is
    // re-anchored at now so past time is not reclaimed.
    let windows = vec![TimeWindow::new(
        utc(2024, 7, 15, 9, 0),
        utc(2024, 7, 15, 18, 0),
    )];
    let job = in_progress_job(51, 501, 1, utc(2024, 7, 15, 13, 0), 120);

    let result = apply_locked_jobs_to_windows(
        windows,
        &[job],
        1,
        date(2024, 7, 15),
        utc(2024, 7, 15, 14, 30),
    );

    assert_eq!(
        result,
        vec![
            TimeWindow::new(utc(2024, 7, 15, 9, 0), utc(2024, 7, 15, 14, 30)),
            TimeWindow::new(utc(2024, 7, 15, 15, 0), utc(2024, 7, 15, 18, 0)),
        ]
    );
}

#[test]
fn finished_job_blocks_nothing() {
    // Started 10:00 with 120 min, now 14:30: already over.
    let windows = vec![TimeWindow::new(
        utc(2024, 7, 15, 9, 0),
        utc(2024, 7, 15, 18, 0),
    )];
    let job = in_progress_job(52, 502, 1, utc(2024, 7, 15, 10, 0), 120);

    let result = apply_locked_jobs_to_windows(
        windows.clone(),
        &[job],
        1,
        date(2024, 7, 15),
        utc(2024, 7, 15, 14, 30),
    );

    assert_eq!(result, windows);
}

#[test]
fn not_yet_started_job_blocks_original_span() {
    let windows = vec![TimeWindow::new(
        utc(2024, 7, 15, 9, 0),
        utc(2024, 7, 15, 18, 0),
    )];
    let job = in_progress_job(53, 503, 1, utc(2024, 7, 15, 16, 0), 60);

    let result = apply_locked_jobs_to_windows(
        windows,
        &[job],
        1,
        date(2024, 7, 15),
        utc(2024, 7, 15, 14, 30),
    );

    assert_eq!(
        result,
        vec![
            TimeWindow::new(utc(2024, 7, 15, 9, 0), utc(2024, 7, 15, 16, 0)),
            TimeWindow::new(utc(2024, 7, 15, 17, 0), utc(2024, 7, 15, 18, 0)),
        ]
    );
}

#[test]
fn other_technicians_jobs_are_ignored() {
    let windows = vec![TimeWindow::new(
        utc(2024, 7, 15, 9, 0),
        utc(2024, 7, 15, 18, 0),
    )];
    let job = fixed_job(54, 504, Some(2), utc(2024, 7, 15, 12, 0), 60);

    let result = apply_locked_jobs_to_windows(
        windows.clone(),
        &[job],
        1,
        date(2024, 7, 15),
        utc(2024, 7, 15, 8, 0),
    );
    assert_eq!(result, windows);
}

#[test]
fn jobs_on_other_dates_are_ignored() {
    let windows = vec![TimeWindow::new(
        utc(2024, 7, 15, 9, 0),
        utc(2024, 7, 15, 18, 0),
    )];
    let job = fixed_job(55, 505, Some(1), utc(2024, 7, 16, 12, 0), 60);

    let result = apply_locked_jobs_to_windows(
        windows.clone(),
        &[job],
        1,
        date(2024, 7, 15),
        utc(2024, 7, 15, 8, 0),
    );
    assert_eq!(result, windows);
}

// =============================================================================
// Gaps
// =============================================================================

#[test]
fn gaps_and_windows_tile_the_envelope() {
    let envelope = TimeWindow::new(utc(2024, 7, 15, 8, 0), utc(2024, 7, 15, 18, 0));
    let windows = vec![
        TimeWindow::new(utc(2024, 7, 15, 9, 0), utc(2024, 7, 15, 12, 0)),
        TimeWindow::new(utc(2024, 7, 15, 13, 0), utc(2024, 7, 15, 17, 0)),
    ];

    let gaps = find_availability_gaps(1, envelope, &windows);

    assert_eq!(gaps.len(), 3);
    assert_eq!((gaps[0].start, gaps[0].end), (envelope.start, windows[0].start));
    assert_eq!((gaps[1].start, gaps[1].end), (windows[0].end, windows[1].start));
    assert_eq!((gaps[2].start, gaps[2].end), (windows[1].end, envelope.end));

    // Union of gaps and windows covers the envelope exactly, pairwise
    // disjoint.
    let mut pieces: Vec<TimeWindow> = windows.clone();
    pieces.extend(gaps.iter().map(|g| TimeWindow::new(g.start, g.end)));
    pieces.sort_by_key(|w| w.start);
    assert_eq!(pieces.first().unwrap().start, envelope.start);
    assert_eq!(pieces.last().unwrap().end, envelope.end);
    for pair in pieces.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }

    for gap in &gaps {
        assert!(gap.duration_seconds > 0);
    }
}

#[test]
fn envelope_matching_windows_has_no_gaps() {
    let windows = vec![TimeWindow::new(utc(2024, 7, 15, 9, 0), utc(2024, 7, 15, 18, 0))];
    let envelope = TimeWindow::new(windows[0].start, windows[0].end);
    assert!(find_availability_gaps(1, envelope, &windows).is_empty());
}

#[test]
fn empty_windows_yield_one_gap_over_the_whole_envelope() {
    let envelope = TimeWindow::new(utc(2024, 7, 15, 9, 0), utc(2024, 7, 15, 18, 0));
    let gaps = find_availability_gaps(1, envelope, &[]);
    assert_eq!(gaps.len(), 1);
    assert_eq!((gaps[0].start, gaps[0].end), (envelope.start, envelope.end));
}
