// src/schedule.rs
//
// Shift-day expansion and the calendar windows the planning board pages
// through.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::work_order::Shift;

/// Expand a date/shift range into per-day occupied shift sets.
///
/// The first day runs from the start shift to T3, the last day from T1 to the
/// end shift, and every day in between takes all three shifts. A single-day
/// range occupies the contiguous slice between its two shifts, swapping them
/// when they arrive inverted. A start date after the end date yields no
/// occupancy at all.
pub fn expand_schedule(
    start: NaiveDate,
    start_shift: Shift,
    end: NaiveDate,
    end_shift: Shift,
) -> BTreeMap<NaiveDate, Vec<Shift>> {
    let mut schedule = BTreeMap::new();
    if start > end {
        debug!("Inverted schedule range {} .. {}, no occupancy", start, end);
        return schedule;
    }
    if start == end {
        let (mut lo, mut hi) = (start_shift.index(), end_shift.index());
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        schedule.insert(start, Shift::ORDER[lo..=hi].to_vec());
        return schedule;
    }
    let mut day = start;
    while day <= end {
        let shifts = if day == start {
            Shift::ORDER[start_shift.index()..].to_vec()
        } else if day == end {
            Shift::ORDER[..=end_shift.index()].to_vec()
        } else {
            Shift::ORDER.to_vec()
        };
        schedule.insert(day, shifts);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    schedule
}

/// `days` consecutive calendar dates starting at the pivot, rolling over
/// month and year boundaries.
pub fn date_window(pivot: NaiveDate, days: u32) -> Vec<NaiveDate> {
    let mut window = Vec::with_capacity(days as usize);
    let mut day = pivot;
    for _ in 0..days {
        window.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    window
}

/// Move the window pivot by a signed number of days. The board navigates in
/// whole weeks, so this is called with +7 and -7.
pub fn shift_pivot(pivot: NaiveDate, days: i64) -> NaiveDate {
    pivot.checked_add_signed(Duration::days(days)).unwrap_or(pivot)
}

/// Jump the pivot to the first day of the given month in the pivot's year.
/// An out-of-range month leaves the pivot where it was.
pub fn month_jump(pivot: NaiveDate, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(pivot.year(), month, 1).unwrap_or(pivot)
}
