//! Calendar arithmetic for schedules, holidays and appointment numbers.
//!
//! Everything here is pure: no I/O, no clock. Services pass in "today" and
//! the rows they loaded.
//!
//! # Conventions
//!
//! - Time windows are half-open: `[start, end)`. Two windows that merely touch
//!   (`09:00-10:00` and `10:00-11:00`) do not overlap.
//! - Date ranges are inclusive on both ends; `None` as an upper bound means
//!   open-ended.
//! - Weekdays travel as ISO numbers, 1 = Monday … 7 = Sunday.

use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use serde_json::json;

use crate::domain::entities::Holiday;
use crate::error::AppError;

/// Shortest allowed slot.
pub const MIN_SLOT_MINUTES: i32 = 5;
/// Longest allowed slot.
pub const MAX_SLOT_MINUTES: i32 = 480;

/// One bookable interval of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

pub fn weekday_from_iso(day: u8) -> Option<Weekday> {
    match day {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn iso_from_weekday(day: Weekday) -> u8 {
    day.number_from_monday() as u8
}

/// Half-open interval intersection.
pub fn windows_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Inclusive date range intersection; `None` upper bounds are open-ended.
pub fn date_ranges_overlap(
    a_from: NaiveDate,
    a_until: Option<NaiveDate>,
    b_from: NaiveDate,
    b_until: Option<NaiveDate>,
) -> bool {
    a_until.is_none_or(|until| b_from <= until) && b_until.is_none_or(|until| a_from <= until)
}

/// Checks that a schedule window can hold at least one slot.
pub fn validate_schedule_window(
    start: NaiveTime,
    end: NaiveTime,
    slot_minutes: i32,
) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::bad_request(
            "Schedule must end after it starts",
            json!({ "start_time": start.to_string(), "end_time": end.to_string() }),
        ));
    }

    if !(MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES).contains(&slot_minutes) {
        return Err(AppError::bad_request(
            "Invalid slot length",
            json!({ "min": MIN_SLOT_MINUTES, "max": MAX_SLOT_MINUTES, "slot_minutes": slot_minutes }),
        ));
    }

    let window_secs = seconds(end) - seconds(start);
    if window_secs < i64::from(slot_minutes) * 60 {
        return Err(AppError::bad_request(
            "Schedule window is shorter than one slot",
            json!({ "window_minutes": window_secs / 60, "slot_minutes": slot_minutes }),
        ));
    }

    Ok(())
}

/// Splits `[start, end)` into consecutive slots of `slot_minutes`.
///
/// A trailing remainder shorter than one slot is dropped.
pub fn generate_slots(start: NaiveTime, end: NaiveTime, slot_minutes: i32) -> Vec<TimeSlot> {
    if slot_minutes <= 0 {
        return Vec::new();
    }

    let step = i64::from(slot_minutes) * 60;
    let end_secs = seconds(end);
    let mut cursor = seconds(start);
    let mut slots = Vec::new();

    while cursor + step <= end_secs {
        if let (Some(s), Some(e)) = (time_at(cursor), time_at(cursor + step)) {
            slots.push(TimeSlot { start: s, end: e });
        }
        cursor += step;
    }

    slots
}

/// The slot of the grid `[start, end)` / `slot_minutes` that begins at `at`.
pub fn slot_starting_at(
    start: NaiveTime,
    end: NaiveTime,
    slot_minutes: i32,
    at: NaiveTime,
) -> Option<TimeSlot> {
    if slot_minutes <= 0 {
        return None;
    }

    let step = i64::from(slot_minutes) * 60;
    let offset = seconds(at) - seconds(start);

    if offset < 0 || offset % step != 0 || seconds(at) + step > seconds(end) {
        return None;
    }

    Some(TimeSlot {
        start: at,
        end: time_at(seconds(at) + step)?,
    })
}

/// Returns the first holiday covering `date`, if any.
pub fn holiday_on(date: NaiveDate, holidays: &[Holiday]) -> Option<&Holiday> {
    holidays.iter().find(|h| h.covers(date))
}

pub fn is_holiday(date: NaiveDate, holidays: &[Holiday]) -> bool {
    holiday_on(date, holidays).is_some()
}

fn seconds(t: NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight())
}

fn time_at(secs: i64) -> Option<NaiveTime> {
    u32::try_from(secs)
        .ok()
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, 0))
}

/// Sequential, per-year appointment numbers: `APT-2026-000042`.
pub struct AppointmentNumber;

impl AppointmentNumber {
    pub const PREFIX: &'static str = "APT";

    /// Formats a number; sequences wider than six digits are kept intact.
    pub fn format(year: i32, sequence: i64) -> String {
        format!("{}-{year:04}-{sequence:06}", Self::PREFIX)
    }

    /// Splits a number back into `(year, sequence)`.
    pub fn parse(number: &str) -> Option<(i32, i64)> {
        let mut parts = number.splitn(3, '-');
        if parts.next()? != Self::PREFIX {
            return None;
        }
        let year = parts.next()?;
        let sequence = parts.next()?;
        if year.len() != 4 || sequence.len() < 6 {
            return None;
        }
        if !year.bytes().chain(sequence.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some((year.parse().ok()?, sequence.parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekday_iso_mapping() {
        assert_eq!(weekday_from_iso(1), Some(Weekday::Mon));
        assert_eq!(weekday_from_iso(7), Some(Weekday::Sun));
        assert_eq!(weekday_from_iso(0), None);
        assert_eq!(weekday_from_iso(8), None);

        for n in 1..=7 {
            assert_eq!(iso_from_weekday(weekday_from_iso(n).unwrap()), n);
        }
    }

    #[test]
    fn test_windows_overlap_half_open() {
        assert!(windows_overlap(t(9, 0), t(10, 0), t(9, 30), t(11, 0)));
        assert!(windows_overlap(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
        assert!(!windows_overlap(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!windows_overlap(t(13, 0), t(14, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn test_date_ranges_overlap_with_open_ends() {
        assert!(date_ranges_overlap(d(2026, 1, 1), None, d(2030, 1, 1), None));
        assert!(date_ranges_overlap(
            d(2026, 1, 1),
            Some(d(2026, 1, 31)),
            d(2026, 1, 31),
            None
        ));
        assert!(!date_ranges_overlap(
            d(2026, 1, 1),
            Some(d(2026, 1, 30)),
            d(2026, 1, 31),
            None
        ));
        assert!(!date_ranges_overlap(
            d(2026, 2, 1),
            None,
            d(2026, 1, 1),
            Some(d(2026, 1, 31))
        ));
    }

    #[test]
    fn test_validate_schedule_window() {
        assert!(validate_schedule_window(t(9, 0), t(12, 0), 30).is_ok());
        assert!(validate_schedule_window(t(12, 0), t(9, 0), 30).is_err());
        assert!(validate_schedule_window(t(9, 0), t(9, 0), 30).is_err());
        assert!(validate_schedule_window(t(9, 0), t(9, 20), 30).is_err());
        assert!(validate_schedule_window(t(9, 0), t(12, 0), 4).is_err());
        assert!(validate_schedule_window(t(0, 0), t(23, 0), 481).is_err());
    }

    #[test]
    fn test_generate_slots_drops_partial_tail() {
        let slots = generate_slots(t(9, 0), t(10, 50), 20);

        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0], TimeSlot { start: t(9, 0), end: t(9, 20) });
        assert_eq!(slots[4], TimeSlot { start: t(10, 20), end: t(10, 40) });
    }

    #[test]
    fn test_generate_slots_invalid_length() {
        assert!(generate_slots(t(9, 0), t(10, 0), 0).is_empty());
        assert!(generate_slots(t(10, 0), t(9, 0), 15).is_empty());
    }

    #[test]
    fn test_slot_starting_at_grid() {
        let slot = slot_starting_at(t(9, 0), t(12, 0), 30, t(10, 30)).unwrap();
        assert_eq!(slot.end, t(11, 0));

        assert!(slot_starting_at(t(9, 0), t(12, 0), 30, t(10, 15)).is_none());
        assert!(slot_starting_at(t(9, 0), t(12, 0), 30, t(8, 30)).is_none());
        assert!(slot_starting_at(t(9, 0), t(12, 0), 30, t(11, 30)).is_some());
        assert!(slot_starting_at(t(9, 0), t(12, 0), 30, t(12, 0)).is_none());
    }

    #[test]
    fn test_is_holiday() {
        let now = Utc::now();
        let holidays = vec![Holiday {
            id: 1,
            name: "New Year".to_string(),
            start_date: d(2026, 1, 1),
            end_date: d(2026, 1, 2),
            row_version: 0,
            created_at: now,
            updated_at: now,
        }];

        assert!(is_holiday(d(2026, 1, 2), &holidays));
        assert!(!is_holiday(d(2026, 1, 3), &holidays));
        assert_eq!(holiday_on(d(2026, 1, 1), &holidays).unwrap().name, "New Year");
    }

    #[test]
    fn test_appointment_number_format() {
        assert_eq!(AppointmentNumber::format(2026, 42), "APT-2026-000042");
        assert_eq!(AppointmentNumber::format(2026, 1_234_567), "APT-2026-1234567");
    }

    #[test]
    fn test_appointment_number_parse() {
        assert_eq!(AppointmentNumber::parse("APT-2026-000042"), Some((2026, 42)));
        assert_eq!(
            AppointmentNumber::parse("APT-2026-1234567"),
            Some((2026, 1_234_567))
        );
        assert_eq!(AppointmentNumber::parse("APT-26-000042"), None);
        assert_eq!(AppointmentNumber::parse("REF-2026-000042"), None);
        assert_eq!(AppointmentNumber::parse("APT-2026-42"), None);
        assert_eq!(AppointmentNumber::parse("APT-2026-00004x"), None);
    }

    #[test]
    fn test_appointment_number_parse_rejects_signs() {
        assert_eq!(AppointmentNumber::parse("APT-2026-+00042"), None);
        assert_eq!(AppointmentNumber::parse("APT-+202-000042"), None);
        assert_eq!(AppointmentNumber::parse("APT-2026--00042"), None);
    }
}
