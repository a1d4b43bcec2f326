use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::AppointmentError;

/// Bookable slots, the same every open day and for every doctor.
pub const TIME_SLOTS: [&str; 12] = [
    "9:00 AM", "9:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "2:00 PM", "2:30 PM", "3:00 PM", "3:30 PM", "4:00 PM", "4:30 PM",
];

pub fn is_known_slot(slot: &str) -> bool {
    TIME_SLOTS.contains(&slot)
}

/// Position of a slot within the day, for ordering schedules. Unknown
/// slots sort last.
pub fn slot_index(slot: &str) -> usize {
    TIME_SLOTS
        .iter()
        .position(|s| *s == slot)
        .unwrap_or(TIME_SLOTS.len())
}

/// Today or later, and not a Sunday.
pub fn is_bookable_date(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today && date.weekday() != Weekday::Sun
}

/// Check a booking's date and slot, returning them once both are usable.
pub fn validate_selection(
    date: Option<NaiveDate>,
    time_slot: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, String), AppointmentError> {
    let slot = time_slot.map(str::trim).filter(|s| !s.is_empty());
    let (date, slot) = match (date, slot) {
        (Some(date), Some(slot)) => (date, slot),
        _ => return Err(AppointmentError::MissingDateOrSlot),
    };

    if date < today {
        return Err(AppointmentError::DateInPast);
    }
    if date.weekday() == Weekday::Sun {
        return Err(AppointmentError::ClinicClosed);
    }
    if !is_known_slot(slot) {
        return Err(AppointmentError::UnknownTimeSlot(slot.to_string()));
    }

    Ok((date, slot.to_string()))
}

/// "Your appointment with Dr. Sarah Johnson is confirmed for March 2, 2026 at 9:30 AM"
pub fn confirmation_message(doctor_name: &str, date: NaiveDate, time_slot: &str) -> String {
    format!(
        "Your appointment with {} is confirmed for {} at {}",
        doctor_name,
        date.format("%B %-d, %Y"),
        time_slot
    )
}
