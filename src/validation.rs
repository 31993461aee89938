//! Field rules and date helpers shared by the store and the client.

use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::models::{FieldErrors, TodoInput};

pub const TITLE_REQUIRED: &str = "Title is required.";
pub const DESCRIPTION_REQUIRED: &str = "Description is required.";
pub const DUE_DATE_REQUIRED: &str = "Due date is required.";
pub const DUE_DATE_FORMAT: &str = "Use YYYY-MM-DD.";

/// Checks every field independently and returns all failures together.
/// On success the trimmed input is returned.
pub fn validate_todo(input: &TodoInput) -> Result<TodoInput, FieldErrors> {
    let title = input.title.trim();
    let description = input.description.trim();
    let due_date = input.due_date.trim();

    let mut errors = FieldErrors::new();

    if title.is_empty() {
        errors.insert("title".into(), TITLE_REQUIRED.into());
    }

    if description.is_empty() {
        errors.insert("description".into(), DESCRIPTION_REQUIRED.into());
    }

    if due_date.is_empty() {
        errors.insert("dueDate".into(), DUE_DATE_REQUIRED.into());
    } else if !is_valid_date_string(due_date) {
        errors.insert("dueDate".into(), DUE_DATE_FORMAT.into());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(TodoInput {
        title: title.to_string(),
        description: description.to_string(),
        due_date: due_date.to_string(),
    })
}

/// Calendar date as stored and as a date input expects it.
const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// ISO-8601 UTC with milliseconds, e.g. `2024-03-01T09:30:00.123Z`.
/// Fixed width, so text order is chronological order.
const TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

pub fn now_timestamp() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(TIMESTAMP)
}

/// Exactly `YYYY-MM-DD`, nothing before or after.
fn parse_date(value: &str) -> Option<Date> {
    if value.len() != 10 {
        return None;
    }
    Date::parse(value, DATE).ok()
}

/// `YYYY-MM-DD` that names a real day on the calendar. Year zero is rejected.
pub fn is_valid_date_string(value: &str) -> bool {
    parse_date(value).is_some_and(|date| date.year() != 0)
}

/// Normalizes a stored due date for a date input. Valid `YYYY-MM-DD` values
/// pass through; RFC 3339 timestamps are reduced to their UTC calendar day;
/// anything else becomes empty.
pub fn format_date_for_input(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return String::new();
    };

    let date = parse_date(value).or_else(|| {
        OffsetDateTime::parse(value, &Rfc3339)
            .ok()
            .map(|at| at.to_offset(UtcOffset::UTC).date())
    });

    date.and_then(|date| date.format(DATE).ok())
        .unwrap_or_default()
}
