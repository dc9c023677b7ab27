//! Program calendar: which week a class is in and that week's theme.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DAYS_PER_WEEK;

/// Where a class sits on its calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CourseWeek {
    NotStarted { starts_in_days: i64 },
    InProgress { week: i32 },
    Completed,
}

/// Current-week view of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeekInfo {
    pub class_id: Uuid,
    pub today: NaiveDate,
    pub schedule: CourseWeek,
    /// Theme configured for the current week, if any
    pub theme: Option<String>,
}

/// 1-based week number of `today` relative to `start`.
///
/// Days before the start give zero or negative weeks.
pub fn week_number(start: NaiveDate, today: NaiveDate) -> i64 {
    let elapsed = (today - start).num_days();
    elapsed.div_euclid(DAYS_PER_WEEK) + 1
}

/// Classify `today` against a class calendar of `duration_weeks` weeks.
pub fn course_week(start: NaiveDate, duration_weeks: i32, today: NaiveDate) -> CourseWeek {
    if today < start {
        return CourseWeek::NotStarted {
            starts_in_days: (start - today).num_days(),
        };
    }

    let week = week_number(start, today);
    if week > i64::from(duration_weeks) {
        CourseWeek::Completed
    } else {
        CourseWeek::InProgress { week: week as i32 }
    }
}

/// Look up the theme for a 1-based week.
pub fn theme_for_week(themes: &[String], week: i32) -> Option<&str> {
    if week < 1 {
        return None;
    }
    themes
        .get((week - 1) as usize)
        .map(String::as_str)
        .filter(|theme| !theme.trim().is_empty())
}

/// Build the current-week view for a class.
pub fn week_info(
    class_id: Uuid,
    start: NaiveDate,
    duration_weeks: i32,
    themes: &[String],
    today: NaiveDate,
) -> WeekInfo {
    let schedule = course_week(start, duration_weeks, today);
    let theme = match schedule {
        CourseWeek::InProgress { week } => theme_for_week(themes, week).map(str::to_string),
        _ => None,
    };

    WeekInfo {
        class_id,
        today,
        schedule,
        theme,
    }
}
