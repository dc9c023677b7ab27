//! Class and class template entities.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_DURATION_WEEKS;
use crate::error::{DomainError, DomainResult};
use crate::schedule::{self, WeekInfo};
use crate::validation::require_name;

/// A cohort running on a weekly calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub duration_weeks: i32,
    /// One theme per week, indexed from week 1
    pub weekly_themes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Class {
    /// Current-week view of this class on `today`.
    pub fn week_info(&self, today: NaiveDate) -> WeekInfo {
        schedule::week_info(
            self.id,
            self.start_date,
            self.duration_weeks,
            &self.weekly_themes,
            today,
        )
    }

    /// Last calendar day of the program.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + chrono::Duration::days(i64::from(self.duration_weeks) * 7 - 1)
    }
}

/// Class creation input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClass {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    /// Required unless a template supplies it
    pub duration_weeks: Option<i32>,
    pub weekly_themes: Option<Vec<String>>,
    pub template_id: Option<Uuid>,
}

impl NewClass {
    /// Fill calendar fields the caller left empty from a template.
    pub fn apply_template(&mut self, template: &ClassTemplate) {
        self.template_id = Some(template.id);
        if self.duration_weeks.is_none() {
            self.duration_weeks = Some(template.duration_weeks);
        }
        if self.weekly_themes.is_none() {
            self.weekly_themes = Some(template.weekly_themes.clone());
        }
        if self.description.trim().is_empty() {
            self.description = template.description.clone();
        }
    }

    /// Validate and normalize into a ready-to-store record.
    pub fn validate(self) -> DomainResult<ValidNewClass> {
        let name = require_name("Class name", &self.name)?;
        let duration_weeks = self
            .duration_weeks
            .ok_or_else(|| DomainError::validation("Duration in weeks is required"))?;
        check_duration(duration_weeks)?;
        let weekly_themes = normalize_themes(self.weekly_themes.unwrap_or_default(), duration_weeks)?;

        Ok(ValidNewClass {
            name,
            description: self.description.trim().to_string(),
            start_date: self.start_date,
            duration_weeks,
            weekly_themes,
            template_id: self.template_id,
        })
    }
}

/// Class input that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidNewClass {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub duration_weeks: i32,
    pub weekly_themes: Vec<String>,
    pub template_id: Option<Uuid>,
}

/// Partial class update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub duration_weeks: Option<i32>,
    pub weekly_themes: Option<Vec<String>>,
}

impl ClassUpdate {
    /// Apply this update to a class, validating the result.
    pub fn apply_to(self, class: &mut Class) -> DomainResult<()> {
        if let Some(name) = self.name {
            class.name = require_name("Class name", &name)?;
        }
        if let Some(description) = self.description {
            class.description = description.trim().to_string();
        }
        if let Some(start_date) = self.start_date {
            class.start_date = start_date;
        }
        if let Some(duration_weeks) = self.duration_weeks {
            check_duration(duration_weeks)?;
            class.duration_weeks = duration_weeks;
        }
        let themes = self
            .weekly_themes
            .unwrap_or_else(|| class.weekly_themes.clone());
        class.weekly_themes = normalize_themes(themes, class.duration_weeks)?;
        class.updated_at = Utc::now();
        Ok(())
    }
}

/// Reusable calendar for new classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClassTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_weeks: i32,
    pub weekly_themes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Class template creation input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClassTemplate {
    pub name: String,
    pub description: String,
    pub duration_weeks: i32,
    pub weekly_themes: Vec<String>,
}

impl NewClassTemplate {
    /// Validate and normalize template input.
    pub fn validate(self) -> DomainResult<Self> {
        let name = require_name("Template name", &self.name)?;
        check_duration(self.duration_weeks)?;
        let weekly_themes = normalize_themes(self.weekly_themes, self.duration_weeks)?;
        Ok(Self {
            name,
            description: self.description.trim().to_string(),
            duration_weeks: self.duration_weeks,
            weekly_themes,
        })
    }
}

fn check_duration(weeks: i32) -> DomainResult<()> {
    if (1..=MAX_DURATION_WEEKS).contains(&weeks) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "Duration must be between 1 and {} weeks",
            MAX_DURATION_WEEKS
        )))
    }
}

/// Trim themes and reject calendars with more themes than weeks.
fn normalize_themes(themes: Vec<String>, duration_weeks: i32) -> DomainResult<Vec<String>> {
    if themes.len() > duration_weeks as usize {
        return Err(DomainError::validation(format!(
            "{} weekly themes given for a {}-week class",
            themes.len(),
            duration_weeks
        )));
    }
    Ok(themes.into_iter().map(|t| t.trim().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_class() -> NewClass {
        NewClass {
            name: "  Spring Fellowship ".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            duration_weeks: None,
            weekly_themes: None,
            template_id: None,
        }
    }

    fn template() -> ClassTemplate {
        ClassTemplate {
            id: Uuid::new_v4(),
            name: "Standard".to_string(),
            description: "Eight week fellowship".to_string(),
            duration_weeks: 8,
            weekly_themes: vec!["Kickoff".to_string(), "Storytelling".to_string()],
            created_at: Utc::now(),
        }
    }

    fn class() -> Class {
        Class {
            id: Uuid::new_v4(),
            name: "Cohort".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            duration_weeks: 4,
            weekly_themes: vec!["A".to_string(), "B".to_string()],
            template_id: None,
            archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_duration_required_without_template() {
        assert!(new_class().validate().is_err());
    }

    #[test]
    fn test_template_fills_calendar() {
        let template = template();
        let mut input = new_class();
        input.apply_template(&template);
        let valid = input.validate().unwrap();

        assert_eq!(valid.name, "Spring Fellowship");
        assert_eq!(valid.duration_weeks, 8);
        assert_eq!(valid.weekly_themes.len(), 2);
        assert_eq!(valid.description, "Eight week fellowship");
        assert_eq!(valid.template_id, Some(template.id));
    }

    #[test]
    fn test_explicit_fields_win_over_template() {
        let mut input = new_class();
        input.duration_weeks = Some(3);
        input.weekly_themes = Some(vec!["Only".to_string()]);
        input.apply_template(&template());
        let valid = input.validate().unwrap();

        assert_eq!(valid.duration_weeks, 3);
        assert_eq!(valid.weekly_themes, vec!["Only".to_string()]);
    }

    #[test]
    fn test_too_many_themes_rejected() {
        let mut input = new_class();
        input.duration_weeks = Some(1);
        input.weekly_themes = Some(vec!["a".to_string(), "b".to_string()]);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_shrinking_duration_below_theme_count_fails() {
        let mut class = class();
        let update = ClassUpdate {
            duration_weeks: Some(1),
            ..Default::default()
        };
        assert!(update.apply_to(&mut class).is_err());
    }

    #[test]
    fn test_update_applies_fields() {
        let mut class = class();
        let update = ClassUpdate {
            name: Some(" Renamed ".to_string()),
            weekly_themes: Some(vec![" X ".to_string()]),
            ..Default::default()
        };
        update.apply_to(&mut class).unwrap();
        assert_eq!(class.name, "Renamed");
        assert_eq!(class.weekly_themes, vec!["X".to_string()]);
    }

    #[test]
    fn test_end_date() {
        let class = class();
        assert_eq!(class.end_date(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }
}
