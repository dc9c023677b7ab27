//! SeaORM entities, one module per table.

pub mod class;
pub mod class_announcement;
pub mod class_template;
pub mod feedback;
pub mod fellowship_template;
pub mod instructor;
pub mod student;
pub mod survey;
pub mod survey_answer;
pub mod survey_comment;
pub mod survey_question;
pub mod survey_response;

use sea_orm::prelude::Json;

/// Decode a JSON array of theme strings; malformed values read as no themes.
pub(crate) fn themes_from_json(value: Json) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

pub(crate) fn themes_to_json(themes: &[String]) -> Json {
    Json::from(themes.to_vec())
}
