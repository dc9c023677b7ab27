//! Surveys, questions, responses and fellowship templates.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::validation::{check_rating, require_name, require_text};

/// What a survey measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SurveyKind {
    /// Students rate themselves
    SelfAssessment,
    /// Students rate a classmate
    PeerAssessment,
    /// Students rate the course
    CourseFeedback,
}

impl SurveyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyKind::SelfAssessment => "self_assessment",
            SurveyKind::PeerAssessment => "peer_assessment",
            SurveyKind::CourseFeedback => "course_feedback",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "self_assessment" => Ok(SurveyKind::SelfAssessment),
            "peer_assessment" => Ok(SurveyKind::PeerAssessment),
            "course_feedback" => Ok(SurveyKind::CourseFeedback),
            other => Err(DomainError::validation(format!(
                "Unknown survey kind '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SurveyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer format of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Rating,
    Text,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Rating => "rating",
            QuestionKind::Text => "text",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "rating" => Ok(QuestionKind::Rating),
            "text" => Ok(QuestionKind::Text),
            other => Err(DomainError::validation(format!(
                "Unknown question kind '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Survey assigned to a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Survey {
    pub id: Uuid,
    pub class_id: Uuid,
    pub title: String,
    pub kind: SurveyKind,
    /// Program week this survey belongs to
    pub week: Option<i32>,
    pub is_open: bool,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Survey {
    /// A survey accepts responses while open and before its due time.
    pub fn accepts_responses(&self, now: DateTime<Utc>) -> bool {
        self.is_open && self.due_at.map_or(true, |due| now <= due)
    }
}

/// Survey creation input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSurvey {
    pub title: String,
    pub kind: SurveyKind,
    pub week: Option<i32>,
    pub due_at: Option<DateTime<Utc>>,
}

impl NewSurvey {
    pub fn validate(self) -> DomainResult<Self> {
        if let Some(week) = self.week {
            check_week(week)?;
        }
        Ok(Self {
            title: require_name("Survey title", &self.title)?,
            ..self
        })
    }
}

/// Partial survey update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveyUpdate {
    pub title: Option<String>,
    pub is_open: Option<bool>,
    pub week: Option<i32>,
    pub due_at: Option<DateTime<Utc>>,
    /// Remove the due date; exclusive with `due_at`
    #[serde(default)]
    pub clear_due_at: bool,
}

impl SurveyUpdate {
    pub fn apply_to(self, survey: &mut Survey) -> DomainResult<()> {
        if self.clear_due_at && self.due_at.is_some() {
            return Err(DomainError::validation(
                "Set a due date or clear it, not both",
            ));
        }
        if let Some(title) = self.title {
            survey.title = require_name("Survey title", &title)?;
        }
        if let Some(is_open) = self.is_open {
            survey.is_open = is_open;
        }
        if let Some(week) = self.week {
            check_week(week)?;
            survey.week = Some(week);
        }
        if self.clear_due_at {
            survey.due_at = None;
        } else if let Some(due_at) = self.due_at {
            survey.due_at = Some(due_at);
        }
        Ok(())
    }
}

/// Question belonging to a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Question {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Skill this question measures; pairs self and peer ratings
    pub competency: Option<String>,
}

impl Question {
    /// Key used to pair self and peer ratings.
    pub fn competency_key(&self) -> String {
        self.competency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.prompt.trim())
            .to_string()
    }
}

/// Question input, also the element type of fellowship templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuestionDraft {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub competency: Option<String>,
}

impl QuestionDraft {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            prompt: require_text("Question prompt", &self.prompt)?,
            kind: self.kind,
            competency: self
                .competency
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

/// Survey together with its ordered questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SurveyDetail {
    pub survey: Survey,
    pub questions: Vec<Question>,
}

/// Reusable question set for a survey kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FellowshipTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub survey_kind: SurveyKind,
    pub questions: Vec<QuestionDraft>,
    pub created_at: DateTime<Utc>,
}

/// Fellowship template creation input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFellowshipTemplate {
    pub name: String,
    pub description: String,
    pub survey_kind: SurveyKind,
    pub questions: Vec<QuestionDraft>,
}

impl NewFellowshipTemplate {
    pub fn validate(self) -> DomainResult<Self> {
        if self.questions.is_empty() {
            return Err(DomainError::validation(
                "A fellowship template needs at least one question",
            ));
        }
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Self {
            name: require_name("Template name", &self.name)?,
            description: self.description.trim().to_string(),
            survey_kind: self.survey_kind,
            questions,
        })
    }
}

/// Stored answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Answer {
    pub id: Uuid,
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub rating: Option<i32>,
    pub text: Option<String>,
}

/// One submission of a survey by a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    /// Student who filled in the survey
    pub respondent_id: Uuid,
    /// Student being rated (self or peer); none for course feedback
    pub subject_id: Option<Uuid>,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<Answer>,
}

/// Answer input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewAnswer {
    pub question_id: Uuid,
    pub rating: Option<i32>,
    pub text: Option<String>,
}

/// Response submission input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewResponse {
    pub respondent_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub answers: Vec<NewAnswer>,
}

impl NewResponse {
    /// Check a submission against the survey's rules and questions.
    ///
    /// Returns the normalized submission with the subject resolved for the
    /// survey kind. Roster membership of respondent and subject is checked
    /// by the caller, which owns the roster.
    pub fn validate(self, detail: &SurveyDetail, now: DateTime<Utc>) -> DomainResult<Self> {
        let survey = &detail.survey;
        if !survey.accepts_responses(now) {
            return Err(DomainError::SurveyClosed);
        }

        let subject_id = match survey.kind {
            SurveyKind::SelfAssessment => match self.subject_id {
                Some(subject) if subject != self.respondent_id => {
                    return Err(DomainError::validation(
                        "A self-assessment can only rate yourself",
                    ))
                }
                _ => Some(self.respondent_id),
            },
            SurveyKind::PeerAssessment => match self.subject_id {
                None => {
                    return Err(DomainError::validation(
                        "A peer assessment needs a classmate to rate",
                    ))
                }
                Some(subject) if subject == self.respondent_id => {
                    return Err(DomainError::validation(
                        "Use the self-assessment to rate yourself",
                    ))
                }
                subject => subject,
            },
            SurveyKind::CourseFeedback => None,
        };

        let mut seen = HashSet::new();
        let mut answers = Vec::with_capacity(self.answers.len());
        for answer in self.answers {
            let question = detail
                .questions
                .iter()
                .find(|q| q.id == answer.question_id)
                .ok_or_else(|| {
                    DomainError::validation("Answer refers to a question outside this survey")
                })?;
            if !seen.insert(question.id) {
                return Err(DomainError::validation(format!(
                    "Question {} answered more than once",
                    question.position
                )));
            }
            answers.push(normalize_answer(question, answer)?);
        }

        if let Some(missing) = detail
            .questions
            .iter()
            .find(|q| q.kind == QuestionKind::Rating && !seen.contains(&q.id))
        {
            return Err(DomainError::validation(format!(
                "Question {} needs a rating",
                missing.position
            )));
        }

        Ok(Self {
            respondent_id: self.respondent_id,
            subject_id,
            answers,
        })
    }
}

fn normalize_answer(question: &Question, answer: NewAnswer) -> DomainResult<NewAnswer> {
    match question.kind {
        QuestionKind::Rating => {
            let rating = answer.rating.ok_or_else(|| {
                DomainError::validation(format!("Question {} needs a rating", question.position))
            })?;
            Ok(NewAnswer {
                question_id: answer.question_id,
                rating: Some(check_rating(rating)?),
                text: None,
            })
        }
        QuestionKind::Text => {
            let text = answer.text.as_deref().unwrap_or_default();
            Ok(NewAnswer {
                question_id: answer.question_id,
                rating: None,
                text: Some(require_text("Answer", text)?),
            })
        }
    }
}

fn check_week(week: i32) -> DomainResult<()> {
    if week >= 1 {
        Ok(())
    } else {
        Err(DomainError::validation("Week numbers start at 1"))
    }
}
