//! Comments, course feedback and announcements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::validation::{check_rating, require_name, require_text};

/// Moderation state of a survey comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "pending" => Ok(CommentStatus::Pending),
            "approved" => Ok(CommentStatus::Approved),
            "rejected" => Ok(CommentStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "Unknown comment status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text comment left alongside a survey, visible once approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Comment {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub class_id: Uuid,
    pub author_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub body: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub moderated_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// Move a pending comment to a final status.
    pub fn moderate(&mut self, status: CommentStatus) -> DomainResult<()> {
        if status == CommentStatus::Pending {
            return Err(DomainError::validation(
                "Moderation must approve or reject a comment",
            ));
        }
        self.status = status;
        self.moderated_at = Some(Utc::now());
        Ok(())
    }
}

/// Comment input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub author_id: Uuid,
    pub subject_id: Option<Uuid>,
    pub body: String,
}

impl NewComment {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            body: require_text("Comment", &self.body)?,
            ..self
        })
    }
}

/// Weekly course feedback from a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Feedback {
    pub id: Uuid,
    pub class_id: Uuid,
    /// Absent for anonymous feedback
    pub student_id: Option<Uuid>,
    pub week: i32,
    pub rating: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Feedback input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    pub student_id: Option<Uuid>,
    pub week: i32,
    pub rating: i32,
    pub body: String,
}

impl NewFeedback {
    pub fn validate(self) -> DomainResult<Self> {
        if self.week < 1 {
            return Err(DomainError::validation("Week numbers start at 1"));
        }
        Ok(Self {
            rating: check_rating(self.rating)?,
            body: self.body.trim().to_string(),
            ..self
        })
    }
}

/// Class announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Announcement {
    pub id: Uuid,
    pub class_id: Uuid,
    pub title: String,
    pub body: String,
    pub author_user_id: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

/// Announcement input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    pub author_user_id: String,
    pub pinned: bool,
}

impl NewAnnouncement {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            title: require_name("Title", &self.title)?,
            body: require_text("Body", &self.body)?,
            ..self
        })
    }
}

/// Pinned first, then newest first.
pub fn sort_announcements(announcements: &mut [Announcement]) {
    announcements.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn comment() -> Comment {
        Comment {
            id: Uuid::new_v4(),
            survey_id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            subject_id: None,
            body: "Great energy in the workshop".to_string(),
            status: CommentStatus::Pending,
            created_at: Utc::now(),
            moderated_at: None,
        }
    }

    fn announcement(title: &str, pinned: bool, age_hours: i64) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            title: title.to_string(),
            body: "body".to_string(),
            author_user_id: "user_1".to_string(),
            pinned,
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[test]
    fn test_moderation_sets_timestamp() {
        let mut c = comment();
        c.moderate(CommentStatus::Approved).unwrap();
        assert_eq!(c.status, CommentStatus::Approved);
        assert!(c.moderated_at.is_some());
    }

    #[test]
    fn test_cannot_moderate_back_to_pending() {
        let mut c = comment();
        assert!(c.moderate(CommentStatus::Pending).is_err());
    }

    #[test]
    fn test_feedback_validation() {
        let ok = NewFeedback {
            student_id: None,
            week: 2,
            rating: 4,
            body: "  useful ".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.body, "useful");

        let bad_week = NewFeedback {
            student_id: None,
            week: 0,
            rating: 4,
            body: String::new(),
        }
        .validate();
        assert!(bad_week.is_err());

        let bad_rating = NewFeedback {
            student_id: None,
            week: 1,
            rating: 0,
            body: String::new(),
        }
        .validate();
        assert!(bad_rating.is_err());
    }

    #[test]
    fn test_announcements_pinned_then_newest() {
        let mut list = vec![
            announcement("old", false, 48),
            announcement("pinned-old", true, 72),
            announcement("new", false, 1),
            announcement("pinned-new", true, 2),
        ];
        sort_announcements(&mut list);
        let titles: Vec<&str> = list.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["pinned-new", "pinned-old", "new", "old"]);
    }

    #[test]
    fn test_comment_status_parse() {
        assert_eq!(CommentStatus::parse("approved").unwrap(), CommentStatus::Approved);
        assert!(CommentStatus::parse("spam").is_err());
    }
}
