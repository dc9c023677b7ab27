//! Domain layer - Core business entities and rules for cohort programs.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Services translate these types to and from the proto crate.

pub mod analytics;
pub mod class;
pub mod constants;
pub mod engagement;
pub mod error;
pub mod identity;
pub mod role;
pub mod roster;
pub mod schedule;
pub mod survey;
pub mod validation;

pub use analytics::{
    ClassResults, CompetencyGap, FeedbackSummary, GapAnalysis, QuestionSummary, StudentGap,
    SurveyResults, SurveySummary, WeekFeedback,
};
pub use class::{Class, ClassTemplate, ClassUpdate, NewClass, NewClassTemplate, ValidNewClass};
pub use constants::*;
pub use engagement::{
    Announcement, Comment, CommentStatus, Feedback, NewAnnouncement, NewComment, NewFeedback,
};
pub use error::{DomainError, DomainResult};
pub use identity::{check_role_change, Invitation, InvitationStatus, SessionIdentity, User};
pub use role::Role;
pub use roster::{Member, MemberKind, Membership, NewMember};
pub use schedule::{CourseWeek, WeekInfo};
pub use survey::{
    Answer, FellowshipTemplate, NewAnswer, NewFellowshipTemplate, NewResponse, NewSurvey,
    Question, QuestionDraft, QuestionKind, Survey, SurveyDetail, SurveyKind, SurveyResponse,
    SurveyUpdate,
};
