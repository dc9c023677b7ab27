//! Domain to proto conversions.

use tonic::Status;

use common::wire::format_date;
use domain::{
    Announcement, Answer, Class, ClassTemplate, Comment, Feedback, FellowshipTemplate, Member,
    Membership, Question, QuestionDraft, QuestionKind, Survey, SurveyDetail, SurveyResponse,
};
use proto::cohort as pb;

pub(super) fn class_to_proto(class: &Class) -> pb::Class {
    pb::Class {
        id: class.id.to_string(),
        name: class.name.clone(),
        description: class.description.clone(),
        start_date: format_date(class.start_date),
        duration_weeks: class.duration_weeks,
        weekly_themes: class.weekly_themes.clone(),
        template_id: class.template_id.map(|id| id.to_string()),
        archived: class.archived,
        created_at: class.created_at.to_rfc3339(),
        updated_at: class.updated_at.to_rfc3339(),
    }
}

pub(super) fn template_to_proto(template: &ClassTemplate) -> pb::ClassTemplate {
    pb::ClassTemplate {
        id: template.id.to_string(),
        name: template.name.clone(),
        description: template.description.clone(),
        duration_weeks: template.duration_weeks,
        weekly_themes: template.weekly_themes.clone(),
        created_at: template.created_at.to_rfc3339(),
    }
}

pub(super) fn member_to_proto(member: &Member) -> pb::Member {
    pb::Member {
        id: member.id.to_string(),
        class_id: member.class_id.to_string(),
        kind: member.kind.to_string(),
        user_id: member.user_id.clone(),
        email: member.email.clone(),
        name: member.name.clone(),
        created_at: member.created_at.to_rfc3339(),
    }
}

pub(super) fn membership_to_proto(membership: &Membership) -> pb::Membership {
    pb::Membership {
        class_id: membership.class_id.to_string(),
        member_id: membership.member_id.to_string(),
        kind: membership.kind.to_string(),
    }
}

pub(super) fn survey_to_proto(survey: &Survey) -> pb::Survey {
    pb::Survey {
        id: survey.id.to_string(),
        class_id: survey.class_id.to_string(),
        title: survey.title.clone(),
        kind: survey.kind.as_str().to_string(),
        week: survey.week,
        is_open: survey.is_open,
        due_at: survey.due_at.map(|dt| dt.to_rfc3339()),
        created_at: survey.created_at.to_rfc3339(),
    }
}

pub(super) fn question_to_proto(question: &Question) -> pb::Question {
    pb::Question {
        id: question.id.to_string(),
        survey_id: question.survey_id.to_string(),
        position: question.position,
        prompt: question.prompt.clone(),
        kind: question.kind.as_str().to_string(),
        competency: question.competency.clone(),
    }
}

pub(super) fn detail_to_proto(detail: &SurveyDetail) -> pb::SurveyDetail {
    pb::SurveyDetail {
        survey: Some(survey_to_proto(&detail.survey)),
        questions: detail.questions.iter().map(question_to_proto).collect(),
    }
}

pub(super) fn draft_to_proto(draft: &QuestionDraft) -> pb::QuestionDraft {
    pb::QuestionDraft {
        prompt: draft.prompt.clone(),
        kind: draft.kind.as_str().to_string(),
        competency: draft.competency.clone(),
    }
}

pub(super) fn draft_from_proto(draft: pb::QuestionDraft) -> Result<QuestionDraft, Status> {
    Ok(QuestionDraft {
        prompt: draft.prompt,
        kind: QuestionKind::parse(&draft.kind).map_err(super::domain_status)?,
        competency: draft.competency,
    })
}

pub(super) fn fellowship_to_proto(template: &FellowshipTemplate) -> pb::FellowshipTemplate {
    pb::FellowshipTemplate {
        id: template.id.to_string(),
        name: template.name.clone(),
        description: template.description.clone(),
        survey_kind: template.survey_kind.as_str().to_string(),
        questions: template.questions.iter().map(draft_to_proto).collect(),
        created_at: template.created_at.to_rfc3339(),
    }
}

fn answer_to_proto(answer: &Answer) -> pb::Answer {
    pb::Answer {
        id: answer.id.to_string(),
        response_id: answer.response_id.to_string(),
        question_id: answer.question_id.to_string(),
        rating: answer.rating,
        text: answer.text.clone(),
    }
}

pub(super) fn response_to_proto(response: &SurveyResponse) -> pb::SurveyResponse {
    pb::SurveyResponse {
        id: response.id.to_string(),
        survey_id: response.survey_id.to_string(),
        respondent_id: response.respondent_id.to_string(),
        subject_id: response.subject_id.map(|id| id.to_string()),
        submitted_at: response.submitted_at.to_rfc3339(),
        answers: response.answers.iter().map(answer_to_proto).collect(),
    }
}

pub(super) fn comment_to_proto(comment: &Comment) -> pb::Comment {
    pb::Comment {
        id: comment.id.to_string(),
        survey_id: comment.survey_id.to_string(),
        class_id: comment.class_id.to_string(),
        author_id: comment.author_id.to_string(),
        subject_id: comment.subject_id.map(|id| id.to_string()),
        body: comment.body.clone(),
        status: comment.status.as_str().to_string(),
        created_at: comment.created_at.to_rfc3339(),
        moderated_at: comment.moderated_at.map(|dt| dt.to_rfc3339()),
    }
}

pub(super) fn feedback_to_proto(feedback: &Feedback) -> pb::Feedback {
    pb::Feedback {
        id: feedback.id.to_string(),
        class_id: feedback.class_id.to_string(),
        student_id: feedback.student_id.map(|id| id.to_string()),
        week: feedback.week,
        rating: feedback.rating,
        body: feedback.body.clone(),
        created_at: feedback.created_at.to_rfc3339(),
    }
}

pub(super) fn announcement_to_proto(announcement: &Announcement) -> pb::Announcement {
    pb::Announcement {
        id: announcement.id.to_string(),
        class_id: announcement.class_id.to_string(),
        title: announcement.title.clone(),
        body: announcement.body.clone(),
        author_user_id: announcement.author_user_id.clone(),
        pinned: announcement.pinned,
        created_at: announcement.created_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    #[test]
    fn test_class_dates_use_wire_formats() {
        let class = Class {
            id: Uuid::new_v4(),
            name: "Fall".to_string(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            duration_weeks: 8,
            weekly_themes: vec!["Kickoff".to_string()],
            template_id: None,
            archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let proto = class_to_proto(&class);
        assert_eq!(proto.start_date, "2024-09-02");
        assert_eq!(proto.template_id, None);
        assert!(chrono::DateTime::parse_from_rfc3339(&proto.created_at).is_ok());
    }

    #[test]
    fn test_draft_from_proto_rejects_unknown_kind() {
        let draft = pb::QuestionDraft {
            prompt: "How did it go?".to_string(),
            kind: "essay".to_string(),
            competency: None,
        };
        let status = draft_from_proto(draft).unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
