//! Proto to domain conversion for gRPC responses.
//!
//! A malformed field coming back from a service is a server fault, so every
//! parse failure here becomes an internal error.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use common::{wire, AppError, AppResult};
use domain::{
    Announcement, Answer, Class, ClassResults, ClassTemplate, Comment, CommentStatus, Feedback,
    FellowshipTemplate, Member, MemberKind, Membership, Question, QuestionDraft, QuestionKind,
    Survey, SurveyDetail, SurveyKind, SurveyResponse, SurveyResults,
};
use proto::cohort as pb;

fn malformed(field: &str) -> AppError {
    AppError::internal(format!("Invalid {} from service", field))
}

pub(crate) fn uuid(field: &str, value: &str) -> AppResult<Uuid> {
    wire::parse_uuid(field, value).map_err(|_| malformed(field))
}

fn opt_uuid(field: &str, value: Option<&str>) -> AppResult<Option<Uuid>> {
    wire::parse_opt_uuid(field, value).map_err(|_| malformed(field))
}

pub(crate) fn timestamp(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    wire::parse_timestamp(field, value).map_err(|_| malformed(field))
}

fn opt_timestamp(field: &str, value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    wire::parse_opt_timestamp(field, value).map_err(|_| malformed(field))
}

fn date(field: &str, value: &str) -> AppResult<NaiveDate> {
    wire::parse_date(field, value).map_err(|_| malformed(field))
}

fn survey_kind(value: &str) -> AppResult<SurveyKind> {
    SurveyKind::parse(value).map_err(|_| malformed("survey kind"))
}

fn question_kind(value: &str) -> AppResult<QuestionKind> {
    QuestionKind::parse(value).map_err(|_| malformed("question kind"))
}

fn member_kind(value: &str) -> AppResult<MemberKind> {
    match value {
        "instructor" => Ok(MemberKind::Instructor),
        "student" => Ok(MemberKind::Student),
        _ => Err(malformed("member kind")),
    }
}

pub(crate) fn class(p: pb::Class) -> AppResult<Class> {
    Ok(Class {
        id: uuid("class id", &p.id)?,
        name: p.name,
        description: p.description,
        start_date: date("start_date", &p.start_date)?,
        duration_weeks: p.duration_weeks,
        weekly_themes: p.weekly_themes,
        template_id: opt_uuid("template_id", p.template_id.as_deref())?,
        archived: p.archived,
        created_at: timestamp("created_at", &p.created_at)?,
        updated_at: timestamp("updated_at", &p.updated_at)?,
    })
}

pub(crate) fn class_template(p: pb::ClassTemplate) -> AppResult<ClassTemplate> {
    Ok(ClassTemplate {
        id: uuid("template id", &p.id)?,
        name: p.name,
        description: p.description,
        duration_weeks: p.duration_weeks,
        weekly_themes: p.weekly_themes,
        created_at: timestamp("created_at", &p.created_at)?,
    })
}

pub(crate) fn member(p: pb::Member) -> AppResult<Member> {
    Ok(Member {
        id: uuid("member id", &p.id)?,
        class_id: uuid("class_id", &p.class_id)?,
        kind: member_kind(&p.kind)?,
        user_id: p.user_id.filter(|u| !u.is_empty()),
        email: p.email,
        name: p.name,
        created_at: timestamp("created_at", &p.created_at)?,
    })
}

pub(crate) fn membership(p: pb::Membership) -> AppResult<Membership> {
    Ok(Membership {
        class_id: uuid("class_id", &p.class_id)?,
        member_id: uuid("member_id", &p.member_id)?,
        kind: member_kind(&p.kind)?,
    })
}

pub(crate) fn survey(p: pb::Survey) -> AppResult<Survey> {
    Ok(Survey {
        id: uuid("survey id", &p.id)?,
        class_id: uuid("class_id", &p.class_id)?,
        title: p.title,
        kind: survey_kind(&p.kind)?,
        week: p.week,
        is_open: p.is_open,
        due_at: opt_timestamp("due_at", p.due_at.as_deref())?,
        created_at: timestamp("created_at", &p.created_at)?,
    })
}

pub(crate) fn question(p: pb::Question) -> AppResult<Question> {
    Ok(Question {
        id: uuid("question id", &p.id)?,
        survey_id: uuid("survey_id", &p.survey_id)?,
        position: p.position,
        prompt: p.prompt,
        kind: question_kind(&p.kind)?,
        competency: p.competency.filter(|c| !c.is_empty()),
    })
}

pub(crate) fn detail(p: pb::SurveyDetail) -> AppResult<SurveyDetail> {
    let survey_proto = p.survey.ok_or_else(|| malformed("survey detail"))?;
    Ok(SurveyDetail {
        survey: survey(survey_proto)?,
        questions: p
            .questions
            .into_iter()
            .map(question)
            .collect::<AppResult<_>>()?,
    })
}

pub(crate) fn draft(p: pb::QuestionDraft) -> AppResult<QuestionDraft> {
    Ok(QuestionDraft {
        prompt: p.prompt,
        kind: question_kind(&p.kind)?,
        competency: p.competency.filter(|c| !c.is_empty()),
    })
}

pub(crate) fn draft_to_proto(d: QuestionDraft) -> pb::QuestionDraft {
    pb::QuestionDraft {
        prompt: d.prompt,
        kind: d.kind.to_string(),
        competency: d.competency,
    }
}

pub(crate) fn fellowship_template(p: pb::FellowshipTemplate) -> AppResult<FellowshipTemplate> {
    Ok(FellowshipTemplate {
        id: uuid("template id", &p.id)?,
        name: p.name,
        description: p.description,
        survey_kind: survey_kind(&p.survey_kind)?,
        questions: p
            .questions
            .into_iter()
            .map(draft)
            .collect::<AppResult<_>>()?,
        created_at: timestamp("created_at", &p.created_at)?,
    })
}

fn answer(p: pb::Answer) -> AppResult<Answer> {
    Ok(Answer {
        id: uuid("answer id", &p.id)?,
        response_id: uuid("response_id", &p.response_id)?,
        question_id: uuid("question_id", &p.question_id)?,
        rating: p.rating,
        text: p.text,
    })
}

pub(crate) fn response(p: pb::SurveyResponse) -> AppResult<SurveyResponse> {
    Ok(SurveyResponse {
        id: uuid("response id", &p.id)?,
        survey_id: uuid("survey_id", &p.survey_id)?,
        respondent_id: uuid("respondent_id", &p.respondent_id)?,
        subject_id: opt_uuid("subject_id", p.subject_id.as_deref())?,
        submitted_at: timestamp("submitted_at", &p.submitted_at)?,
        answers: p
            .answers
            .into_iter()
            .map(answer)
            .collect::<AppResult<_>>()?,
    })
}

pub(crate) fn class_results(p: pb::ClassResults) -> AppResult<ClassResults> {
    let surveys = p
        .surveys
        .into_iter()
        .map(|s| {
            Ok(SurveyResults {
                detail: detail(s.detail.ok_or_else(|| malformed("survey results"))?)?,
                responses: s
                    .responses
                    .into_iter()
                    .map(response)
                    .collect::<AppResult<_>>()?,
            })
        })
        .collect::<AppResult<_>>()?;

    Ok(ClassResults {
        class_id: uuid("class_id", &p.class_id)?,
        surveys,
        students: p
            .students
            .into_iter()
            .map(member)
            .collect::<AppResult<_>>()?,
    })
}

pub(crate) fn comment(p: pb::Comment) -> AppResult<Comment> {
    Ok(Comment {
        id: uuid("comment id", &p.id)?,
        survey_id: uuid("survey_id", &p.survey_id)?,
        class_id: uuid("class_id", &p.class_id)?,
        author_id: uuid("author_id", &p.author_id)?,
        subject_id: opt_uuid("subject_id", p.subject_id.as_deref())?,
        body: p.body,
        status: CommentStatus::parse(&p.status).map_err(|_| malformed("comment status"))?,
        created_at: timestamp("created_at", &p.created_at)?,
        moderated_at: opt_timestamp("moderated_at", p.moderated_at.as_deref())?,
    })
}

pub(crate) fn feedback(p: pb::Feedback) -> AppResult<Feedback> {
    Ok(Feedback {
        id: uuid("feedback id", &p.id)?,
        class_id: uuid("class_id", &p.class_id)?,
        student_id: opt_uuid("student_id", p.student_id.as_deref())?,
        week: p.week,
        rating: p.rating,
        body: p.body,
        created_at: timestamp("created_at", &p.created_at)?,
    })
}

pub(crate) fn announcement(p: pb::Announcement) -> AppResult<Announcement> {
    Ok(Announcement {
        id: uuid("announcement id", &p.id)?,
        class_id: uuid("class_id", &p.class_id)?,
        title: p.title,
        body: p.body,
        author_user_id: p.author_user_id,
        pinned: p.pinned,
        created_at: timestamp("created_at", &p.created_at)?,
    })
}
