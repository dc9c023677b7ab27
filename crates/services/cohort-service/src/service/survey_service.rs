//! Survey service - authoring, fellowship templates and response intake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{
    ClassResults, FellowshipTemplate, MemberKind, NewFellowshipTemplate, NewResponse, NewSurvey,
    Question, QuestionDraft, Survey, SurveyDetail, SurveyResponse, SurveyResults, SurveyUpdate,
};

use crate::repository::{ClassRepository, RosterRepository, SurveyRepository};

/// Survey service trait for dependency injection.
#[async_trait]
pub trait SurveyService: Send + Sync {
    async fn create_survey(
        &self,
        class_id: Uuid,
        survey: NewSurvey,
        questions: Vec<QuestionDraft>,
    ) -> AppResult<SurveyDetail>;

    async fn get_survey(&self, id: Uuid) -> AppResult<SurveyDetail>;

    async fn list_surveys(&self, class_id: Uuid) -> AppResult<Vec<Survey>>;

    async fn update_survey(&self, id: Uuid, update: SurveyUpdate) -> AppResult<Survey>;

    async fn delete_survey(&self, id: Uuid) -> AppResult<()>;

    async fn add_question(&self, survey_id: Uuid, question: QuestionDraft) -> AppResult<Question>;

    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> AppResult<()>;

    async fn list_fellowship_templates(&self) -> AppResult<Vec<FellowshipTemplate>>;

    async fn create_fellowship_template(
        &self,
        template: NewFellowshipTemplate,
    ) -> AppResult<FellowshipTemplate>;

    /// Create a survey in a class from a template's questions
    async fn apply_fellowship_template(
        &self,
        template_id: Uuid,
        class_id: Uuid,
        title: Option<String>,
        week: Option<i32>,
        due_at: Option<DateTime<Utc>>,
    ) -> AppResult<SurveyDetail>;

    /// Validate and store one student's response
    async fn submit_response(&self, survey_id: Uuid, response: NewResponse)
        -> AppResult<SurveyResponse>;

    async fn list_responses(&self, survey_id: Uuid) -> AppResult<Vec<SurveyResponse>>;

    /// Every survey of a class with questions, responses and the student roster
    async fn class_results(&self, class_id: Uuid) -> AppResult<ClassResults>;
}

/// Concrete implementation of SurveyService using repositories.
pub struct SurveyManager {
    classes: Arc<dyn ClassRepository>,
    roster: Arc<dyn RosterRepository>,
    surveys: Arc<dyn SurveyRepository>,
}

impl SurveyManager {
    pub fn new(
        classes: Arc<dyn ClassRepository>,
        roster: Arc<dyn RosterRepository>,
        surveys: Arc<dyn SurveyRepository>,
    ) -> Self {
        Self {
            classes,
            roster,
            surveys,
        }
    }

    async fn ensure_class(&self, class_id: Uuid) -> AppResult<()> {
        self.classes.find_by_id(class_id).await?.ok_or_not_found()?;
        Ok(())
    }

    /// Whether `student_id` is on the student roster of `class_id`.
    async fn student_in(&self, class_id: Uuid, student_id: Uuid) -> AppResult<bool> {
        Ok(self
            .roster
            .find(MemberKind::Student, student_id)
            .await?
            .is_some_and(|m| m.class_id == class_id))
    }
}

#[async_trait]
impl SurveyService for SurveyManager {
    async fn create_survey(
        &self,
        class_id: Uuid,
        survey: NewSurvey,
        questions: Vec<QuestionDraft>,
    ) -> AppResult<SurveyDetail> {
        let survey = survey.validate()?;
        let questions = questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        self.ensure_class(class_id).await?;

        let detail = self.surveys.create(class_id, survey, questions).await?;
        tracing::info!(
            class_id = %class_id,
            survey_id = %detail.survey.id,
            questions = detail.questions.len(),
            "Survey created"
        );
        Ok(detail)
    }

    async fn get_survey(&self, id: Uuid) -> AppResult<SurveyDetail> {
        self.surveys.find_detail(id).await?.ok_or_not_found()
    }

    async fn list_surveys(&self, class_id: Uuid) -> AppResult<Vec<Survey>> {
        self.surveys.list_for_class(class_id).await
    }

    async fn update_survey(&self, id: Uuid, update: SurveyUpdate) -> AppResult<Survey> {
        let mut survey = self.surveys.find(id).await?.ok_or_not_found()?;
        update.apply_to(&mut survey)?;
        self.surveys.save(survey).await
    }

    async fn delete_survey(&self, id: Uuid) -> AppResult<()> {
        self.surveys.delete(id).await
    }

    async fn add_question(&self, survey_id: Uuid, question: QuestionDraft) -> AppResult<Question> {
        let question = question.validate()?;
        self.surveys.find(survey_id).await?.ok_or_not_found()?;
        self.surveys.add_question(survey_id, question).await
    }

    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> AppResult<()> {
        self.surveys.delete_question(survey_id, question_id).await
    }

    async fn list_fellowship_templates(&self) -> AppResult<Vec<FellowshipTemplate>> {
        self.surveys.list_fellowship_templates().await
    }

    async fn create_fellowship_template(
        &self,
        template: NewFellowshipTemplate,
    ) -> AppResult<FellowshipTemplate> {
        self.surveys
            .create_fellowship_template(template.validate()?)
            .await
    }

    async fn apply_fellowship_template(
        &self,
        template_id: Uuid,
        class_id: Uuid,
        title: Option<String>,
        week: Option<i32>,
        due_at: Option<DateTime<Utc>>,
    ) -> AppResult<SurveyDetail> {
        let template = self
            .surveys
            .find_fellowship_template(template_id)
            .await?
            .ok_or_not_found()?;

        let survey = NewSurvey {
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| template.name.clone()),
            kind: template.survey_kind,
            week,
            due_at,
        };

        self.create_survey(class_id, survey, template.questions).await
    }

    async fn submit_response(
        &self,
        survey_id: Uuid,
        response: NewResponse,
    ) -> AppResult<SurveyResponse> {
        let detail = self.get_survey(survey_id).await?;
        let class_id = detail.survey.class_id;

        if !self.student_in(class_id, response.respondent_id).await? {
            return Err(AppError::Forbidden);
        }

        let response = response.validate(&detail, Utc::now())?;

        if let Some(subject_id) = response.subject_id {
            if subject_id != response.respondent_id && !self.student_in(class_id, subject_id).await?
            {
                return Err(AppError::validation(
                    "The person being rated is not a student in this class",
                ));
            }
        }

        if self
            .surveys
            .response_exists(survey_id, response.respondent_id, response.subject_id)
            .await?
        {
            return Err(AppError::conflict("Response"));
        }

        let stored = self.surveys.create_response(survey_id, response).await?;
        tracing::info!(survey_id = %survey_id, response_id = %stored.id, "Response submitted");
        Ok(stored)
    }

    async fn list_responses(&self, survey_id: Uuid) -> AppResult<Vec<SurveyResponse>> {
        self.surveys.find(survey_id).await?.ok_or_not_found()?;
        self.surveys.list_responses(survey_id).await
    }

    async fn class_results(&self, class_id: Uuid) -> AppResult<ClassResults> {
        self.ensure_class(class_id).await?;

        let details = self.surveys.list_details_for_class(class_id).await?;
        let mut responses: HashMap<Uuid, Vec<SurveyResponse>> = HashMap::new();
        for response in self.surveys.list_responses_for_class(class_id).await? {
            responses.entry(response.survey_id).or_default().push(response);
        }
        let students = self.roster.list(class_id, MemberKind::Student).await?;

        Ok(ClassResults {
            class_id,
            surveys: details
                .into_iter()
                .map(|detail| SurveyResults {
                    responses: responses.remove(&detail.survey.id).unwrap_or_default(),
                    detail,
                })
                .collect(),
            students,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use domain::{Answer, Class, Member, NewAnswer, QuestionKind, SurveyKind};
    use mockall::predicate::eq;

    use crate::repository::{MockClassRepository, MockRosterRepository, MockSurveyRepository};

    struct Fixture {
        class_id: Uuid,
        survey_id: Uuid,
        rating_question: Uuid,
        alice: Uuid,
        bob: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                class_id: Uuid::new_v4(),
                survey_id: Uuid::new_v4(),
                rating_question: Uuid::new_v4(),
                alice: Uuid::new_v4(),
                bob: Uuid::new_v4(),
            }
        }

        fn detail(&self, kind: SurveyKind) -> SurveyDetail {
            SurveyDetail {
                survey: Survey {
                    id: self.survey_id,
                    class_id: self.class_id,
                    title: "Week 3 check-in".to_string(),
                    kind,
                    week: Some(3),
                    is_open: true,
                    due_at: Some(Utc::now() + Duration::days(2)),
                    created_at: Utc::now(),
                },
                questions: vec![Question {
                    id: self.rating_question,
                    survey_id: self.survey_id,
                    position: 1,
                    prompt: "Communication".to_string(),
                    kind: QuestionKind::Rating,
                    competency: Some("communication".to_string()),
                }],
            }
        }

        fn student(&self, id: Uuid, class_id: Uuid) -> Member {
            Member {
                id,
                class_id,
                kind: MemberKind::Student,
                user_id: Some(format!("user_{}", id.simple())),
                email: format!("{}@example.com", id.simple()),
                name: "Student".to_string(),
                created_at: Utc::now(),
            }
        }

        fn surveys(&self, kind: SurveyKind) -> MockSurveyRepository {
            let mut surveys = MockSurveyRepository::new();
            let detail = self.detail(kind);
            surveys
                .expect_find_detail()
                .with(eq(self.survey_id))
                .returning(move |_| Ok(Some(detail.clone())));
            surveys
        }

        /// Alice and Bob are students of the fixture class; anyone else is elsewhere.
        fn roster(&self) -> MockRosterRepository {
            let mut roster = MockRosterRepository::new();
            let (class_id, alice, bob) = (self.class_id, self.alice, self.bob);
            let other_class = Uuid::new_v4();
            let fixture_student = |id: Uuid, class_id: Uuid| Member {
                id,
                class_id,
                kind: MemberKind::Student,
                user_id: None,
                email: "s@example.com".to_string(),
                name: "Student".to_string(),
                created_at: Utc::now(),
            };
            roster
                .expect_find()
                .with(eq(MemberKind::Student), mockall::predicate::always())
                .returning(move |_, id| {
                    let class = if id == alice || id == bob {
                        class_id
                    } else {
                        other_class
                    };
                    Ok(Some(fixture_student(id, class)))
                });
            roster
        }

        fn rating(&self, respondent: Uuid, subject: Option<Uuid>, rating: i32) -> NewResponse {
            NewResponse {
                respondent_id: respondent,
                subject_id: subject,
                answers: vec![NewAnswer {
                    question_id: self.rating_question,
                    rating: Some(rating),
                    text: None,
                }],
            }
        }
    }

    fn manager(
        classes: MockClassRepository,
        roster: MockRosterRepository,
        surveys: MockSurveyRepository,
    ) -> SurveyManager {
        SurveyManager::new(Arc::new(classes), Arc::new(roster), Arc::new(surveys))
    }

    fn echo_response(survey_id: Uuid, response: NewResponse) -> SurveyResponse {
        let id = Uuid::new_v4();
        SurveyResponse {
            id,
            survey_id,
            respondent_id: response.respondent_id,
            subject_id: response.subject_id,
            submitted_at: Utc::now(),
            answers: response
                .answers
                .into_iter()
                .map(|a| Answer {
                    id: Uuid::new_v4(),
                    response_id: id,
                    question_id: a.question_id,
                    rating: a.rating,
                    text: a.text,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_self_assessment_subject_defaults_to_respondent() {
        let f = Fixture::new();
        let mut surveys = f.surveys(SurveyKind::SelfAssessment);
        surveys
            .expect_response_exists()
            .with(eq(f.survey_id), eq(f.alice), eq(Some(f.alice)))
            .returning(|_, _, _| Ok(false));
        surveys
            .expect_create_response()
            .returning(|survey_id, response| Ok(echo_response(survey_id, response)));

        let stored = manager(MockClassRepository::new(), f.roster(), surveys)
            .submit_response(f.survey_id, f.rating(f.alice, None, 4))
            .await
            .unwrap();

        assert_eq!(stored.subject_id, Some(f.alice));
        assert_eq!(stored.answers[0].rating, Some(4));
    }

    #[tokio::test]
    async fn test_peer_assessment_of_classmate() {
        let f = Fixture::new();
        let mut surveys = f.surveys(SurveyKind::PeerAssessment);
        surveys.expect_response_exists().returning(|_, _, _| Ok(false));
        surveys
            .expect_create_response()
            .returning(|survey_id, response| Ok(echo_response(survey_id, response)));

        let stored = manager(MockClassRepository::new(), f.roster(), surveys)
            .submit_response(f.survey_id, f.rating(f.alice, Some(f.bob), 3))
            .await
            .unwrap();

        assert_eq!(stored.respondent_id, f.alice);
        assert_eq!(stored.subject_id, Some(f.bob));
    }

    #[tokio::test]
    async fn test_peer_subject_must_be_in_class() {
        let f = Fixture::new();
        let mut surveys = f.surveys(SurveyKind::PeerAssessment);
        surveys.expect_create_response().never();

        let outsider = Uuid::new_v4();
        let result = manager(MockClassRepository::new(), f.roster(), surveys)
            .submit_response(f.survey_id, f.rating(f.alice, Some(outsider), 3))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_respondent_from_other_class_is_forbidden() {
        let f = Fixture::new();
        let mut surveys = f.surveys(SurveyKind::SelfAssessment);
        surveys.expect_create_response().never();

        let result = manager(MockClassRepository::new(), f.roster(), surveys)
            .submit_response(f.survey_id, f.rating(Uuid::new_v4(), None, 3))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_duplicate_response_conflicts() {
        let f = Fixture::new();
        let mut surveys = f.surveys(SurveyKind::SelfAssessment);
        surveys.expect_response_exists().returning(|_, _, _| Ok(true));
        surveys.expect_create_response().never();

        let result = manager(MockClassRepository::new(), f.roster(), surveys)
            .submit_response(f.survey_id, f.rating(f.alice, None, 5))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_course_feedback_lost_race_conflicts() {
        // Both submissions pass the existence check; the unique index rejects the second
        let f = Fixture::new();
        let mut surveys = f.surveys(SurveyKind::CourseFeedback);
        surveys
            .expect_response_exists()
            .with(eq(f.survey_id), eq(f.alice), eq(None))
            .returning(|_, _, _| Ok(false));
        surveys
            .expect_create_response()
            .times(1)
            .returning(|_, _| Err(AppError::conflict("Record")));

        let result = manager(MockClassRepository::new(), f.roster(), surveys)
            .submit_response(f.survey_id, f.rating(f.alice, None, 4))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_rating_rejected() {
        let f = Fixture::new();
        let mut surveys = f.surveys(SurveyKind::SelfAssessment);
        surveys.expect_create_response().never();

        let result = manager(MockClassRepository::new(), f.roster(), surveys)
            .submit_response(f.survey_id, f.rating(f.alice, None, 9))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_apply_fellowship_template_uses_template_questions() {
        let class_id = Uuid::new_v4();
        let template = FellowshipTemplate {
            id: Uuid::new_v4(),
            name: "Peer review".to_string(),
            description: String::new(),
            survey_kind: SurveyKind::PeerAssessment,
            questions: vec![
                QuestionDraft {
                    prompt: "Collaboration".to_string(),
                    kind: QuestionKind::Rating,
                    competency: None,
                },
                QuestionDraft {
                    prompt: "Anything else?".to_string(),
                    kind: QuestionKind::Text,
                    competency: None,
                },
            ],
            created_at: Utc::now(),
        };
        let template_id = template.id;

        let mut classes = MockClassRepository::new();
        classes.expect_find_by_id().returning(|id| {
            Ok(Some(Class {
                id,
                name: "Fall".to_string(),
                description: String::new(),
                start_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
                duration_weeks: 8,
                weekly_themes: Vec::new(),
                template_id: None,
                archived: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let mut surveys = MockSurveyRepository::new();
        surveys
            .expect_find_fellowship_template()
            .with(eq(template_id))
            .returning(move |_| Ok(Some(template.clone())));
        surveys
            .expect_create()
            .withf(move |id, survey, questions| {
                *id == class_id
                    && survey.title == "Peer review"
                    && survey.kind == SurveyKind::PeerAssessment
                    && questions.len() == 2
            })
            .returning(|class_id, survey, questions| {
                let survey_id = Uuid::new_v4();
                Ok(SurveyDetail {
                    survey: Survey {
                        id: survey_id,
                        class_id,
                        title: survey.title,
                        kind: survey.kind,
                        week: survey.week,
                        is_open: true,
                        due_at: survey.due_at,
                        created_at: Utc::now(),
                    },
                    questions: questions
                        .into_iter()
                        .enumerate()
                        .map(|(i, q)| Question {
                            id: Uuid::new_v4(),
                            survey_id,
                            position: i as i32 + 1,
                            prompt: q.prompt,
                            kind: q.kind,
                            competency: q.competency,
                        })
                        .collect(),
                })
            });

        let detail = manager(classes, MockRosterRepository::new(), surveys)
            .apply_fellowship_template(template_id, class_id, Some("  ".to_string()), Some(2), None)
            .await
            .unwrap();

        assert_eq!(detail.survey.week, Some(2));
        assert_eq!(detail.questions[1].position, 2);
    }

    #[tokio::test]
    async fn test_class_results_groups_responses_by_survey() {
        let f = Fixture::new();
        let class_id = f.class_id;

        let mut classes = MockClassRepository::new();
        classes.expect_find_by_id().returning(|id| {
            Ok(Some(Class {
                id,
                name: "Fall".to_string(),
                description: String::new(),
                start_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
                duration_weeks: 8,
                weekly_themes: Vec::new(),
                template_id: None,
                archived: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let mut surveys = MockSurveyRepository::new();
        let detail = f.detail(SurveyKind::SelfAssessment);
        surveys
            .expect_list_details_for_class()
            .with(eq(class_id))
            .returning(move |_| Ok(vec![detail.clone()]));
        let survey_id = f.survey_id;
        let first = echo_response(survey_id, f.rating(f.alice, Some(f.alice), 4));
        let second = echo_response(survey_id, f.rating(f.bob, Some(f.bob), 2));
        surveys
            .expect_list_responses_for_class()
            .returning(move |_| Ok(vec![first.clone(), second.clone()]));

        let mut roster = MockRosterRepository::new();
        let alice = f.student(f.alice, class_id);
        roster
            .expect_list()
            .with(eq(class_id), eq(MemberKind::Student))
            .returning(move |_, _| Ok(vec![alice.clone()]));

        let results = manager(classes, roster, surveys)
            .class_results(class_id)
            .await
            .unwrap();

        assert_eq!(results.surveys.len(), 1);
        assert_eq!(results.surveys[0].responses.len(), 2);
        assert_eq!(results.students.len(), 1);
    }
}
