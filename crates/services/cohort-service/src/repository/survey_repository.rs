//! Survey, question, fellowship template and response persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::fellowship_template::{self, Entity as FellowshipTemplateEntity};
use super::entities::survey::{self, Entity as SurveyEntity};
use super::entities::survey_answer::{self, Entity as AnswerEntity};
use super::entities::survey_question::{self, Entity as QuestionEntity};
use super::entities::survey_response::{self, Entity as ResponseEntity};
use super::{transaction_error, update_error};
use common::{AppError, AppResult};
use domain::{
    Answer, FellowshipTemplate, NewFellowshipTemplate, NewResponse, NewSurvey, Question,
    QuestionDraft, Survey, SurveyDetail, SurveyResponse,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Survey repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SurveyRepository: Send + Sync {
    /// Find survey by ID without its questions
    async fn find(&self, id: Uuid) -> AppResult<Option<Survey>>;

    /// Find survey by ID with questions in position order
    async fn find_detail(&self, id: Uuid) -> AppResult<Option<SurveyDetail>>;

    /// List the surveys of a class, oldest first
    async fn list_for_class(&self, class_id: Uuid) -> AppResult<Vec<Survey>>;

    /// List the surveys of a class with their questions
    async fn list_details_for_class(&self, class_id: Uuid) -> AppResult<Vec<SurveyDetail>>;

    /// Insert a survey and its questions atomically
    async fn create(
        &self,
        class_id: Uuid,
        survey: NewSurvey,
        questions: Vec<QuestionDraft>,
    ) -> AppResult<SurveyDetail>;

    /// Persist title, open flag, week and due time
    async fn save(&self, survey: Survey) -> AppResult<Survey>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Append a question after the current last position
    async fn add_question(&self, survey_id: Uuid, question: QuestionDraft) -> AppResult<Question>;

    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> AppResult<()>;

    async fn find_fellowship_template(&self, id: Uuid) -> AppResult<Option<FellowshipTemplate>>;

    async fn list_fellowship_templates(&self) -> AppResult<Vec<FellowshipTemplate>>;

    async fn create_fellowship_template(
        &self,
        template: NewFellowshipTemplate,
    ) -> AppResult<FellowshipTemplate>;

    /// Whether this respondent already answered for this subject
    async fn response_exists(
        &self,
        survey_id: Uuid,
        respondent_id: Uuid,
        subject_id: Option<Uuid>,
    ) -> AppResult<bool>;

    /// Insert a response and its answers atomically
    async fn create_response(&self, survey_id: Uuid, response: NewResponse)
        -> AppResult<SurveyResponse>;

    /// Responses to one survey with their answers, oldest first
    async fn list_responses(&self, survey_id: Uuid) -> AppResult<Vec<SurveyResponse>>;

    /// Responses to every survey of a class
    async fn list_responses_for_class(&self, class_id: Uuid) -> AppResult<Vec<SurveyResponse>>;
}

/// SeaORM implementation of SurveyRepository
pub struct SurveyStore {
    db: DatabaseConnection,
}

impl SurveyStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn questions_for(&self, survey_ids: Vec<Uuid>) -> AppResult<Vec<Question>> {
        if survey_ids.is_empty() {
            return Ok(Vec::new());
        }

        QuestionEntity::find()
            .filter(survey_question::Column::SurveyId.is_in(survey_ids))
            .order_by_asc(survey_question::Column::Position)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| Question::try_from(m).map_err(AppError::from))
            .collect()
    }

    async fn responses_for(&self, survey_ids: Vec<Uuid>) -> AppResult<Vec<SurveyResponse>> {
        if survey_ids.is_empty() {
            return Ok(Vec::new());
        }

        let responses = ResponseEntity::find()
            .filter(survey_response::Column::SurveyId.is_in(survey_ids))
            .order_by_asc(survey_response::Column::SubmittedAt)
            .all(&self.db)
            .await?;

        let response_ids: Vec<Uuid> = responses.iter().map(|r| r.id).collect();
        let mut answers: HashMap<Uuid, Vec<Answer>> = HashMap::new();
        if !response_ids.is_empty() {
            for model in AnswerEntity::find()
                .filter(survey_answer::Column::ResponseId.is_in(response_ids))
                .all(&self.db)
                .await?
            {
                answers
                    .entry(model.response_id)
                    .or_default()
                    .push(Answer::from(model));
            }
        }

        Ok(responses
            .into_iter()
            .map(|r| SurveyResponse {
                answers: answers.remove(&r.id).unwrap_or_default(),
                id: r.id,
                survey_id: r.survey_id,
                respondent_id: r.respondent_id,
                subject_id: r.subject_id,
                submitted_at: r.submitted_at,
            })
            .collect())
    }
}

async fn insert_question<C: ConnectionTrait>(
    db: &C,
    survey_id: Uuid,
    position: i32,
    draft: QuestionDraft,
) -> Result<Question, DbErr> {
    let model = survey_question::ActiveModel {
        id: Set(Uuid::new_v4()),
        survey_id: Set(survey_id),
        position: Set(position),
        prompt: Set(draft.prompt),
        kind: Set(draft.kind.as_str().to_string()),
        competency: Set(draft.competency),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    Question::try_from(model)
}

#[async_trait]
impl SurveyRepository for SurveyStore {
    async fn find(&self, id: Uuid) -> AppResult<Option<Survey>> {
        let result = SurveyEntity::find_by_id(id).one(&self.db).await?;
        result
            .map(|m| Survey::try_from(m).map_err(AppError::from))
            .transpose()
    }

    async fn find_detail(&self, id: Uuid) -> AppResult<Option<SurveyDetail>> {
        let Some(survey) = self.find(id).await? else {
            return Ok(None);
        };
        let questions = self.questions_for(vec![id]).await?;

        Ok(Some(SurveyDetail { survey, questions }))
    }

    async fn list_for_class(&self, class_id: Uuid) -> AppResult<Vec<Survey>> {
        SurveyEntity::find()
            .filter(survey::Column::ClassId.eq(class_id))
            .order_by_asc(survey::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| Survey::try_from(m).map_err(AppError::from))
            .collect()
    }

    async fn list_details_for_class(&self, class_id: Uuid) -> AppResult<Vec<SurveyDetail>> {
        let surveys = self.list_for_class(class_id).await?;
        let mut questions: HashMap<Uuid, Vec<Question>> = HashMap::new();
        for question in self
            .questions_for(surveys.iter().map(|s| s.id).collect())
            .await?
        {
            questions.entry(question.survey_id).or_default().push(question);
        }

        Ok(surveys
            .into_iter()
            .map(|survey| SurveyDetail {
                questions: questions.remove(&survey.id).unwrap_or_default(),
                survey,
            })
            .collect())
    }

    async fn create(
        &self,
        class_id: Uuid,
        new_survey: NewSurvey,
        drafts: Vec<QuestionDraft>,
    ) -> AppResult<SurveyDetail> {
        self.db
            .transaction::<_, SurveyDetail, DbErr>(move |txn| {
                Box::pin(async move {
                    let model = survey::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        class_id: Set(class_id),
                        title: Set(new_survey.title),
                        kind: Set(new_survey.kind.as_str().to_string()),
                        week: Set(new_survey.week),
                        is_open: Set(true),
                        due_at: Set(new_survey.due_at),
                        created_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await?;

                    let mut questions = Vec::with_capacity(drafts.len());
                    for (index, draft) in drafts.into_iter().enumerate() {
                        questions.push(insert_question(txn, model.id, index as i32 + 1, draft).await?);
                    }

                    Ok(SurveyDetail {
                        survey: Survey::try_from(model)?,
                        questions,
                    })
                })
            })
            .await
            .map_err(transaction_error)
    }

    async fn save(&self, record: Survey) -> AppResult<Survey> {
        let model = survey::ActiveModel {
            id: Set(record.id),
            title: Set(record.title),
            week: Set(record.week),
            is_open: Set(record.is_open),
            due_at: Set(record.due_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(update_error)?;

        Ok(Survey::try_from(model)?)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = SurveyEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn add_question(&self, survey_id: Uuid, question: QuestionDraft) -> AppResult<Question> {
        let last = QuestionEntity::find()
            .filter(survey_question::Column::SurveyId.eq(survey_id))
            .order_by_desc(survey_question::Column::Position)
            .one(&self.db)
            .await?;
        let position = last.map_or(1, |q| q.position + 1);

        Ok(insert_question(&self.db, survey_id, position, question).await?)
    }

    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> AppResult<()> {
        let result = QuestionEntity::delete_many()
            .filter(survey_question::Column::Id.eq(question_id))
            .filter(survey_question::Column::SurveyId.eq(survey_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn find_fellowship_template(&self, id: Uuid) -> AppResult<Option<FellowshipTemplate>> {
        let result = FellowshipTemplateEntity::find_by_id(id).one(&self.db).await?;
        result
            .map(|m| FellowshipTemplate::try_from(m).map_err(AppError::from))
            .transpose()
    }

    async fn list_fellowship_templates(&self) -> AppResult<Vec<FellowshipTemplate>> {
        FellowshipTemplateEntity::find()
            .order_by_asc(fellowship_template::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| FellowshipTemplate::try_from(m).map_err(AppError::from))
            .collect()
    }

    async fn create_fellowship_template(
        &self,
        template: NewFellowshipTemplate,
    ) -> AppResult<FellowshipTemplate> {
        let questions = serde_json::to_value(&template.questions)
            .map_err(|e| AppError::internal(format!("Cannot encode questions: {}", e)))?;

        let model = fellowship_template::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(template.name),
            description: Set(template.description),
            survey_kind: Set(template.survey_kind.as_str().to_string()),
            questions: Set(questions),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        Ok(FellowshipTemplate::try_from(model)?)
    }

    async fn response_exists(
        &self,
        survey_id: Uuid,
        respondent_id: Uuid,
        subject_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let subject_filter = match subject_id {
            Some(subject) => survey_response::Column::SubjectId.eq(subject),
            None => survey_response::Column::SubjectId.is_null(),
        };

        let existing = ResponseEntity::find()
            .filter(survey_response::Column::SurveyId.eq(survey_id))
            .filter(survey_response::Column::RespondentId.eq(respondent_id))
            .filter(subject_filter)
            .one(&self.db)
            .await?;

        Ok(existing.is_some())
    }

    async fn create_response(
        &self,
        survey_id: Uuid,
        response: NewResponse,
    ) -> AppResult<SurveyResponse> {
        self.db
            .transaction::<_, SurveyResponse, DbErr>(move |txn| {
                Box::pin(async move {
                    let model = survey_response::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        survey_id: Set(survey_id),
                        respondent_id: Set(response.respondent_id),
                        subject_id: Set(response.subject_id),
                        submitted_at: Set(Utc::now()),
                    }
                    .insert(txn)
                    .await?;

                    let mut answers = Vec::with_capacity(response.answers.len());
                    for answer in response.answers {
                        let stored = survey_answer::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            response_id: Set(model.id),
                            question_id: Set(answer.question_id),
                            rating: Set(answer.rating),
                            text: Set(answer.text),
                        }
                        .insert(txn)
                        .await?;
                        answers.push(Answer::from(stored));
                    }

                    Ok(SurveyResponse {
                        id: model.id,
                        survey_id: model.survey_id,
                        respondent_id: model.respondent_id,
                        subject_id: model.subject_id,
                        submitted_at: model.submitted_at,
                        answers,
                    })
                })
            })
            .await
            .map_err(transaction_error)
    }

    async fn list_responses(&self, survey_id: Uuid) -> AppResult<Vec<SurveyResponse>> {
        self.responses_for(vec![survey_id]).await
    }

    async fn list_responses_for_class(&self, class_id: Uuid) -> AppResult<Vec<SurveyResponse>> {
        let survey_ids = self
            .list_for_class(class_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        self.responses_for(survey_ids).await
    }
}
