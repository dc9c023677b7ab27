//! gRPC implementation for SurveyService.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::convert::{
    detail_to_proto, draft_from_proto, fellowship_to_proto, member_to_proto, question_to_proto,
    response_to_proto, survey_to_proto,
};
use super::{domain_status, parse_opt_timestamp, parse_opt_uuid, parse_uuid};
use crate::service::SurveyService;
use domain::{NewAnswer, NewFellowshipTemplate, NewResponse, NewSurvey, SurveyKind, SurveyUpdate};
use proto::cohort::{
    survey_service_server::SurveyService as SurveyServiceProto, AddQuestionRequest,
    ApplyFellowshipTemplateRequest, ClassResults, CreateFellowshipTemplateRequest,
    CreateSurveyRequest, DeleteQuestionRequest, DeleteSurveyRequest, Empty, FellowshipTemplate,
    GetClassResultsRequest, GetSurveyRequest, ListFellowshipTemplatesRequest,
    ListFellowshipTemplatesResponse, ListResponsesRequest, ListResponsesResponse,
    ListSurveysRequest, ListSurveysResponse, Question, SubmitResponseRequest, Survey, SurveyDetail,
    SurveyResponse, SurveyResults, UpdateSurveyRequest,
};

/// gRPC service wrapper for SurveyService.
pub struct SurveyGrpcService {
    service: Arc<dyn SurveyService>,
}

impl SurveyGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn SurveyService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl SurveyServiceProto for SurveyGrpcService {
    async fn create_survey(
        &self,
        request: Request<CreateSurveyRequest>,
    ) -> Result<Response<SurveyDetail>, Status> {
        let req = request.into_inner();
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let survey = NewSurvey {
            title: req.title,
            kind: SurveyKind::parse(&req.kind).map_err(domain_status)?,
            week: req.week,
            due_at: parse_opt_timestamp("due_at", req.due_at.as_deref())?,
        };
        let questions = req
            .questions
            .into_iter()
            .map(draft_from_proto)
            .collect::<Result<Vec<_>, _>>()?;

        let detail = self
            .service
            .create_survey(class_id, survey, questions)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(detail_to_proto(&detail)))
    }

    async fn get_survey(
        &self,
        request: Request<GetSurveyRequest>,
    ) -> Result<Response<SurveyDetail>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        let detail = self.service.get_survey(id).await.map_err(Status::from)?;
        Ok(Response::new(detail_to_proto(&detail)))
    }

    async fn list_surveys(
        &self,
        request: Request<ListSurveysRequest>,
    ) -> Result<Response<ListSurveysResponse>, Status> {
        let class_id = parse_uuid("class_id", &request.into_inner().class_id)?;

        let surveys = self
            .service
            .list_surveys(class_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ListSurveysResponse {
            surveys: surveys.iter().map(survey_to_proto).collect(),
        }))
    }

    async fn update_survey(
        &self,
        request: Request<UpdateSurveyRequest>,
    ) -> Result<Response<Survey>, Status> {
        let req = request.into_inner();
        let id = parse_uuid("id", &req.id)?;
        let update = SurveyUpdate {
            title: req.title,
            is_open: req.is_open,
            week: req.week,
            due_at: parse_opt_timestamp("due_at", req.due_at.as_deref())?,
            clear_due_at: req.clear_due_at,
        };

        let survey = self
            .service
            .update_survey(id, update)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(survey_to_proto(&survey)))
    }

    async fn delete_survey(
        &self,
        request: Request<DeleteSurveyRequest>,
    ) -> Result<Response<Empty>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        self.service.delete_survey(id).await.map_err(Status::from)?;
        Ok(Response::new(Empty {}))
    }

    async fn add_question(
        &self,
        request: Request<AddQuestionRequest>,
    ) -> Result<Response<Question>, Status> {
        let req = request.into_inner();
        let survey_id = parse_uuid("survey_id", &req.survey_id)?;
        let draft = req
            .question
            .ok_or_else(|| Status::invalid_argument("question is required"))
            .and_then(draft_from_proto)?;

        let question = self
            .service
            .add_question(survey_id, draft)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(question_to_proto(&question)))
    }

    async fn delete_question(
        &self,
        request: Request<DeleteQuestionRequest>,
    ) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let survey_id = parse_uuid("survey_id", &req.survey_id)?;
        let question_id = parse_uuid("question_id", &req.question_id)?;

        self.service
            .delete_question(survey_id, question_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(Empty {}))
    }

    async fn list_fellowship_templates(
        &self,
        _request: Request<ListFellowshipTemplatesRequest>,
    ) -> Result<Response<ListFellowshipTemplatesResponse>, Status> {
        let templates = self
            .service
            .list_fellowship_templates()
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ListFellowshipTemplatesResponse {
            templates: templates.iter().map(fellowship_to_proto).collect(),
        }))
    }

    async fn create_fellowship_template(
        &self,
        request: Request<CreateFellowshipTemplateRequest>,
    ) -> Result<Response<FellowshipTemplate>, Status> {
        let req = request.into_inner();
        let template = NewFellowshipTemplate {
            name: req.name,
            description: req.description,
            survey_kind: SurveyKind::parse(&req.survey_kind).map_err(domain_status)?,
            questions: req
                .questions
                .into_iter()
                .map(draft_from_proto)
                .collect::<Result<Vec<_>, _>>()?,
        };

        let template = self
            .service
            .create_fellowship_template(template)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(fellowship_to_proto(&template)))
    }

    async fn apply_fellowship_template(
        &self,
        request: Request<ApplyFellowshipTemplateRequest>,
    ) -> Result<Response<SurveyDetail>, Status> {
        let req = request.into_inner();
        let template_id = parse_uuid("template_id", &req.template_id)?;
        let class_id = parse_uuid("class_id", &req.class_id)?;
        let due_at = parse_opt_timestamp("due_at", req.due_at.as_deref())?;

        let detail = self
            .service
            .apply_fellowship_template(template_id, class_id, req.title, req.week, due_at)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(detail_to_proto(&detail)))
    }

    async fn submit_response(
        &self,
        request: Request<SubmitResponseRequest>,
    ) -> Result<Response<SurveyResponse>, Status> {
        let req = request.into_inner();
        let survey_id = parse_uuid("survey_id", &req.survey_id)?;
        let response = NewResponse {
            respondent_id: parse_uuid("respondent_id", &req.respondent_id)?,
            subject_id: parse_opt_uuid("subject_id", req.subject_id.as_deref())?,
            answers: req
                .answers
                .into_iter()
                .map(|a| {
                    Ok(NewAnswer {
                        question_id: parse_uuid("question_id", &a.question_id)?,
                        rating: a.rating,
                        text: a.text,
                    })
                })
                .collect::<Result<Vec<_>, Status>>()?,
        };

        let stored = self
            .service
            .submit_response(survey_id, response)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(response_to_proto(&stored)))
    }

    async fn list_responses(
        &self,
        request: Request<ListResponsesRequest>,
    ) -> Result<Response<ListResponsesResponse>, Status> {
        let survey_id = parse_uuid("survey_id", &request.into_inner().survey_id)?;

        let responses = self
            .service
            .list_responses(survey_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ListResponsesResponse {
            responses: responses.iter().map(response_to_proto).collect(),
        }))
    }

    async fn get_class_results(
        &self,
        request: Request<GetClassResultsRequest>,
    ) -> Result<Response<ClassResults>, Status> {
        let class_id = parse_uuid("class_id", &request.into_inner().class_id)?;

        let results = self
            .service
            .class_results(class_id)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(ClassResults {
            class_id: results.class_id.to_string(),
            surveys: results
                .surveys
                .iter()
                .map(|s| SurveyResults {
                    detail: Some(detail_to_proto(&s.detail)),
                    responses: s.responses.iter().map(response_to_proto).collect(),
                })
                .collect(),
            students: results.students.iter().map(member_to_proto).collect(),
        }))
    }
}
