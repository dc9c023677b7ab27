//! gRPC implementation for ClassService.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::convert::{class_to_proto, template_to_proto};
use super::{parse_date, parse_opt_uuid, parse_uuid};
use crate::service::ClassService;
use domain::{ClassUpdate, NewClass, NewClassTemplate};
use proto::cohort::{
    class_service_server::ClassService as ClassServiceProto, ArchiveClassRequest, Class,
    ClassTemplate, CreateClassRequest, CreateClassTemplateRequest, DeleteClassRequest,
    DeleteClassTemplateRequest, Empty, GetClassRequest, ListClassTemplatesRequest,
    ListClassTemplatesResponse, ListClassesRequest, ListClassesResponse, UpdateClassRequest,
};

/// gRPC service wrapper for ClassService.
pub struct ClassGrpcService {
    service: Arc<dyn ClassService>,
}

impl ClassGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn ClassService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl ClassServiceProto for ClassGrpcService {
    async fn create_class(
        &self,
        request: Request<CreateClassRequest>,
    ) -> Result<Response<Class>, Status> {
        let req = request.into_inner();
        let class = NewClass {
            name: req.name,
            description: req.description,
            start_date: parse_date("start_date", &req.start_date)?,
            duration_weeks: req.duration_weeks,
            weekly_themes: req.weekly_themes.map(|t| t.items),
            template_id: parse_opt_uuid("template_id", req.template_id.as_deref())?,
        };

        let class = self.service.create_class(class).await.map_err(Status::from)?;
        Ok(Response::new(class_to_proto(&class)))
    }

    async fn get_class(&self, request: Request<GetClassRequest>) -> Result<Response<Class>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        let class = self.service.get_class(id).await.map_err(Status::from)?;
        Ok(Response::new(class_to_proto(&class)))
    }

    async fn list_classes(
        &self,
        request: Request<ListClassesRequest>,
    ) -> Result<Response<ListClassesResponse>, Status> {
        let req = request.into_inner();
        let user_id = req.user_id.filter(|u| !u.is_empty());

        let classes = self
            .service
            .list_classes(req.include_archived, user_id)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ListClassesResponse {
            classes: classes.iter().map(class_to_proto).collect(),
        }))
    }

    async fn update_class(
        &self,
        request: Request<UpdateClassRequest>,
    ) -> Result<Response<Class>, Status> {
        let req = request.into_inner();
        let id = parse_uuid("id", &req.id)?;
        let update = ClassUpdate {
            name: req.name,
            description: req.description,
            start_date: req
                .start_date
                .as_deref()
                .map(|d| parse_date("start_date", d))
                .transpose()?,
            duration_weeks: req.duration_weeks,
            weekly_themes: req.weekly_themes.map(|t| t.items),
        };

        let class = self
            .service
            .update_class(id, update)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(class_to_proto(&class)))
    }

    async fn archive_class(
        &self,
        request: Request<ArchiveClassRequest>,
    ) -> Result<Response<Class>, Status> {
        let req = request.into_inner();
        let id = parse_uuid("id", &req.id)?;

        let class = self
            .service
            .archive_class(id, req.archived)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(class_to_proto(&class)))
    }

    async fn delete_class(
        &self,
        request: Request<DeleteClassRequest>,
    ) -> Result<Response<Empty>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        self.service.delete_class(id).await.map_err(Status::from)?;
        Ok(Response::new(Empty {}))
    }

    async fn list_class_templates(
        &self,
        _request: Request<ListClassTemplatesRequest>,
    ) -> Result<Response<ListClassTemplatesResponse>, Status> {
        let templates = self.service.list_templates().await.map_err(Status::from)?;

        Ok(Response::new(ListClassTemplatesResponse {
            templates: templates.iter().map(template_to_proto).collect(),
        }))
    }

    async fn create_class_template(
        &self,
        request: Request<CreateClassTemplateRequest>,
    ) -> Result<Response<ClassTemplate>, Status> {
        let req = request.into_inner();
        let template = NewClassTemplate {
            name: req.name,
            description: req.description,
            duration_weeks: req.duration_weeks,
            weekly_themes: req.weekly_themes,
        };

        let template = self
            .service
            .create_template(template)
            .await
            .map_err(Status::from)?;
        Ok(Response::new(template_to_proto(&template)))
    }

    async fn delete_class_template(
        &self,
        request: Request<DeleteClassTemplateRequest>,
    ) -> Result<Response<Empty>, Status> {
        let id = parse_uuid("id", &request.into_inner().id)?;

        self.service.delete_template(id).await.map_err(Status::from)?;
        Ok(Response::new(Empty {}))
    }
}
