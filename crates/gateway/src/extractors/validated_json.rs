//! Validated JSON extractor.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use common::AppError;

/// JSON extractor that rejects payloads failing their `Validate` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(first_message(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// First rule message, or the failing field when the rule has none.
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|error| match &error.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .unwrap_or_else(|| "Validation failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "Name cannot be empty"))]
        name: String,
        #[validate(range(min = 1))]
        week: i32,
    }

    #[test]
    fn test_rule_message_is_used() {
        let payload = Payload {
            name: String::new(),
            week: 2,
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(first_message(&errors), "Name cannot be empty");
    }

    #[test]
    fn test_field_name_without_message() {
        let payload = Payload {
            name: "Ada".to_string(),
            week: 0,
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(first_message(&errors), "week is invalid");
    }
}
