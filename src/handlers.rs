use actix_web::error::{BlockingError, InternalError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::delay_model::DelayModel;
use crate::error::DelayError;
use crate::models::{FlightsRequest, HealthResponse, PredictResponse};
use crate::validation::{validate_flights_request, FieldError};

const INTERNAL_ERROR: &str = "An internal error occurred";
const MODEL_UNAVAILABLE: &str = "Model unavailable";

/// Failures surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Model(#[from] DelayError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Model(DelayError::ModelUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!({ "detail": errors }),
            ApiError::Model(DelayError::ModelUnavailable { .. }) => {
                json!({ "detail": MODEL_UNAVAILABLE })
            }
            _ => json!({ "detail": INTERNAL_ERROR }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Malformed or non-JSON bodies are client errors, reported like field errors
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("Validation error: {}", err);
        let detail = FieldError::body(err.to_string(), "value_error.jsondecode");
        let response = HttpResponse::BadRequest().json(json!({ "detail": [detail] }));
        InternalError::from_response(err, response).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
    })
}

pub async fn predict(
    model: web::Data<DelayModel>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let span = info_span!("predict", request_id = %Uuid::new_v4());

    let request = span.in_scope(|| {
        validate_flights_request(&body).map_err(|errors| {
            warn!("Validation error: {}", json!(errors));
            ApiError::Validation(errors)
        })
    })?;

    let model = model.into_inner();
    let inference_span = span.clone();
    let predictions = web::block(move || inference_span.in_scope(|| run_prediction(&model, &request)))
        .await
        .map_err(|e| {
            span.in_scope(|| error!("An error occurred: {}", e));
            ApiError::from(e)
        })??;

    Ok(HttpResponse::Ok().json(PredictResponse {
        predict: predictions,
    }))
}

fn run_prediction(model: &DelayModel, request: &FlightsRequest) -> Result<Vec<u8>, ApiError> {
    let features = model.preprocess(&request.flights);
    match model.predict(&features) {
        Ok(predictions) => {
            info!(flights = predictions.len(), "predicted delays");
            Ok(predictions)
        }
        Err(e) => {
            error!("An error occurred: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use std::path::PathBuf;

    #[test]
    fn test_status_codes() {
        let validation = ApiError::Validation(vec![FieldError::body("bad", "type_error.dict")]);
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let unavailable = ApiError::Model(DelayError::ModelUnavailable {
            path: PathBuf::from("models/delay_model.json"),
        });
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let internal = ApiError::Model(DelayError::EmptyDataset);
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_rt::test]
    async fn test_internal_error_hides_cause() {
        let err = ApiError::Model(DelayError::Config("secret path /etc/x".to_string()));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(!text.contains("secret"));

        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"detail": "An internal error occurred"}));
    }
}
