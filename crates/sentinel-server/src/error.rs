use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use sentinel_llm::TurnError;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    blocked_term: Option<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Turn(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let blocked_term = match self {
            AppError::Turn(err) => err.blocked_term().map(str::to_string),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.to_string(),
            blocked_term,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use sentinel_core::PolicyRejection;

    #[actix_web::test]
    async fn policy_rejection_is_a_client_error_with_term() {
        let err = AppError::from(TurnError::from(PolicyRejection {
            term: "TRUNCATE".to_string(),
        }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["blocked_term"], "TRUNCATE");
        assert_eq!(
            json["detail"],
            "Security Alert: Restricted keyword detected (TRUNCATE). This system is Read-Only."
        );
    }

    #[test]
    fn internal_faults_are_server_errors() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
