use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

use crate::client::WeatherError;

pub type RestResult<T> = Result<T, RestError>;

/// Errors surfaced to REST clients, each rendered as a `{code, message}` JSON body
#[derive(Debug, Error)]
pub enum RestError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InternalError(String),

    #[error("{0}")]
    BadGateway(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: u16,
    message: &'a str,
}

impl From<WeatherError> for RestError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::InvalidInput => Self::InvalidInput("city parameter is required".into()),
            WeatherError::NotFound => Self::NotFound("City not found".into()),
            WeatherError::UpstreamError(status) => {
                tracing::error!("Weather provider returned {}", status);
                Self::BadGateway(format!("weather provider returned {}", status))
            }
            WeatherError::UpstreamUnavailable(e) => {
                tracing::error!("Failed to reach weather provider: {:?}", e);
                Self::BadGateway("failed to fetch weather".into())
            }
            WeatherError::InvalidUpstreamResponse(e) => {
                tracing::error!("Failed to decode weather provider response: {:?}", e);
                Self::InternalError("invalid weather response".into())
            }
        }
    }
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        HttpResponse::build(status).json(ErrorBody {
            code: status.as_u16(),
            message: &message,
        })
    }
}
