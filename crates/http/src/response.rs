//! `{status, message, data}` envelope shared by success and failure responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// Body of every JSON response
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Successful response with status code and envelope
#[derive(Debug)]
pub struct ApiResponse<T> {
    code: StatusCode,
    body: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with a data payload
    pub fn ok(data: T) -> Self {
        Self {
            code: StatusCode::OK,
            body: Envelope {
                status: Status::Success,
                message: None,
                data: Some(data),
            },
        }
    }

    /// 201 with a message and data payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            code: StatusCode::CREATED,
            body: Envelope {
                status: Status::Success,
                message: Some(message.into()),
                data: Some(data),
            },
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }
}

impl ApiResponse<()> {
    /// 200 carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::OK,
            body: Envelope {
                status: Status::Success,
                message: Some(message.into()),
                data: None,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.code, Json(self.body)).into_response()
    }
}
