//! The two response shapes every pipeline endpoint produces.
//!
//! - `200 {"message": "Success"[, "data": ...]}`
//! - `500 {"message": "Failure", "error": "..."}`
//!
//! Both carry permissive CORS headers.

use axum::{
    Json,
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "*"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
];

#[derive(Serialize, Debug)]
pub struct ResponseBody<T> {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: ResponseBody<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200` with `data` attached.
    pub fn with_data(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody {
                message: "Success",
                data: Some(data),
                error: None,
            },
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ResponseBody {
                message: "Failure",
                data: None,
                error: Some(error.into()),
            },
        }
    }
}

impl ApiResponse<()> {
    /// `200` without a data field.
    pub fn success() -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody {
                message: "Success",
                data: None,
                error: None,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, CORS_HEADERS, Json(self.body)).into_response()
    }
}
