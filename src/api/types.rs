use serde::Serialize;

use crate::domain::RunPhase;
use crate::services::RunStatus;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub sources: usize,
    pub tmdb_configured: bool,
    pub list_configured: bool,
    pub phase: RunPhase,
    pub search: Option<RunStatus>,
}

#[derive(Debug, Serialize)]
pub struct LibraryDto {
    pub key: String,
    pub title: String,
    pub url: String,
}
