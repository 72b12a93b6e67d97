pub mod job_dto;

use serde::Serialize;

/// Success envelope for every handler response. Failures use the matching
/// `{ success: false, error, message }` shape from `util::error`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse { success: true, data }
    }
}
