pub mod alerts;
pub mod health;
pub mod refresh;
pub mod status;

pub use alerts::*;
pub use health::*;
pub use refresh::*;
pub use status::*;

use axum::{http::StatusCode, response::Json};
use cote_utils::{CoteError, ErrorResponse};

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(error: CoteError) -> ApiError {
    let status = StatusCode::from_u16(error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(error)))
}
