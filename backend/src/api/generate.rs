//! Generate API
//!
//! Accepts a multipart upload of an encrypted prompt archive and returns the
//! encrypted reply archive as a download.

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::api::RouterState;
use crate::error::AppError;

/// Multipart field carrying the archive
pub const UPLOAD_FIELD: &str = "file";

/// Required filename of the uploaded archive
pub const UPLOAD_FILENAME: &str = "input.zip";

/// Filename of the returned archive
pub const DOWNLOAD_FILENAME: &str = "output.zip";

/// Pull the archive out of the multipart form
///
/// Other fields are skipped. The `file` field must carry the filename
/// `input.zip`.
async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != UPLOAD_FIELD {
            warn!("Unknown multipart field: {}", field_name);
            continue;
        }

        if field.file_name() != Some(UPLOAD_FILENAME) {
            return Err(AppError::InvalidUpload(format!(
                "Uploaded file must be named '{}'",
                UPLOAD_FILENAME
            )));
        }

        return Ok(field.bytes().await?);
    }

    Err(AppError::MissingFile)
}

/// POST /generate - run one exchange
///
/// Accepts multipart form data with:
/// - file: password-protected `input.zip` containing `input.txt`
pub async fn generate(
    State(handler): State<RouterState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(&mut multipart).await?;
    info!(upload_len = upload.len(), "Received prompt archive");

    let reply = handler.run(&upload).await?;
    info!(reply_len = reply.len(), "Returning reply archive");

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME),
            ),
        ],
        reply,
    )
        .into_response())
}
