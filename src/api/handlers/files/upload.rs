use crate::AppState;
use crate::api::error::AppError;
use crate::services::file_service::{FileRecordView, FolderUpload, FolderUploadReport, SingleUpload};
use crate::services::transfer::SelectedFile;
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError},
    },
};
use bytes::Bytes;

fn multipart_error(e: MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

async fn read_file_field(field: Field<'_>) -> Result<(String, String, Bytes), AppError> {
    let filename = field.file_name().unwrap_or("unnamed").to_string();
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
    let data = field.bytes().await.map_err(multipart_error)?;
    Ok((filename, content_type, data))
}

#[utoipa::path(
    post,
    path = "/files",
    request_body(content = super::types::UploadFileForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded", body = FileRecordView),
        (status = 400, description = "Missing field or invalid filename"),
        (status = 409, description = "Title already in use"),
        (status = 413, description = "Upload too large")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FileRecordView>, AppError> {
    let mut title = None;
    let mut secret_code = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => file = Some(read_file_field(field).await?),
            "title" => title = Some(field.text().await.map_err(multipart_error)?),
            "secret_code" => secret_code = Some(field.text().await.map_err(multipart_error)?),
            _ => tracing::debug!("Ignoring multipart field '{}'", name),
        }
    }

    let (filename, content_type, data) =
        file.ok_or(AppError::BadRequest("No file provided".to_string()))?;

    let record = state
        .file_service
        .upload_single(SingleUpload {
            title: title.unwrap_or_default(),
            secret_code: secret_code.unwrap_or_default(),
            filename,
            content_type,
            data,
        })
        .await?;

    Ok(Json(FileRecordView::from_model(
        &record,
        state.config.display_expiry_days,
    )))
}

#[utoipa::path(
    post,
    path = "/folders",
    request_body(content = super::types::UploadFolderForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Folder uploaded; per-file failures are listed in the report", body = FolderUploadReport),
        (status = 400, description = "Empty selection, bad path or strict limits exceeded"),
        (status = 409, description = "Title already in use, or the transfer id is already running"),
        (status = 500, description = "Folder record could not be created")
    ),
    tag = "files"
)]
pub async fn upload_folder(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FolderUploadReport>, AppError> {
    let mut title = None;
    let mut secret_code = None;
    let mut strict = false;
    let mut transfer_id = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "files[]" => {
                let (relative_path, content_type, data) = read_file_field(field).await?;
                files.push(SelectedFile {
                    relative_path,
                    content_type,
                    data,
                });
            }
            "title" => title = Some(field.text().await.map_err(multipart_error)?),
            "secret_code" => secret_code = Some(field.text().await.map_err(multipart_error)?),
            "strict" => {
                let text = field.text().await.map_err(multipart_error)?;
                strict = matches!(text.trim(), "true" | "1" | "on");
            }
            "transfer_id" => transfer_id = Some(field.text().await.map_err(multipart_error)?),
            _ => tracing::debug!("Ignoring multipart field '{}'", name),
        }
    }

    let report = state
        .file_service
        .upload_folder(FolderUpload {
            title,
            secret_code: secret_code.unwrap_or_default(),
            strict,
            transfer_id,
            files,
        })
        .await?;

    Ok(Json(report))
}
