//! Sequential document uploads for one document request.
//!
//! Files are uploaded one at a time in the given order. A failed upload
//! is recorded and the remaining files are still attempted.

use kyc_core::DocumentRequestId;

use crate::documents::{DocumentApi, DocumentResponse, DocumentUpload};
use crate::error::ApiClientError;

/// Result of uploading one file.
#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    pub document_type: String,
    pub result: Result<DocumentResponse, ApiClientError>,
}

/// Per-file results of one batch, in upload order.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn uploaded(&self) -> impl Iterator<Item = &DocumentResponse> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

/// Upload `files` for `request_id`, awaiting each before the next.
pub async fn upload_documents(
    api: &DocumentApi,
    request_id: &DocumentRequestId,
    files: &[DocumentUpload],
) -> UploadReport {
    let mut report = UploadReport::default();
    for file in files {
        let result = api.upload_document(request_id, file).await;
        if let Err(e) = &result {
            tracing::warn!(
                document_request_id = %request_id,
                file = %file.file_name,
                "document upload failed: {e}"
            );
        }
        report.outcomes.push(UploadOutcome {
            file_name: file.file_name.clone(),
            document_type: file.document_type.clone(),
            result,
        });
    }
    report
}

/// Upload `files`, then submit the request if every upload succeeded.
///
/// # Errors
///
/// Only the submission itself can fail here; upload failures are in the
/// returned report and leave the request unsubmitted.
pub async fn upload_and_submit(
    api: &DocumentApi,
    request_id: &DocumentRequestId,
    files: &[DocumentUpload],
) -> Result<UploadReport, ApiClientError> {
    let report = upload_documents(api, request_id, files).await;
    if report.all_succeeded() {
        api.submit_document_request(request_id).await?;
        tracing::info!(document_request_id = %request_id, files = files.len(), "document request submitted");
    }
    Ok(report)
}
