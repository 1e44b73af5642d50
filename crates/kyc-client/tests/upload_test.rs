//! Sequential document uploads and request submission.

use kyc_client::{upload_and_submit, upload_documents, ApiConfig, DocumentUpload, KycClient};
use kyc_core::DocumentRequestId;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> KycClient {
    KycClient::new(ApiConfig::local_mock(&server.uri(), "test-token").unwrap()).unwrap()
}

async fn mount_uploads(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/ef/do/v1/documents"))
        .and(body_partial_json(json!({ "documentName": "broken.pdf" })))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage unavailable"))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ef/do/v1/documents"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": "doc-1", "status": "ACTIVE", "documentType": "EIN_LETTER" })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn upload_sends_base64_content_with_request_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ef/do/v1/documents"))
        .and(body_partial_json(json!({
            "documentContent": "aGVsbG8=",
            "documentName": "ein.pdf",
            "documentType": "EIN_LETTER",
            "documentMetadata": { "documentRequestId": "dr-1" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "doc-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = test_client(&server);
    let doc = api
        .documents()
        .upload_document(
            &DocumentRequestId::new("dr-1"),
            &DocumentUpload::new("EIN_LETTER", "ein.pdf", b"hello".to_vec()),
        )
        .await
        .unwrap();
    assert_eq!(doc.id, "doc-1");
}

#[tokio::test]
async fn one_failed_upload_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    mount_uploads(&server).await;

    let api = test_client(&server);
    let files = [
        DocumentUpload::new("EIN_LETTER", "first.pdf", b"one".to_vec()),
        DocumentUpload::new("EIN_LETTER", "broken.pdf", b"two".to_vec()),
        DocumentUpload::new("PASSPORT", "third.pdf", b"three".to_vec()),
    ];
    let report = upload_documents(api.documents(), &DocumentRequestId::new("dr-1"), &files).await;

    let names: Vec<_> = report.outcomes.iter().map(|o| o.file_name.as_str()).collect();
    assert_eq!(names, ["first.pdf", "broken.pdf", "third.pdf"]);
    assert!(!report.all_succeeded());
    let failed: Vec<_> = report.failures().map(|o| o.file_name.as_str()).collect();
    assert_eq!(failed, ["broken.pdf"]);
    assert_eq!(report.uploaded().count(), 2);
}

#[tokio::test]
async fn request_is_submitted_only_when_every_upload_succeeds() {
    let server = MockServer::start().await;
    mount_uploads(&server).await;
    Mock::given(method("POST"))
        .and(path("/ef/do/v1/document-requests/dr-1/submit"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let api = test_client(&server);
    let request = DocumentRequestId::new("dr-1");

    let failing = [DocumentUpload::new("EIN_LETTER", "broken.pdf", b"x".to_vec())];
    let report = upload_and_submit(api.documents(), &request, &failing).await.unwrap();
    assert!(!report.all_succeeded());

    let good = [DocumentUpload::new("EIN_LETTER", "ein.pdf", b"x".to_vec())];
    let report = upload_and_submit(api.documents(), &request, &good).await.unwrap();
    assert!(report.all_succeeded());
}
