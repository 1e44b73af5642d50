//! Contract tests for the resource clients.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET  | `/ef/do/v1/clients/{id}` | `get_client_*` |
//! | POST | `/ef/do/v1/clients/{id}` | `update_client_*` |
//! | POST | `/ef/do/v1/parties/{id}` | `update_party_*`, `deactivate_party_*` |
//! | GET  | `/ef/do/v1/questions` | `list_questions_*` |
//! | GET  | `/ef/do/v1/document-requests` | `list_document_requests_*` |
//! | GET  | `/ef/do/v1/document-requests/{id}` | `get_document_request_*` |

use kyc_client::{ApiClientError, ApiConfig, KycClient};
use kyc_core::{ClientId, ClientStatus, DocumentRequestId, PartyId};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> KycClient {
    KycClient::new(ApiConfig::local_mock(&server.uri(), "test-token").unwrap()).unwrap()
}

// ── GET /clients/{id} ────────────────────────────────────────────────

#[tokio::test]
async fn get_client_returns_parties_and_sends_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ef/do/v1/clients/0030000131"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "0030000131",
            "status": "NEW",
            "products": ["EMBEDDED_PAYMENTS"],
            "parties": [
                { "id": "2000000111", "partyType": "ORGANIZATION", "roles": ["CLIENT"] }
            ],
            "outstanding": { "questionIds": ["30005"] },
            "createdAt": "2025-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server)
        .clients()
        .get_client(&ClientId::new("0030000131"))
        .await
        .unwrap();
    assert_eq!(client.status, Some(ClientStatus::New));
    assert_eq!(client.parties.len(), 1);
    assert_eq!(client.outstanding.question_ids, ["30005"]);
    assert_eq!(client.extra["createdAt"], "2025-01-01T00:00:00Z");
}

#[tokio::test]
async fn get_client_not_found_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ef/do/v1/clients/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .clients()
        .get_client(&ClientId::new("missing"))
        .await
        .unwrap_err();
    match err {
        ApiClientError::Api { status, body, reasons, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
            assert!(reasons.is_empty());
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_client_malformed_body_is_deserialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ef/do/v1/clients/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .clients()
        .get_client(&ClientId::new("c-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiClientError::Deserialization { .. }));
}

// ── POST /clients/{id} ───────────────────────────────────────────────

#[tokio::test]
async fn update_client_server_error_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ef/do/v1/clients/c-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .clients()
        .update_client(&ClientId::new("c-1"), &json!({ "products": ["EMBEDDED_PAYMENTS"] }))
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

// ── POST /parties/{id} ───────────────────────────────────────────────

#[tokio::test]
async fn update_party_rejection_carries_reasons() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ef/do/v1/parties/p-1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "title": "Bad Request",
            "httpStatus": 400,
            "context": [
                { "field": "individualDetails.birthDate", "message": "must be in the past" }
            ]
        })))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .parties()
        .update_party(&PartyId::new("p-1"), &json!({ "individualDetails": { "birthDate": "2999-01-01" } }))
        .await
        .unwrap_err();
    assert_eq!(err.reasons().len(), 1);
    assert_eq!(err.reasons()[0].field.as_deref(), Some("individualDetails.birthDate"));
}

#[tokio::test]
async fn deactivate_party_posts_inactive_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ef/do/v1/parties/bo-1"))
        .and(body_json(json!({ "active": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "bo-1", "active": false })))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server)
        .parties()
        .deactivate_party(&PartyId::new("bo-1"))
        .await
        .unwrap();
}

// ── GET /questions ───────────────────────────────────────────────────

#[tokio::test]
async fn list_questions_sends_comma_separated_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ef/do/v1/questions"))
        .and(query_param("questionIds", "30005,30006"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": { "total": 2 },
            "questions": [
                { "id": "30005", "description": "Expected monthly volume?" },
                { "id": "30006", "description": "Countries of operation?" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = test_client(&server)
        .questions()
        .list_questions(&["30005".to_string(), "30006".to_string()])
        .await
        .unwrap();
    assert_eq!(list.questions.len(), 2);
    assert_eq!(list.questions[1].id, "30006");
}

#[tokio::test]
async fn list_questions_without_ids_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let list = test_client(&server).questions().list_questions(&[]).await.unwrap();
    assert!(list.questions.is_empty());
}

// ── GET /document-requests ───────────────────────────────────────────

#[tokio::test]
async fn list_document_requests_filters_by_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ef/do/v1/document-requests"))
        .and(query_param("clientId", "c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documentRequests": [
                {
                    "id": "dr-1",
                    "clientId": "c-1",
                    "status": "ACTIVE",
                    "requirements": [
                        { "documentTypes": ["EIN_LETTER", "ARTICLES_OF_INCORPORATION"], "minRequired": 1 }
                    ]
                }
            ]
        })))
        .mount(&server)
        .await;

    let requests = test_client(&server)
        .documents()
        .list_document_requests(&ClientId::new("c-1"))
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].requirements[0].document_types.len(), 2);
}

#[tokio::test]
async fn get_document_request_reads_requirements() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ef/do/v1/document-requests/dr-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "dr-2",
            "partyId": "bo-1",
            "requirements": [
                { "documentTypes": ["PASSPORT"], "minRequired": 0 }
            ]
        })))
        .mount(&server)
        .await;

    let request = test_client(&server)
        .documents()
        .get_document_request(&DocumentRequestId::new("dr-2"))
        .await
        .unwrap();
    assert_eq!(request.party_id, Some(PartyId::new("bo-1")));
    assert!(request.requirements[0].is_optional());
}
