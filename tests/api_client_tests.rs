use std::time::Duration;

use mockito::Matcher;
use serde_json::json;

use school_dashboard::api::api_model::{AttachmentRequest, ListQuery, Resource};
use school_dashboard::api::client::{HttpApi, SchoolApi, parse_page, server_message};
use school_dashboard::api::endpoints::{collection_path, join_url, record_path, upload_url_path};
use school_dashboard::api::error::ApiError;
use school_dashboard::session::session_model::{SessionContext, SessionRole};

fn session() -> SessionContext {
    SessionContext::new("t1", "secret-token")
        .with_role(SessionRole::TenantAdmin)
        .with_school("s9")
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn paths_are_scoped_by_tenant_and_school() {
    let s = session();
    assert_eq!(collection_path(&s, Resource::Schools).unwrap(), "tenants/t1/schools");
    assert_eq!(collection_path(&s, Resource::Banners).unwrap(), "tenants/t1/banners");
    assert_eq!(
        collection_path(&s, Resource::Classes).unwrap(),
        "tenants/t1/schools/s9/classes"
    );
    assert_eq!(
        record_path(&s, Resource::Diaries, "3").unwrap(),
        "tenants/t1/schools/s9/diaries/3"
    );
    assert_eq!(upload_url_path(&s).unwrap(), "tenants/t1/attachments/upload-url");
}

#[test]
fn missing_context_is_reported_before_any_request() {
    let no_school = SessionContext::new("t1", "tok");
    assert!(matches!(
        collection_path(&no_school, Resource::Lessons),
        Err(ApiError::MissingContext("school id"))
    ));

    let blank_tenant = SessionContext::new("  ", "tok");
    assert!(matches!(
        collection_path(&blank_tenant, Resource::Users),
        Err(ApiError::MissingContext("tenant id"))
    ));

    // Unreachable base URL: the error must come from the session, not the network.
    let api = HttpApi::new("http://127.0.0.1:9", Some(Duration::from_secs(1))).unwrap();
    let no_token = SessionContext {
        tenant_id: Some("t1".into()),
        ..SessionContext::default()
    };
    let err = api.fetch(&no_token, Resource::Users, "1").unwrap_err();
    assert!(matches!(err, ApiError::MissingContext("auth token")));
    assert_eq!(err.user_message(), "Your session is missing auth token. Please sign in again.");
}

#[test]
fn join_url_uses_exactly_one_slash() {
    assert_eq!(join_url("http://h/api/", "/tenants/t1"), "http://h/api/tenants/t1");
    assert_eq!(join_url("http://h/api", "tenants/t1"), "http://h/api/tenants/t1");
}

// ============================================================================
// HTTP round trips (mockito)
// ============================================================================

#[test]
fn list_sends_query_and_token_and_parses_page() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/tenants/t1/users")
        .match_header("authorization", "Bearer secret-token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("pageSize".into(), "10".into()),
            Matcher::UrlEncoded("search".into(), "rao".into()),
            Matcher::UrlEncoded("type".into(), "Teacher".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": {
                    "users": [{ "id": 4, "firstName": "Asha", "lastName": "Rao" }],
                    "meta": { "pagination": { "page": 2, "pageSize": 10, "pageCount": 3, "total": 21 } }
                }
            })
            .to_string(),
        )
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    let query = ListQuery {
        page: 2,
        page_size: 10,
        ..ListQuery::default()
    }
    .with_search("rao")
    .with_filter("type", "Teacher");

    let page = api.list(&session(), Resource::Users, &query).unwrap();
    mock.assert();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.pagination.total, 21);
    assert_eq!(page.pagination.page_count, 3);
    assert!(page.has_next());
}

#[test]
fn create_wraps_payload_in_data_envelope() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/tenants/t1/schools/s9/classes")
        .match_body(Matcher::Json(json!({ "data": { "name": "Grade 5", "sectionCount": 2 } })))
        .with_status(201)
        .with_body(json!({ "data": { "id": 77, "name": "Grade 5", "sectionCount": 2 } }).to_string())
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    let record = api
        .create(
            &session(),
            Resource::Classes,
            &json!({ "name": "Grade 5", "sectionCount": 2 }),
        )
        .unwrap();
    mock.assert();
    assert_eq!(record["id"], json!(77));
}

#[test]
fn update_puts_to_the_record_path() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PUT", "/tenants/t1/banners/12")
        .match_body(Matcher::PartialJson(json!({ "data": { "title": "Exams" } })))
        .with_status(200)
        .with_body(json!({ "data": { "id": 12, "title": "Exams" } }).to_string())
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    api.update(&session(), Resource::Banners, "12", &json!({ "title": "Exams" }))
        .unwrap();
    mock.assert();
}

#[test]
fn error_status_carries_server_message() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/tenants/t1/users")
        .with_status(400)
        .with_body(json!({ "data": null, "error": { "status": 400, "message": "Email already taken" } }).to_string())
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    let err = api
        .create(&session(), Resource::Users, &json!({ "email": "a@b.co" }))
        .unwrap_err();

    match &err {
        ApiError::Status { status, message, .. } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Email already taken");
        }
        other => panic!("expected status error, got {}", other),
    }
    assert_eq!(err.user_message(), "Email already taken");
}

#[test]
fn error_without_message_gets_generic_text() {
    let mut server = mockito::Server::new();
    server
        .mock("DELETE", "/tenants/t1/schools/3")
        .with_status(500)
        .with_body("<html>oops</html>")
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    let err = api.delete(&session(), Resource::Schools, "3").unwrap_err();
    assert_eq!(err.user_message(), "Request failed with status 500");
}

#[test]
fn response_without_data_is_an_envelope_error() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/tenants/t1/schools/3")
        .with_status(200)
        .with_body(json!({ "id": 3 }).to_string())
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    let err = api.fetch(&session(), Resource::Schools, "3").unwrap_err();
    assert!(matches!(err, ApiError::Envelope { .. }));
}

#[test]
fn delete_accepts_empty_success_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/tenants/t1/schools/s9/lessons/8")
        .with_status(204)
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    api.delete(&session(), Resource::Lessons, "8").unwrap();
    mock.assert();
}

#[test]
fn upload_steps_hit_backend_then_storage() {
    let mut server = mockito::Server::new();
    let signed_url = format!("{}/storage/obj-1?sig=abc", server.url());

    let sign = server
        .mock("POST", "/tenants/t1/attachments/upload-url")
        .match_body(Matcher::Json(json!({ "data": { "fileName": "logo.png", "contentType": "image/png" } })))
        .with_status(200)
        .with_body(json!({ "data": { "url": signed_url, "key": "obj-1" } }).to_string())
        .create();
    let put = server
        .mock("PUT", "/storage/obj-1")
        .match_query(Matcher::UrlEncoded("sig".into(), "abc".into()))
        .match_header("authorization", Matcher::Missing)
        .match_header("content-type", "image/png")
        .match_body("png-bytes")
        .with_status(200)
        .create();
    let register = server
        .mock("POST", "/tenants/t1/attachments")
        .match_body(Matcher::PartialJson(json!({ "data": { "key": "obj-1", "fileName": "logo.png", "size": 9 } })))
        .with_status(201)
        .with_body(json!({ "data": { "id": "att-5", "key": "obj-1" } }).to_string())
        .create();

    let api = HttpApi::new(&server.url(), None).unwrap();
    let s = session();

    let signed = api.upload_url(&s, "logo.png", "image/png").unwrap();
    assert_eq!(signed.key, "obj-1");
    api.put_object(&signed.url, "image/png", b"png-bytes").unwrap();
    let attachment = api
        .register_attachment(
            &s,
            &AttachmentRequest {
                key: signed.key.clone(),
                file_name: "logo.png".into(),
                content_type: "image/png".into(),
                size: 9,
                checksum: "ff".into(),
            },
        )
        .unwrap();

    sign.assert();
    put.assert();
    register.assert();
    assert_eq!(attachment.id, "att-5");
}

// ============================================================================
// Response helpers
// ============================================================================

#[test]
fn server_message_reads_both_error_shapes() {
    assert_eq!(
        server_message(r#"{"error":{"message":"Nope"}}"#).as_deref(),
        Some("Nope")
    );
    assert_eq!(server_message(r#"{"message":"Flat"}"#).as_deref(), Some("Flat"));
    assert_eq!(server_message("not json"), None);
    assert_eq!(server_message(r#"{"error":"string"}"#), None);
}

#[test]
fn page_without_meta_counts_its_items() {
    let data = json!({ "banners": [{ "id": 1 }, { "id": 2 }] });
    let page = parse_page("u", Resource::Banners, data).unwrap();
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.pagination.page, 1);
    assert!(!page.has_next());

    let err = parse_page("u", Resource::Banners, json!({ "schools": [] })).unwrap_err();
    assert!(err.to_string().contains("missing 'banners' array"));
}
