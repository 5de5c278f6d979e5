use serde_json::json;

use school_dashboard::api::api_model::Resource;
use school_dashboard::form::form_model::FileHandle;
use school_dashboard::report::feedback::Feedback;
use school_dashboard::submit::submitter::{SubmitError, SubmitMode, Submitter};
use school_dashboard::trace::logger::TraceLogger;
use school_dashboard::upload::uploader::{UploadOutcome, UploadStage, upload_then_register};

use crate::common::fake_api::FakeApi;
use crate::common::fixtures::{tenant_admin, valid_school};

mod common;

fn logo() -> FileHandle {
    FileHandle::new("logo.png", "image/png", b"hello".to_vec())
}

// ============================================================================
// Upload sequence
// ============================================================================

#[test]
fn upload_runs_three_steps_in_order() {
    let api = FakeApi::new();
    let outcome = upload_then_register(&api, &tenant_admin(), &logo());

    assert!(outcome.is_registered());
    assert_eq!(
        api.calls(),
        vec![
            "upload-url logo.png",
            "put https://storage/logo.png",
            "register obj-logo.png",
        ]
    );

    let registered = api.registered.borrow();
    assert_eq!(registered[0].size, 5);
    assert_eq!(registered[0].checksum, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    assert_eq!(registered[0].content_type, "image/png");
}

#[test]
fn put_failure_stops_before_registration() {
    let api = FakeApi {
        fail_put: true,
        ..FakeApi::default()
    };
    let outcome = upload_then_register(&api, &tenant_admin(), &logo());

    assert!(matches!(outcome, UploadOutcome::Failed { stage: UploadStage::Put, .. }));
    assert!(!api.called("register"));
}

#[test]
fn signed_url_failure_uploads_nothing() {
    let api = FakeApi {
        fail_upload_url: true,
        ..FakeApi::default()
    };
    let outcome = upload_then_register(&api, &tenant_admin(), &logo());

    let (stage, error) = outcome.into_result().unwrap_err();
    assert_eq!(stage, UploadStage::SignedUrl);
    assert_eq!(error.user_message(), "Signing service unavailable");
    assert_eq!(api.calls(), vec!["upload-url logo.png"]);
}

#[test]
fn registration_failure_reports_the_stored_object() {
    let api = FakeApi {
        fail_register: true,
        ..FakeApi::default()
    };
    match upload_then_register(&api, &tenant_admin(), &logo()) {
        UploadOutcome::PartialFailure {
            stage, object_key, ..
        } => {
            assert_eq!(stage, UploadStage::Register);
            assert_eq!(object_key, "obj-logo.png");
        }
        other => panic!("expected partial failure, got {:?}", other),
    }
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn valid_form_is_created_once() {
    let api = FakeApi::new();
    let session = tenant_admin();
    let tracer = TraceLogger::disabled();
    let submitter = Submitter::new(&api, &session, &tracer);
    let mut engine = valid_school();

    let receipt = submitter
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap();
    assert_eq!(receipt.record_id.as_deref(), Some("101"));
    assert!(engine.is_submitted());
    assert_eq!(api.calls(), vec!["create schools"]);
    assert_eq!(api.created.borrow()[0]["contacts"][0]["role"], json!("principal"));

    let again = submitter.submit(&mut engine, Resource::Schools, &SubmitMode::Create);
    assert!(matches!(again, Err(SubmitError::AlreadySubmitted)));
    assert_eq!(api.calls().len(), 1, "second submit never reaches the backend");

    let feedback = Feedback::from_receipt("School", &receipt);
    assert!(feedback.is_success());
    assert_eq!(feedback.message, "School created successfully (id 101).");
}

#[test]
fn invalid_form_sends_nothing() {
    let api = FakeApi::new();
    let session = tenant_admin();
    let tracer = TraceLogger::disabled();
    let mut engine = valid_school();
    engine.set_field("pincode", "41100").unwrap();
    engine.set_field("logo", logo()).unwrap();

    let err = Submitter::new(&api, &session, &tracer)
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap_err();

    match err {
        SubmitError::Invalid(errors) => {
            assert_eq!(errors.get("pincode"), Some("Pincode must be 6 digits"));
        }
        other => panic!("expected validation failure, got {}", other),
    }
    assert!(api.calls().is_empty(), "no upload before validation passes");
    assert!(!engine.is_submitted());
}

#[test]
fn files_are_uploaded_before_the_record_is_created() {
    let api = FakeApi::new();
    let session = tenant_admin();
    let tracer = TraceLogger::disabled();
    let mut engine = valid_school();
    engine.set_field("logo", logo()).unwrap();

    let receipt = Submitter::new(&api, &session, &tracer)
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap();

    assert_eq!(
        api.calls(),
        vec![
            "upload-url logo.png",
            "put https://storage/logo.png",
            "register obj-logo.png",
            "create schools",
        ]
    );
    assert_eq!(api.created.borrow()[0]["logo"], json!("att-1"));
    assert_eq!(receipt.attachments.len(), 1);
    assert_eq!(receipt.attachments[0].0, "logo");
}

#[test]
fn failed_put_means_no_create_or_update() {
    for mode in [SubmitMode::Create, SubmitMode::Update("55".into())] {
        let api = FakeApi {
            fail_put: true,
            ..FakeApi::default()
        };
        let session = tenant_admin();
        let tracer = TraceLogger::disabled();
        let mut engine = valid_school();
        engine.set_field("logo", logo()).unwrap();

        let err = Submitter::new(&api, &session, &tracer)
            .submit(&mut engine, Resource::Schools, &mode)
            .unwrap_err();

        match &err {
            SubmitError::Upload {
                field,
                stage,
                orphaned_key,
                ..
            } => {
                assert_eq!(field, "logo");
                assert_eq!(*stage, UploadStage::Put);
                assert!(orphaned_key.is_none());
            }
            other => panic!("expected upload failure, got {}", other),
        }
        assert!(!api.called("create"));
        assert!(!api.called("update"));
        assert!(!engine.is_submitted(), "form stays open for a retry");

        let feedback = Feedback::from_submit_error(&err);
        assert_eq!(feedback.title, "Upload failed");
        assert!(feedback.message.contains("Signature expired"));
    }
}

#[test]
fn registration_failure_keeps_orphaned_key() {
    let api = FakeApi {
        fail_register: true,
        ..FakeApi::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("submit_trace.jsonl");
    let session = tenant_admin();
    let tracer = TraceLogger::new(&path);
    let mut engine = valid_school();
    engine.set_field("logo", logo()).unwrap();

    let err = Submitter::new(&api, &session, &tracer)
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap_err();

    assert!(matches!(
        err,
        SubmitError::Upload { stage: UploadStage::Register, orphaned_key: Some(ref k), .. } if k == "obj-logo.png"
    ));
    assert!(!api.called("create"));

    let feedback = Feedback::from_submit_error(&err);
    assert_eq!(feedback.title, "Upload failed");
    assert!(feedback.message.starts_with("Could not upload 'logo'. Attachment rejected"));
    assert!(feedback.message.contains("obj-logo.png"), "{}", feedback.message);

    let content = std::fs::read_to_string(&path).unwrap();
    let event: serde_json::Value = serde_json::from_str(content.lines().last().unwrap()).unwrap();
    assert_eq!(event["stage"], json!("upload"));
    assert_eq!(event["ok"], json!(false));
    assert!(event["detail"].as_str().unwrap().contains("stored as obj-logo.png"));
}

#[test]
fn failed_put_leaves_nothing_stored() {
    let api = FakeApi {
        fail_put: true,
        ..FakeApi::default()
    };
    let session = tenant_admin();
    let tracer = TraceLogger::disabled();
    let mut engine = valid_school();
    engine.set_field("logo", logo()).unwrap();

    let err = Submitter::new(&api, &session, &tracer)
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap_err();

    let feedback = Feedback::from_submit_error(&err);
    assert!(!feedback.message.contains("stored as"));
    assert!(!feedback.message.contains("not attached"));
}

#[test]
fn server_rejection_surfaces_its_message() {
    let api = FakeApi {
        fail_write: Some((409, "A school with this code already exists".into())),
        ..FakeApi::default()
    };
    let session = tenant_admin();
    let tracer = TraceLogger::disabled();
    let mut engine = valid_school();

    let err = Submitter::new(&api, &session, &tracer)
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap_err();

    let feedback = Feedback::from_submit_error(&err);
    assert!(!feedback.is_success());
    assert_eq!(feedback.title, "Could not save");
    assert_eq!(feedback.message, "A school with this code already exists");
    assert!(!engine.is_submitted());
}

#[test]
fn update_sends_to_the_record_and_keeps_its_id() {
    let api = FakeApi::new();
    let session = tenant_admin();
    let tracer = TraceLogger::disabled();
    let mut engine = valid_school();

    let receipt = Submitter::new(&api, &session, &tracer)
        .submit(&mut engine, Resource::Schools, &SubmitMode::Update("55".into()))
        .unwrap();

    assert_eq!(api.calls(), vec!["update schools 55"]);
    assert_eq!(receipt.record_id.as_deref(), Some("55"));
    assert_eq!(
        Feedback::from_receipt("School", &receipt).message,
        "School updated successfully (id 55)."
    );
}

// ============================================================================
// Trace file
// ============================================================================

#[test]
fn submission_steps_are_traced_as_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("submit_trace.jsonl");
    let api = FakeApi::new();
    let session = tenant_admin();
    let tracer = TraceLogger::new(&path);
    assert!(tracer.is_enabled());

    let mut invalid = valid_school();
    invalid.clear_field("name").unwrap();
    let submitter = Submitter::new(&api, &session, &tracer);
    let _ = submitter.submit(&mut invalid, Resource::Schools, &SubmitMode::Create);

    let mut engine = valid_school();
    engine.set_field("logo", logo()).unwrap();
    submitter
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let events: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["stage"], json!("validate"));
    assert_eq!(events[0]["ok"], json!(false));
    assert!(events[0]["detail"].as_str().unwrap().contains("name"));
    assert_eq!(events[1]["stage"], json!("upload"));
    assert_eq!(events[1]["field"], json!("logo"));
    assert_eq!(events[1]["record_id"], json!("att-1"));
    assert_eq!(events[2]["stage"], json!("create"));
    assert_eq!(events[2]["record_id"], json!("101"));
    assert_eq!(events[2]["form"], json!("school"));
    assert_eq!(events[2]["resource"], json!("schools"));
}

#[test]
fn trace_file_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("daily").join("submit_trace.jsonl");
    let tracer = TraceLogger::new(&path);
    assert!(tracer.is_enabled());
    assert_eq!(tracer.path(), Some(path.as_path()));

    let api = FakeApi::new();
    let mut engine = valid_school();
    Submitter::new(&api, &tenant_admin(), &tracer)
        .submit(&mut engine, Resource::Schools, &SubmitMode::Create)
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1, "visible before the logger is dropped");
    assert!(TraceLogger::disabled().path().is_none());
}
