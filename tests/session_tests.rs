use school_dashboard::cli::commands::mask_token;
use school_dashboard::session::session_model::{SessionContext, SessionRole};
use school_dashboard::session::store::{SessionError, SessionStore};

#[test]
fn missing_session_file_is_an_empty_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));

    let session = store.load().unwrap();
    assert_eq!(session, SessionContext::default());
    assert!(session.tenant().is_err());
    assert!(!session.has_any_role(&[SessionRole::TenantAdmin]));
}

#[test]
fn saved_session_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("nested").join("session.json"));
    let session = SessionContext::new("t1", "secret-token")
        .with_role(SessionRole::SchoolAdmin)
        .with_role(SessionRole::SchoolAdmin)
        .with_school("s9");

    store.save(&session).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, session);
    assert_eq!(loaded.roles, vec![SessionRole::SchoolAdmin], "roles are not duplicated");
    assert_eq!(loaded.school().unwrap(), "s9");

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"school_admin\""));
}

#[test]
fn clear_signs_out_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    store.save(&SessionContext::new("t1", "tok")).unwrap();

    store.clear().unwrap();
    assert!(!store.path().exists());
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), SessionContext::default());
}

#[test]
fn corrupt_session_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = SessionStore::new(&path).load().unwrap_err();
    assert!(matches!(err, SessionError::Parse { .. }));
}

#[test]
fn role_checks_match_any_allowed_role() {
    let session = SessionContext::new("t1", "tok")
        .with_role(SessionRole::Teacher)
        .with_role(SessionRole::Student);
    assert!(session.has_any_role(&[SessionRole::SchoolAdmin, SessionRole::Teacher]));
    assert!(!session.has_any_role(&[SessionRole::TenantAdmin]));
    assert!(!session.has_any_role(&[]));
}

#[test]
fn tokens_are_masked_for_display() {
    assert_eq!(mask_token(Some("abcdef123456")), "****3456");
    assert_eq!(mask_token(Some("abc")), "****");
    assert_eq!(mask_token(None), "-");
}
