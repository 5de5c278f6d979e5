use chrono::NaiveDate;

use school_dashboard::catalog::school_form::school_schema;
use school_dashboard::catalog::user_form::user_schema;
use school_dashboard::form::engine::FormEngine;
use school_dashboard::form::form_model::{FieldValue, Record};
use school_dashboard::session::session_model::{SessionContext, SessionRole};

pub fn tenant_admin() -> SessionContext {
    SessionContext::new("t1", "secret-token").with_role(SessionRole::TenantAdmin)
}

pub fn teacher_session() -> SessionContext {
    SessionContext::new("t1", "secret-token")
        .with_role(SessionRole::Teacher)
        .with_school("s9")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn class_row(class_id: &str, sections: f64) -> Record {
    let mut row = Record::new();
    row.insert("classId".into(), FieldValue::from(class_id));
    row.insert("sectionCount".into(), FieldValue::Number(sections));
    row
}

/// A school form with every required field filled in.
pub fn valid_school() -> FormEngine {
    let mut engine = FormEngine::initialize_on(school_schema(), Record::new(), date(2025, 6, 15));
    let values: [(&str, &str); 12] = [
        ("name", "Green Valley High"),
        ("schoolBoard", "CBSE"),
        ("email", "office@greenvalley.edu"),
        ("mobile", "9876543210"),
        ("addressLine", "12 Lake Road"),
        ("city", "Pune"),
        ("state", "Maharashtra"),
        ("pincode", "411001"),
        ("teacherLicenses", "40"),
        ("studentLicenses", "800"),
        ("principalName", "Asha Rao"),
        ("principalMobile", "9123456780"),
    ];
    for (field, value) in values {
        engine.set_field(field, value).unwrap();
    }
    engine.set_field("classes", vec![class_row("1", 2.0)]).unwrap();
    engine
}

pub fn user_with_role(role: &str) -> FormEngine {
    let mut engine = FormEngine::initialize(user_schema(), Record::new());
    engine.set_field("type", role).unwrap();
    engine
}
