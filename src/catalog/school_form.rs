use crate::api::api_model::Resource;
use crate::form::form_model::{
    ConditionalSection, DefaultValue, FieldSpec, FieldValue, FormSchema, OptionList, PayloadRule,
    Refinement, Rule,
};

pub const SCHOOL_BOARDS: [&str; 5] = ["CBSE", "ICSE", "State Board", "IB", "IGCSE"];
pub const SCHOOL_STATUSES: [&str; 4] = ["Pending", "Active", "Inactive", "Suspended"];

/// Add / edit school.
///
/// `isBranch` discriminates the branch section (parent school). Principal
/// details are entered flat and submitted as a `contacts[]` entry tagged
/// `role: "principal"`; address fields are nested under `address`.
pub fn school_schema() -> FormSchema {
    FormSchema::new("school", "School")
        .field(
            FieldSpec::text("name", "School name")
                .required()
                .rule(Rule::MaxLength(120)),
        )
        .field(FieldSpec::text("code", "School code").rule(Rule::pattern(
            r"^[A-Za-z0-9-]{2,20}$",
            "School code must be 2-20 letters, digits or dashes",
        )))
        .field(FieldSpec::choice("schoolBoard", "Board", &SCHOOL_BOARDS).required())
        .field(FieldSpec::text("affiliationNumber", "Affiliation number").rule(Rule::MaxLength(40)))
        .field(FieldSpec::email("email", "Email").required())
        .field(FieldSpec::mobile("mobile", "Mobile").required())
        .field(FieldSpec::text("addressLine", "Address").required())
        .field(FieldSpec::text("city", "City").required())
        .field(FieldSpec::text("state", "State").required())
        .field(
            FieldSpec::text("pincode", "Pincode")
                .required()
                .rule(Rule::pattern(r"^\d{6}$", "Pincode must be 6 digits")),
        )
        .field(
            FieldSpec::choice("status", "Status", &SCHOOL_STATUSES)
                .required()
                .default_value(DefaultValue::Value(FieldValue::from("Pending"))),
        )
        .field(
            FieldSpec::date("expiryDate", "Licence expiry")
                .required()
                .default_value(DefaultValue::NextAcademicYearEnd),
        )
        .field(FieldSpec::count("teacherCount", "Teachers"))
        .field(FieldSpec::count("studentCount", "Students"))
        .field(FieldSpec::count("teacherLicenses", "Teacher licences").required())
        .field(FieldSpec::count("studentLicenses", "Student licences").required())
        .field(FieldSpec::file("logo", "Logo"))
        .field(FieldSpec::text("principalName", "Principal name").required())
        .field(FieldSpec::mobile("principalMobile", "Principal mobile").required())
        .field(FieldSpec::email("principalEmail", "Principal email"))
        .field(
            FieldSpec::rows(
                "classes",
                "Classes",
                vec![
                    FieldSpec::select("classId", "Class").required(),
                    FieldSpec::count("sectionCount", "Sections")
                        .required()
                        .rule(Rule::Min(1.0)),
                    FieldSpec::text("seriesId", "Series"),
                ],
                1,
            )
            .required(),
        )
        .field(
            FieldSpec::flag("isBranch", "Branch of another school")
                .default_value(DefaultValue::Value(FieldValue::Bool(false))),
        )
        .section(ConditionalSection::new(
            "branch",
            "isBranch",
            "true",
            vec![FieldSpec::select("parentSchool", "Parent school")],
        ))
        .options_from(OptionList::records_of("parentSchool", Resource::Schools))
        .refine(Refinement::RequiredWhen {
            field: "parentSchool".into(),
            when: "isBranch".into(),
            equals: "true".into(),
            message: "Parent school is required for a branch".into(),
        })
        .payload_rule(PayloadRule::Group {
            into: "contacts".into(),
            tag: Some(("role".into(), "principal".into())),
            fields: vec![
                ("principalName".into(), "name".into()),
                ("principalMobile".into(), "mobile".into()),
                ("principalEmail".into(), "email".into()),
            ],
        })
        .payload_rule(PayloadRule::Nest {
            under: "address".into(),
            fields: vec![
                "addressLine".into(),
                "city".into(),
                "state".into(),
                "pincode".into(),
            ],
        })
}
