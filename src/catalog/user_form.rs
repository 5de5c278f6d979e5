use std::fmt;

use crate::api::api_model::Resource;
use crate::form::form_model::{
    ConditionalSection, DefaultValue, DependentOption, FieldSpec, FieldValue, FormSchema,
    OptionList, PayloadRule, Rule,
};

/// The `type` discriminant of the user form. Each role contributes exactly
/// one conditional section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    Teacher,
    Student,
    SchoolAdmin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Teacher, UserRole::Student, UserRole::SchoolAdmin];

    /// Value stored in the `type` field and sent to the backend.
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::Teacher => "Teacher",
            UserRole::Student => "Student",
            UserRole::SchoolAdmin => "School Admin",
        }
    }

    pub fn from_label(label: &str) -> Option<UserRole> {
        UserRole::ALL.into_iter().find(|r| r.label() == label)
    }

    /// Fields exclusive to this role.
    pub fn fields(&self) -> Vec<FieldSpec> {
        match self {
            UserRole::Teacher => vec![
                FieldSpec::text("employeeId", "Employee ID").required(),
                FieldSpec::text("qualification", "Qualification").rule(Rule::MaxLength(120)),
                FieldSpec::date("joiningDate", "Joining date"),
                FieldSpec::text("subjects", "Subjects"),
            ],
            UserRole::Student => vec![
                FieldSpec::text("admissionNumber", "Admission number").required(),
                FieldSpec::select("classId", "Class").required(),
                FieldSpec::select("sectionId", "Section").required(),
                FieldSpec::count("rollNumber", "Roll number"),
                FieldSpec::date("dateOfBirth", "Date of birth").required(),
                FieldSpec::text("guardianName", "Guardian name").required(),
                FieldSpec::mobile("guardianMobile", "Guardian mobile").required(),
            ],
            UserRole::SchoolAdmin => vec![
                FieldSpec::text("designation", "Designation").required(),
                FieldSpec::select("schoolId", "School").required(),
                FieldSpec::flag("canManageUsers", "Can manage users")
                    .default_value(DefaultValue::Value(FieldValue::Bool(false))),
            ],
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields().into_iter().map(|f| f.name).collect()
    }

    pub fn section(&self) -> ConditionalSection {
        let name = match self {
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
            UserRole::SchoolAdmin => "school_admin",
        };
        ConditionalSection::new(name, "type", self.label(), self.fields())
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const USER_BASE_FIELDS: [&str; 7] = [
    "type", "firstName", "lastName", "email", "mobile", "gender", "status",
];

/// Add / edit user. One schema, one section per [`UserRole`].
pub fn user_schema() -> FormSchema {
    let roles: Vec<&str> = UserRole::ALL.iter().map(|r| r.label()).collect();

    let mut schema = FormSchema::new("user", "User")
        .field(FieldSpec::choice("type", "Role", &roles).required())
        .field(
            FieldSpec::text("firstName", "First name")
                .required()
                .rule(Rule::MaxLength(60)),
        )
        .field(FieldSpec::text("lastName", "Last name").rule(Rule::MaxLength(60)))
        .field(FieldSpec::email("email", "Email").required())
        .field(FieldSpec::mobile("mobile", "Mobile").required())
        .field(FieldSpec::choice("gender", "Gender", &["Male", "Female", "Other"]))
        .field(
            FieldSpec::choice("status", "Status", &["Active", "Inactive"])
                .required()
                .default_value(DefaultValue::Value(FieldValue::from("Active"))),
        );

    for role in UserRole::ALL {
        schema = schema.section(role.section());
    }

    schema
        .options_from(OptionList::records_of("classId", Resource::Classes))
        .options_from(OptionList::records_of("schoolId", Resource::Schools))
        .dependent(DependentOption::remote(
            "sectionId",
            "classId",
            Resource::Sections,
            "classId",
        ))
        .payload_rule(PayloadRule::Group {
            into: "contacts".into(),
            tag: Some(("role".into(), "guardian".into())),
            fields: vec![
                ("guardianName".into(), "name".into()),
                ("guardianMobile".into(), "mobile".into()),
            ],
        })
}
