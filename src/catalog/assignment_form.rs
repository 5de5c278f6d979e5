use crate::api::api_model::Resource;
use crate::form::form_model::{
    DefaultValue, DependentOption, FieldSpec, FormSchema, OptionList, Refinement, Rule,
};

/// Add / edit homework for a class section.
pub fn assignment_schema() -> FormSchema {
    FormSchema::new("assignment", "Assignment")
        .field(
            FieldSpec::text("title", "Title")
                .required()
                .rule(Rule::MaxLength(150)),
        )
        .field(FieldSpec::text("description", "Description").rule(Rule::MaxLength(2000)))
        .field(FieldSpec::select("classId", "Class").required())
        .field(FieldSpec::select("sectionId", "Section").required())
        .field(FieldSpec::text("subject", "Subject").required())
        .field(
            FieldSpec::date("assignedOn", "Assigned on")
                .required()
                .default_value(DefaultValue::Today),
        )
        .field(FieldSpec::date("dueOn", "Due on").required())
        .field(FieldSpec::count("maxMarks", "Maximum marks"))
        .field(FieldSpec::file("attachment", "Attachment"))
        .options_from(OptionList::records_of("classId", Resource::Classes))
        .dependent(DependentOption::remote(
            "sectionId",
            "classId",
            Resource::Sections,
            "classId",
        ))
        .refine(Refinement::NotBefore {
            field: "dueOn".into(),
            other: "assignedOn".into(),
            message: "Due date cannot be before the assigned date".into(),
        })
}
