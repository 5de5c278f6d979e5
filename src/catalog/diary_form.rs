use crate::api::api_model::Resource;
use crate::form::form_model::{
    DefaultValue, DependentOption, FieldSpec, FieldValue, FormSchema, OptionList, Rule,
};

pub const DIARY_KINDS: [&str; 3] = ["Homework", "Notice", "Remark"];

/// Add / edit a class diary entry.
pub fn diary_schema() -> FormSchema {
    FormSchema::new("diary", "Diary entry")
        .field(
            FieldSpec::date("entryDate", "Date")
                .required()
                .default_value(DefaultValue::Today),
        )
        .field(FieldSpec::select("classId", "Class").required())
        .field(FieldSpec::select("sectionId", "Section").required())
        .field(
            FieldSpec::choice("kind", "Kind", &DIARY_KINDS)
                .required()
                .default_value(DefaultValue::Value(FieldValue::from("Notice"))),
        )
        .field(
            FieldSpec::text("title", "Title")
                .required()
                .rule(Rule::MaxLength(120)),
        )
        .field(
            FieldSpec::text("note", "Note")
                .required()
                .rule(Rule::MaxLength(2000)),
        )
        .options_from(OptionList::records_of("classId", Resource::Classes))
        .dependent(DependentOption::remote(
            "sectionId",
            "classId",
            Resource::Sections,
            "classId",
        ))
}
