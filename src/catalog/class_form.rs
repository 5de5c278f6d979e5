use crate::api::api_model::Resource;
use crate::form::form_model::{FieldSpec, FormSchema, OptionList, Rule};

/// Add / edit a class within the active school.
pub fn class_schema() -> FormSchema {
    FormSchema::new("class", "Class")
        .field(
            FieldSpec::text("name", "Class name")
                .required()
                .rule(Rule::MaxLength(40)),
        )
        .field(FieldSpec::count("displayOrder", "Display order"))
        .field(
            FieldSpec::count("sectionCount", "Sections")
                .required()
                .rule(Rule::Min(1.0)),
        )
        .field(FieldSpec::text("seriesId", "Series"))
}

/// Add / edit a section of a class.
pub fn section_schema() -> FormSchema {
    FormSchema::new("section", "Section")
        .field(FieldSpec::select("classId", "Class").required())
        .field(
            FieldSpec::text("name", "Section name")
                .required()
                .rule(Rule::MaxLength(20)),
        )
        .field(FieldSpec::count("capacity", "Capacity"))
        .field(FieldSpec::select("classTeacherId", "Class teacher"))
        .options_from(OptionList::records_of("classId", Resource::Classes))
        .options_from(OptionList::records_of("classTeacherId", Resource::Users).filtered("type", "Teacher"))
}
