use crate::api::api_model::Resource;
use crate::form::form_model::{
    ConditionalSection, DefaultValue, FieldSpec, FormSchema, OptionList, Rule,
};

/// How a lesson's content is delivered; discriminates the lesson form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Video,
    Document,
    Text,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Video, ContentKind::Document, ContentKind::Text];

    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Video => "Video",
            ContentKind::Document => "Document",
            ContentKind::Text => "Text",
        }
    }

    pub fn section(&self) -> ConditionalSection {
        let fields = match self {
            ContentKind::Video => vec![
                FieldSpec::text("videoUrl", "Video URL")
                    .required()
                    .rule(Rule::pattern(r"^https?://\S+$", "Video URL must start with http:// or https://")),
                FieldSpec::count("durationMinutes", "Duration (minutes)"),
            ],
            ContentKind::Document => vec![FieldSpec::file("document", "Document").required()],
            ContentKind::Text => vec![
                FieldSpec::text("body", "Content")
                    .required()
                    .rule(Rule::MinLength(10)),
            ],
        };
        ConditionalSection::new(&self.label().to_lowercase(), "contentType", self.label(), fields)
    }
}

/// Add / edit lesson content.
pub fn lesson_schema() -> FormSchema {
    let kinds: Vec<&str> = ContentKind::ALL.iter().map(|k| k.label()).collect();

    let mut schema = FormSchema::new("lesson", "Lesson")
        .field(
            FieldSpec::text("title", "Title")
                .required()
                .rule(Rule::MaxLength(150)),
        )
        .field(FieldSpec::select("classId", "Class").required())
        .field(FieldSpec::text("subject", "Subject").required())
        .field(FieldSpec::text("chapter", "Chapter"))
        .field(FieldSpec::text("description", "Description").rule(Rule::MaxLength(1000)))
        .field(FieldSpec::choice("contentType", "Content type", &kinds).required())
        .field(FieldSpec::date("publishOn", "Publish on").default_value(DefaultValue::Today));

    for kind in ContentKind::ALL {
        schema = schema.section(kind.section());
    }
    schema.options_from(OptionList::records_of("classId", Resource::Classes))
}
