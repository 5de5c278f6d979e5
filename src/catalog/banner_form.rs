use crate::form::form_model::{
    DefaultValue, FieldSpec, FieldValue, FormSchema, Refinement, Rule,
};

pub const BANNER_AUDIENCES: [&str; 4] = ["All", "Teachers", "Students", "Parents"];

/// Add / edit a dashboard banner. The image is uploaded on submit.
pub fn banner_schema() -> FormSchema {
    FormSchema::new("banner", "Banner")
        .field(
            FieldSpec::text("title", "Title")
                .required()
                .rule(Rule::MaxLength(80)),
        )
        .field(FieldSpec::file("image", "Image").required().payload_key("imageId"))
        .field(FieldSpec::text("linkUrl", "Link").rule(Rule::pattern(
            r"^https?://\S+$",
            "Link must start with http:// or https://",
        )))
        .field(
            FieldSpec::choice("audience", "Audience", &BANNER_AUDIENCES)
                .required()
                .default_value(DefaultValue::Value(FieldValue::from("All"))),
        )
        .field(FieldSpec::date("startsOn", "Starts on").default_value(DefaultValue::Today))
        .field(FieldSpec::date("endsOn", "Ends on"))
        .field(
            FieldSpec::flag("active", "Active")
                .default_value(DefaultValue::Value(FieldValue::Bool(true))),
        )
        .refine(Refinement::NotBefore {
            field: "endsOn".into(),
            other: "startsOn".into(),
            message: "End date cannot be before the start date".into(),
        })
}
