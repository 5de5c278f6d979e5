pub mod assignment_form;
pub mod banner_form;
pub mod class_form;
pub mod diary_form;
pub mod lesson_form;
pub mod options;
pub mod school_form;
pub mod user_form;

use std::fmt;

use crate::api::api_model::Resource;
use crate::form::form_model::FormSchema;
use crate::session::session_model::SessionRole;

/// Every CRUD form of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum FormKind {
    School,
    User,
    Class,
    Section,
    Lesson,
    Assignment,
    Diary,
    Banner,
}

impl FormKind {
    pub const ALL: [FormKind; 8] = [
        FormKind::School,
        FormKind::User,
        FormKind::Class,
        FormKind::Section,
        FormKind::Lesson,
        FormKind::Assignment,
        FormKind::Diary,
        FormKind::Banner,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FormKind::School => "school",
            FormKind::User => "user",
            FormKind::Class => "class",
            FormKind::Section => "section",
            FormKind::Lesson => "lesson",
            FormKind::Assignment => "assignment",
            FormKind::Diary => "diary",
            FormKind::Banner => "banner",
        }
    }

    /// A fresh schema; each form use gets its own.
    pub fn schema(&self) -> FormSchema {
        match self {
            FormKind::School => school_form::school_schema(),
            FormKind::User => user_form::user_schema(),
            FormKind::Class => class_form::class_schema(),
            FormKind::Section => class_form::section_schema(),
            FormKind::Lesson => lesson_form::lesson_schema(),
            FormKind::Assignment => assignment_form::assignment_schema(),
            FormKind::Diary => diary_form::diary_schema(),
            FormKind::Banner => banner_form::banner_schema(),
        }
    }

    pub fn resource(&self) -> Resource {
        match self {
            FormKind::School => Resource::Schools,
            FormKind::User => Resource::Users,
            FormKind::Class => Resource::Classes,
            FormKind::Section => Resource::Sections,
            FormKind::Lesson => Resource::Lessons,
            FormKind::Assignment => Resource::Assignments,
            FormKind::Diary => Resource::Diaries,
            FormKind::Banner => Resource::Banners,
        }
    }

    /// Session roles that may open this form.
    pub fn allowed_roles(&self) -> &'static [SessionRole] {
        use SessionRole::*;
        match self {
            FormKind::School => &[TenantAdmin],
            FormKind::User | FormKind::Class | FormKind::Section | FormKind::Banner => {
                &[TenantAdmin, SchoolAdmin]
            }
            FormKind::Lesson | FormKind::Assignment | FormKind::Diary => {
                &[TenantAdmin, SchoolAdmin, Teacher]
            }
        }
    }

    pub fn from_name(name: &str) -> Option<FormKind> {
        FormKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The form that edits records of `resource`, if any.
    pub fn for_resource(resource: Resource) -> Option<FormKind> {
        FormKind::ALL.into_iter().find(|k| k.resource() == resource)
    }
}

// ============================================================================
// Resource access outside the forms (list / delete)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Delete,
}

impl Access {
    pub fn verb(&self) -> &'static str {
        match self {
            Access::Read => "list",
            Access::Delete => "delete",
        }
    }
}

/// Session roles that may list or delete records of `resource`.
///
/// Deleting follows the roles of the resource's form. Teachers may also read
/// classes and sections, which they pick from when writing lessons,
/// assignments and diary entries.
pub fn resource_roles(resource: Resource, access: Access) -> &'static [SessionRole] {
    use SessionRole::*;
    match (resource, access) {
        (Resource::Attachments, _) => &[TenantAdmin, SchoolAdmin, Teacher],
        (Resource::Classes | Resource::Sections, Access::Read) => &[TenantAdmin, SchoolAdmin, Teacher],
        _ => FormKind::for_resource(resource)
            .map(|kind| kind.allowed_roles())
            .unwrap_or(&[TenantAdmin]),
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
