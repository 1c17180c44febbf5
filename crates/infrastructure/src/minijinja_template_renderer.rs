use gridform_application::{DEFAULT_TEMPLATE, ITEM_FORM_TEMPLATE, TemplateRenderer};
use gridform_core::{AppError, AppResult};
use minijinja::{AutoEscape, Environment};
use serde_json::Value;


/// Page chrome wrapping admin content.
pub const ADMIN_LAYOUT_TEMPLATE: &str = "AdminLayout";

/// Listing of the collections an admin section hosts.
pub const ADMIN_SECTION_TEMPLATE: &str = "AdminSection";

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        DEFAULT_TEMPLATE,
        include_str!("../templates/GridFieldDetailForm.html"),
    ),
    (
        ITEM_FORM_TEMPLATE,
        include_str!("../templates/ItemEditForm.html"),
    ),
    (
        ADMIN_LAYOUT_TEMPLATE,
        include_str!("../templates/AdminLayout.html"),
    ),
    (
        ADMIN_SECTION_TEMPLATE,
        include_str!("../templates/AdminSection.html"),
    ),
];

/// Template renderer backed by minijinja with the embedded admin templates.
///
/// Every template is HTML auto-escaped regardless of its name.
#[derive(Debug)]
pub struct MiniJinjaTemplateRenderer {
    environment: Environment<'static>,
}

impl MiniJinjaTemplateRenderer {
    /// Creates a renderer with the embedded templates.
    pub fn new() -> AppResult<Self> {
        let mut environment = Environment::new();
        environment.set_auto_escape_callback(|_| AutoEscape::Html);
        for &(name, source) in EMBEDDED_TEMPLATES {
            environment
                .add_template(name, source)
                .map_err(|error| template_error(name, &error))?;
        }

        Ok(Self { environment })
    }
}

impl TemplateRenderer for MiniJinjaTemplateRenderer {
    fn render(&self, template: &str, context: &Value) -> AppResult<String> {
        self.environment
            .get_template(template)
            .and_then(|compiled| compiled.render(context))
            .map_err(|error| template_error(template, &error))
    }
}

fn template_error(template: &str, error: &minijinja::Error) -> AppError {
    AppError::Internal(format!("template '{template}' failed: {error}"))
}
