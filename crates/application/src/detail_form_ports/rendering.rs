use gridform_core::AppResult;
use serde_json::Value;

/// Renders named templates into markup.
pub trait TemplateRenderer: Send + Sync {
    /// Renders a template with a data bag.
    fn render(&self, template: &str, context: &Value) -> AppResult<String>;
}
