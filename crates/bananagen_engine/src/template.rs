use handlebars::Handlebars;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
#[error("template rendering failed: {0}")]
pub struct TemplateError(String);

/// Expands a prompt template against a data context.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError>;
}

/// Handlebars without HTML escaping; unknown variables render empty.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(false);
        Self { registry }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        self.registry
            .render_template(template, data)
            .map_err(|err| TemplateError(err.to_string()))
    }
}
