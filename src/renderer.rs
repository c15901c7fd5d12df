//! Template renderer and rendering functionality for copycat.
//! Renders file bodies and evaluates path expressions with MiniJinja.
use crate::constants::{ROOT_ACCESSOR, THIS_ACCESSOR};
use crate::error::{Error, Result};
use crate::functions::Functions;
use crate::model::{Model, Value};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `name` - Name reported in errors (usually the template path)
    /// * `template` - Template string to render
    /// * `context` - Value in scope; its fields become template variables
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, name: &str, template: &str, context: &Value) -> Result<String>;

    /// Evaluates a single expression (the inside of a `{{ }}` placeholder)
    /// and returns its textual value.
    fn evaluate(&self, expression: &str, context: &Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
///
/// Unknown variables are errors, output is never auto-escaped and trailing
/// newlines of templates are kept.
///
/// Fields are plain variables (`{{ name }}`); Go-style `.name` selectors are
/// not supported.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance, with `root` and the functions registered
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer whose `root` accessor is bound to `model`.
    pub fn new(model: &Model, functions: &Functions) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        functions.register(&mut env);
        env.add_global(ROOT_ACCESSOR, minijinja::Value::from_serialize(model.root()));
        Self { env }
    }
}

/// Variables of one render: the context's fields plus `this`.
///
/// Fields named like an accessor are left out so `root` and `this` always
/// refer to the model and the context.
struct Scope<'a> {
    context: &'a Value,
}

impl Serialize for Scope<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_map(None)?;
        if let Value::Map(fields) = self.context {
            for (key, value) in fields {
                if key != ROOT_ACCESSOR && key != THIS_ACCESSOR {
                    state.serialize_entry(key, value)?;
                }
            }
        }
        state.serialize_entry(THIS_ACCESSOR, self.context)?;
        state.end()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::RenderError` if the template is malformed or references an
    ///   undefined value
    fn render(&self, name: &str, template: &str, context: &Value) -> Result<String> {
        self.env
            .render_named_str(name, template, Scope { context })
            .map_err(|source| Error::RenderError { template: name.to_string(), source })
    }

    /// # Errors
    /// * `Error::ExpressionError` if the expression cannot be evaluated
    fn evaluate(&self, expression: &str, context: &Value) -> Result<String> {
        let template = format!("{{{{ {expression} }}}}");
        self.env.render_named_str("<expression>", &template, Scope { context }).map_err(
            |source| Error::ExpressionError { expression: expression.to_string(), source },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::normalize;

    fn model(yaml: &str) -> Model {
        normalize(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_accessor_fields_do_not_shadow_root() {
        let model = model("projectName: App\nitem:\n  root: shadow\n  name: x");
        let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
        let item = model.get("item").unwrap();

        let out = renderer.render("t", "{{ root.projectName }} {{ name }}", item).unwrap();
        assert_eq!(out, "App x");
    }

    #[test]
    fn test_evaluate_applies_filters() {
        let model = model("projectName: My App");
        let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());

        let out = renderer.evaluate("projectName | snake_case", model.root()).unwrap();
        assert_eq!(out, "my_app");
    }
}
