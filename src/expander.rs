//! Placeholder expansion of a single path segment.
//!
//! A segment such as `{{ features.name }}_{{ table }}.go.tmpl` is turned into
//! one [`ExpandedSegment`] per combination of placeholder values. Each result
//! carries the context that deeper path segments and the file body are
//! evaluated against.

use crate::constants::ROOT_ACCESSOR;
use crate::error::{Error, Result};
use crate::model::{Model, Value};
use crate::renderer::TemplateRenderer;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^}]+\}\}").expect("placeholder pattern is valid"));

/// One rendered name together with the context it was produced in.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedSegment<'m> {
    pub name: String,
    pub context: &'m Value,
}

/// Result of walking a dotted path through the model.
#[derive(Debug, PartialEq)]
pub enum Lookup<'m> {
    /// At least one branch resolved.
    Found(Vec<Node<'m>>),
    /// The path ran through an empty sequence; nothing to expand.
    Empty,
    /// Some component named no existing key.
    Missing,
}

/// A resolved value and the context selected on the way to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node<'m> {
    pub value: &'m Value,
    pub context: &'m Value,
}

/// Resolves `path` (e.g. `features.name`, `features.0.name`) starting at `start`.
///
/// Maps descend by key without changing the context. Sequences are indexed
/// by numeric components, or broadcast: every map element holding the key
/// yields one branch whose context is that element.
pub fn resolve_path<'m>(start: &'m Value, path: &str) -> Lookup<'m> {
    let path = path.trim();
    let mut nodes = vec![Node { value: start, context: start }];
    if path.is_empty() || path == "." {
        return Lookup::Found(nodes);
    }

    for component in path.split('.').map(str::trim) {
        if component.is_empty() {
            return Lookup::Missing;
        }
        let mut next = Vec::new();
        let mut through_empty = false;
        for node in &nodes {
            match node.value {
                Value::Map(map) => {
                    if let Some(value) = map.get(component) {
                        next.push(Node { value, context: node.context });
                    }
                }
                Value::Sequence(items) => {
                    through_empty |= items.is_empty();
                    if let Ok(index) = component.parse::<usize>() {
                        if let Some(element) = items.get(index) {
                            next.push(Node { value: element, context: element });
                        }
                    } else {
                        for element in items {
                            if let Some(value) = element.get(component) {
                                next.push(Node { value, context: element });
                            }
                        }
                    }
                }
                Value::Scalar(_) | Value::Absent => {}
            }
        }
        if next.is_empty() {
            return if through_empty { Lookup::Empty } else { Lookup::Missing };
        }
        nodes = next;
    }
    Lookup::Found(nodes)
}

/// Text a value contributes to a name; a map contributes its scalar `name`
/// field and has no text without one.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Scalar(scalar) => Some(scalar.to_string()),
        Value::Map(map) => match map.get("name") {
            Some(Value::Scalar(scalar)) => Some(scalar.to_string()),
            _ => None,
        },
        Value::Sequence(_) | Value::Absent => Some(String::new()),
    }
}

/// Expands path segments against a model.
#[derive(Clone, Copy)]
pub struct Expander<'m, 'r> {
    model: &'m Model,
    renderer: &'r dyn TemplateRenderer,
}

impl<'m, 'r> Expander<'m, 'r> {
    pub fn new(model: &'m Model, renderer: &'r dyn TemplateRenderer) -> Self {
        Self { model, renderer }
    }

    /// Expands every `{{ expr }}` of `segment` left to right.
    ///
    /// Each partial result is extended by the values of the next placeholder
    /// evaluated in that partial's own context, so an expression following a
    /// sequence selection sees the selected element. A segment without
    /// placeholders yields itself once; an empty sequence yields nothing.
    ///
    /// # Errors
    /// * `Error::ExpressionError` if a placeholder neither resolves in the
    ///   model nor evaluates as a template expression
    /// * `Error::TemplateError` if the segment is a single placeholder
    ///   resolving to a map without a `name` field
    pub fn expand(&self, segment: &str, context: &'m Value) -> Result<Vec<ExpandedSegment<'m>>> {
        let mut branches = vec![ExpandedSegment { name: String::new(), context }];
        let mut last = 0;

        for placeholder in PLACEHOLDER.find_iter(segment) {
            let literal = &segment[last..placeholder.start()];
            let raw = placeholder.as_str();
            let expression = raw[2..raw.len() - 2].trim();
            let whole = placeholder.start() == 0 && placeholder.end() == segment.len();

            let mut next = Vec::new();
            for branch in branches {
                for (text, context) in self.resolve(expression, branch.context)? {
                    let text = match text {
                        Some(text) => text,
                        None if whole => {
                            return Err(Error::TemplateError(format!(
                                "'{segment}' resolves to a map without a 'name' field"
                            )));
                        }
                        None => String::new(),
                    };
                    next.push(ExpandedSegment {
                        name: format!("{}{literal}{text}", branch.name),
                        context,
                    });
                }
            }
            branches = next;
            last = placeholder.end();
        }

        let tail = &segment[last..];
        for branch in &mut branches {
            branch.name.push_str(tail);
        }
        debug!("Expanded '{}' into {} name(s)", segment, branches.len());
        Ok(branches)
    }

    /// All (text, context) pairs one expression produces in `context`.
    fn resolve(
        &self,
        expression: &str,
        context: &'m Value,
    ) -> Result<Vec<(Option<String>, &'m Value)>> {
        let root = self.model.root();
        let lookup = if expression == ROOT_ACCESSOR {
            resolve_path(root, "")
        } else if let Some(path) = expression.strip_prefix("root.") {
            resolve_path(root, path)
        } else {
            match resolve_path(context, expression) {
                Lookup::Missing if !std::ptr::eq(context, root) => resolve_path(root, expression),
                lookup => lookup,
            }
        };

        match lookup {
            Lookup::Found(nodes) => Ok(nodes
                .into_iter()
                .map(|node| {
                    // A lookup from the root that selected nothing keeps the caller's context.
                    if std::ptr::eq(node.context, root) {
                        Node { context, ..node }
                    } else {
                        node
                    }
                })
                .flat_map(fan_out)
                .collect()),
            Lookup::Empty => {
                debug!("'{expression}' resolved to an empty sequence");
                Ok(Vec::new())
            }
            Lookup::Missing => {
                debug!("'{expression}' is not a model path, evaluating it as a template");
                let text = self.renderer.evaluate(expression, context)?;
                Ok(vec![(Some(text), context)])
            }
        }
    }
}

/// Sequences fan out per element, maps become the context, scalars keep the
/// context they were found in.
fn fan_out(node: Node<'_>) -> Vec<(Option<String>, &Value)> {
    match node.value {
        Value::Sequence(items) => items.iter().map(|item| (display_text(item), item)).collect(),
        Value::Map(_) => vec![(display_text(node.value), node.value)],
        Value::Scalar(_) | Value::Absent => vec![(display_text(node.value), node.context)],
    }
}
