//! Function library available to templates and path expressions.
//!
//! A [`Functions`] table is built once per run: the built-in transforms are
//! overlaid with caller supplied entries, and the result is registered on the
//! MiniJinja environment both as global functions and as filters.

use cruet::Inflector;
use indexmap::IndexMap;
use minijinja::value::{Rest, Value};
use minijinja::{Environment, State};

/// Immutable name -> callable table.
#[derive(Debug, Clone, Default)]
pub struct Functions {
    entries: IndexMap<String, Value>,
}

fn inflection(transform: fn(&str) -> String) -> Value {
    Value::from_function(move |input: String| transform(&input))
}

impl Functions {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The case and inflection transforms shipped with copycat.
    pub fn builtin() -> Self {
        Self::new()
            .with("snake_case", inflection(|s| s.to_snake_case()))
            .with("camel_case", inflection(|s| s.to_camel_case()))
            .with("pascal_case", inflection(|s| s.to_pascal_case()))
            .with("kebab_case", inflection(|s| s.to_kebab_case()))
            .with("screaming_snake_case", inflection(|s| s.to_screaming_snake_case()))
            .with("title_case", inflection(|s| s.to_title_case()))
            .with("train_case", inflection(|s| s.to_train_case()))
            .with("plural", inflection(|s| s.to_plural()))
            .with("singular", inflection(|s| s.to_singular()))
    }

    /// Returns the table with `function` registered under `name`, replacing
    /// any previous entry of that name.
    ///
    /// `function` is usually built with [`Value::from_function`].
    pub fn with<N: Into<String>>(mut self, name: N, function: Value) -> Self {
        self.entries.insert(name.into(), function);
        self
    }

    /// Overlays `custom` on top of this table; custom entries win.
    pub fn merge(mut self, custom: Functions) -> Self {
        self.entries.extend(custom.entries);
        self
    }

    #[cfg(test)]
    fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Makes every entry callable as `name(...)` and as `value | name(...)`.
    pub fn register(&self, env: &mut Environment<'static>) {
        for (name, function) in &self.entries {
            env.add_global(name.clone(), function.clone());
            let function = function.clone();
            env.add_filter(name.clone(), move |state: &State, args: Rest<Value>| {
                function.call(state, &args[..])
            });
        }
    }
}
