//! Common constants used throughout copycat.

/// Suffix stripped from the output name of template files (`main.go.tmpl` -> `main.go`)
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".tmpl";

/// Accessor bound to the whole model in every template and expression
pub const ROOT_ACCESSOR: &str = "root";

/// Accessor bound to the current context value itself
pub const THIS_ACCESSOR: &str = "this";

/// Model file extensions parsed as JSON; everything else is read as YAML
pub const JSON_EXTENSIONS: [&str; 1] = ["json"];
