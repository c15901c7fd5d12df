//! copycat expands a template tree into a project.
//! File and directory names may contain `{{ expr }}` placeholders evaluated
//! against a YAML model; placeholders resolving to sequences fan a path out
//! into one entry per element, and that element becomes the context of
//! everything below it.

/// Command-line interface module for the copycat binary
pub mod cli;

/// Common constants
pub mod constants;

/// Error types and handling
pub mod error;

/// Placeholder expansion of single path segments
pub mod expander;

/// Built-in and custom template functions
pub mod functions;

/// Library entry point tying model, renderer and processor together
pub mod generator;

/// Logger initialisation
pub mod logger;

/// Canonical model, normalization and model file loading
pub mod model;

/// Depth-first materialization of the template tree
pub mod processor;

/// Template parsing and rendering functionality
pub mod renderer;

/// Template and output storages (file system and in-memory)
pub mod storage;

pub use generator::Generator;
