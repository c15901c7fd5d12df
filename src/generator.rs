//! Entry point of the library: one model, one renderer, any number of runs.

use crate::constants::DEFAULT_TEMPLATE_SUFFIX;
use crate::error::{Error, Result};
use crate::functions::Functions;
use crate::model::Model;
use crate::processor::{Processor, Report};
use crate::renderer::MiniJinjaRenderer;
use crate::storage::{OutputStorage, TemplateStorage};
use log::debug;
use std::path::{Path, PathBuf};

/// Expands template trees against a model.
///
/// Construction interpolates templated strings of the model and builds the
/// renderer with the function table; both stay fixed afterwards.
pub struct Generator {
    model: Model,
    renderer: MiniJinjaRenderer,
    template_suffix: String,
}

impl Generator {
    /// Creates a generator with the built-in functions.
    pub fn new(model: Model) -> Result<Self> {
        Self::with_functions(model, Functions::new())
    }

    /// Creates a generator whose function table is the built-ins overlaid
    /// with `custom`.
    ///
    /// # Errors
    /// * `Error::RenderError` if a templated model string fails to render
    pub fn with_functions(model: Model, custom: Functions) -> Result<Self> {
        if !custom.is_empty() {
            let names: Vec<&str> = custom.names().collect();
            debug!("Registering {} custom function(s): {}", custom.len(), names.join(", "));
        }
        let functions = Functions::builtin().merge(custom);
        let model = model.interpolate(&MiniJinjaRenderer::new(&model, &functions))?;
        let renderer = MiniJinjaRenderer::new(&model, &functions);
        Ok(Self { model, renderer, template_suffix: DEFAULT_TEMPLATE_SUFFIX.to_string() })
    }

    /// Replaces the suffix stripped from template file names (`.tmpl`).
    pub fn template_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.template_suffix = suffix.into();
        self
    }

    /// The interpolated model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn renderer(&self) -> &MiniJinjaRenderer {
        &self.renderer
    }

    /// Expands `template_root` into `output_root`.
    ///
    /// A missing output root is created first (real runs only); it is not
    /// considered created by the run and is never removed.
    ///
    /// # Returns
    /// * `Result<Report>` - Every directory/file operation, in execution order
    pub fn run(
        &self,
        templates: &dyn TemplateStorage,
        template_root: &Path,
        output: &mut dyn OutputStorage,
        output_root: &Path,
        dry_run: bool,
    ) -> Result<Report> {
        if !dry_run {
            prepare_output_root(output, output_root)?;
        }
        Processor::new(
            &self.model,
            &self.renderer,
            templates,
            output,
            output_root,
            &self.template_suffix,
            dry_run,
        )
        .run(template_root, self.model.root())
    }
}

fn prepare_output_root(output: &mut dyn OutputStorage, output_root: &Path) -> Result<()> {
    let missing: Vec<PathBuf> = output_root
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !output.exists(p))
        .map(Path::to_path_buf)
        .collect();
    for path in missing.into_iter().rev() {
        debug!("Creating output root: {}", path.display());
        output.create_dir(&path)?;
    }
    if output.is_file(output_root) {
        return Err(Error::TemplateError(format!(
            "output path '{}' is a file",
            output_root.display()
        )));
    }
    Ok(())
}
