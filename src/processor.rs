//! Depth-first materialization of a template tree.
//!
//! The [`Processor`] walks the template storage, expands every entry name,
//! renders file bodies and records each decision as an [`Operation`]. In
//! dry-run mode the very same decisions are taken and reported, but the
//! output storage is only read.

use crate::error::{Error, Result};
use crate::expander::Expander;
use crate::model::{Model, Value};
use crate::renderer::TemplateRenderer;
use crate::storage::{EntryKind, OutputStorage, TemplateStorage};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A change made (or planned, in dry-run) to the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// A directory that did not exist before the run.
    CreateDir { path: PathBuf },
    /// A rendered file and its size in bytes.
    WriteFile { path: PathBuf, bytes: usize },
    /// A file whose rendered body was blank.
    Skip { path: PathBuf },
    /// A stale file from a previous run, removed because its body is now blank.
    RemoveFile { path: PathBuf },
    /// A directory created by this run that ended up empty.
    RemoveDir { path: PathBuf },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateDir { path } => write!(f, "[DIR]   {}", path.display()),
            Operation::WriteFile { path, bytes } => {
                write!(f, "[FILE]  {} ({bytes} bytes)", path.display())
            }
            Operation::Skip { path } => {
                write!(f, "[SKIP]  {} (empty after rendering)", path.display())
            }
            Operation::RemoveFile { path } => write!(f, "[DEL]   {} (stale)", path.display()),
            Operation::RemoveDir { path } => write!(f, "[RMDIR] {} (empty)", path.display()),
        }
    }
}

/// Ordered log of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub dry_run: bool,
    pub operations: Vec<Operation>,
}

impl Report {
    pub fn created_dirs(&self) -> usize {
        self.count(|op| matches!(op, Operation::CreateDir { .. }))
    }

    pub fn written_files(&self) -> usize {
        self.count(|op| matches!(op, Operation::WriteFile { .. }))
    }

    pub fn skipped_files(&self) -> usize {
        self.count(|op| matches!(op, Operation::Skip { .. }))
    }

    pub fn removed_files(&self) -> usize {
        self.count(|op| matches!(op, Operation::RemoveFile { .. }))
    }

    pub fn removed_dirs(&self) -> usize {
        self.count(|op| matches!(op, Operation::RemoveDir { .. }))
    }

    fn count(&self, predicate: impl Fn(&Operation) -> bool) -> usize {
        self.operations.iter().filter(|op| predicate(op)).count()
    }
}

/// Rejects rendered names that would leave the directory they belong to.
fn is_rendered_name_valid(name: &str) -> bool {
    Path::new(name).components().all(|c| matches!(c, Component::Normal(_)))
}

/// Strips `suffix` from a rendered file name when the template name carries it.
pub fn resolve_output_name<'a>(template_name: &str, rendered: &'a str, suffix: &str) -> &'a str {
    if !suffix.is_empty() && template_name.ends_with(suffix) {
        rendered.strip_suffix(suffix).unwrap_or(rendered)
    } else {
        rendered
    }
}

/// Walks one template tree into one output tree.
pub struct Processor<'a, 'm> {
    expander: Expander<'m, 'a>,
    renderer: &'a dyn TemplateRenderer,
    templates: &'a dyn TemplateStorage,
    output: &'a mut dyn OutputStorage,
    output_root: PathBuf,
    template_suffix: &'a str,
    dry_run: bool,
    /// Directories created (or planned) by this run; the only cleanup candidates.
    created: BTreeSet<PathBuf>,
    written: BTreeSet<PathBuf>,
    report: Report,
}

impl<'a, 'm> Processor<'a, 'm> {
    pub fn new(
        model: &'m Model,
        renderer: &'a dyn TemplateRenderer,
        templates: &'a dyn TemplateStorage,
        output: &'a mut dyn OutputStorage,
        output_root: &Path,
        template_suffix: &'a str,
        dry_run: bool,
    ) -> Self {
        Self {
            expander: Expander::new(model, renderer),
            renderer,
            templates,
            output,
            output_root: output_root.to_path_buf(),
            template_suffix,
            dry_run,
            created: BTreeSet::new(),
            written: BTreeSet::new(),
            report: Report { dry_run, operations: Vec::new() },
        }
    }

    /// Expands `template_root` with `context` and cleans up afterwards.
    ///
    /// The first error aborts the run; cleanup only happens after success.
    pub fn run(mut self, template_root: &Path, context: &'m Value) -> Result<Report> {
        info!(
            "Expanding '{}' into '{}'{}",
            template_root.display(),
            self.output_root.display(),
            if self.dry_run { " (dry-run)" } else { "" }
        );
        let output_root = self.output_root.clone();
        self.process_dir(template_root, &output_root, context)?;
        self.remove_empty_dirs()?;
        Ok(self.report)
    }

    fn process_dir(
        &mut self,
        template_dir: &Path,
        output_dir: &Path,
        context: &'m Value,
    ) -> Result<()> {
        for entry in self.templates.list_dir(template_dir)? {
            let template_path = template_dir.join(&entry.name);
            let expanded = self.expander.expand(&entry.name, context)?;

            for segment in expanded {
                if segment.name.trim().is_empty() {
                    debug!("Skipping '{}' as its rendered name is empty", template_path.display());
                    continue;
                }
                if !is_rendered_name_valid(&segment.name) {
                    return Err(Error::TemplateError(format!(
                        "'{}' renders to '{}', which escapes the output directory",
                        template_path.display(),
                        segment.name
                    )));
                }

                match entry.kind {
                    EntryKind::Directory => {
                        let target = output_dir.join(&segment.name);
                        self.ensure_dir(&target)?;
                        self.process_dir(&template_path, &target, segment.context)?;
                    }
                    EntryKind::File => {
                        let name = resolve_output_name(
                            &entry.name,
                            &segment.name,
                            self.template_suffix,
                        );
                        let target = output_dir.join(name);
                        self.process_file(&template_path, target, segment.context)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn process_file(
        &mut self,
        template_path: &Path,
        target: PathBuf,
        context: &'m Value,
    ) -> Result<()> {
        let body = self.templates.read_file(template_path)?;
        let content =
            self.renderer.render(&template_path.display().to_string(), &body, context)?;

        if content.trim().is_empty() {
            debug!("Skipping '{}' as it is empty after rendering", target.display());
            // A file written earlier in this run counts as stale too.
            let stale = self.written.remove(&target) || self.output.is_file(&target);
            self.report.operations.push(Operation::Skip { path: target.clone() });
            if stale {
                if !self.dry_run {
                    self.output.remove_file(&target)?;
                }
                self.report.operations.push(Operation::RemoveFile { path: target });
            }
            return Ok(());
        }

        if let Some(parent) = target.parent() {
            self.ensure_dir(parent)?;
        }
        debug!("Writing file: {}", target.display());
        if !self.dry_run {
            self.output.write_file(&target, &content)?;
        }
        let bytes = content.len();
        self.report.operations.push(Operation::WriteFile { path: target.clone(), bytes });
        self.written.insert(target);
        Ok(())
    }

    /// Creates `dir` and its missing ancestors below the output root,
    /// recording each of them as created by this run.
    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        let missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|p| {
                !p.as_os_str().is_empty()
                    && *p != self.output_root.as_path()
                    && !self.created.contains(*p)
                    && !self.output.exists(p)
            })
            .map(Path::to_path_buf)
            .collect();

        for path in missing.into_iter().rev() {
            debug!("Creating directory: {}", path.display());
            if !self.dry_run {
                self.output.create_dir(&path)?;
            }
            self.report.operations.push(Operation::CreateDir { path: path.clone() });
            self.created.insert(path);
        }
        Ok(())
    }

    /// Removes directories of this run that ended up without children,
    /// deepest first. In dry-run, emptiness is derived from the planned writes.
    fn remove_empty_dirs(&mut self) -> Result<()> {
        let created = std::mem::take(&mut self.created);
        for dir in created.iter().rev() {
            let empty = if self.dry_run {
                !self.written.iter().any(|file| file.starts_with(dir))
            } else {
                self.output.is_empty_dir(dir)?
            };
            if empty {
                debug!("Removing empty directory: {}", dir.display());
                if !self.dry_run {
                    self.output.remove_dir(dir)?;
                }
                self.report.operations.push(Operation::RemoveDir { path: dir.clone() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_name() {
        assert_eq!(resolve_output_name("{{ name }}.go.tmpl", "auth.go.tmpl", ".tmpl"), "auth.go");
        assert_eq!(resolve_output_name("README.md", "README.md", ".tmpl"), "README.md");
        assert_eq!(resolve_output_name("x.tmpl", "x.tmpl", ""), "x.tmpl");
    }

    #[test]
    fn test_is_rendered_name_valid() {
        assert!(is_rendered_name_valid("auth"));
        assert!(is_rendered_name_valid("nested/auth"));
        assert!(!is_rendered_name_valid("../auth"));
        assert!(!is_rendered_name_valid("/etc"));
    }

    #[test]
    fn test_operation_display() {
        let op = Operation::WriteFile { path: PathBuf::from("out/a.go"), bytes: 12 };
        assert_eq!(op.to_string(), "[FILE]  out/a.go (12 bytes)");
        let op = Operation::Skip { path: PathBuf::from("out/empty.txt") };
        assert_eq!(op.to_string(), "[SKIP]  out/empty.txt (empty after rendering)");
    }
}
