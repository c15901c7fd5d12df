//! copycat's command-line entry point.
//! Loads the model, validates the directories and runs the generator.

use copycat::{
    cli::{get_args, Args},
    error::{default_error_handler, Error, Result},
    logger::init_logger,
    model::load_model,
    storage::FsStorage,
    Generator,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads and normalizes the model file
/// 2. Checks the template directory
/// 3. Ensures the output directory exists (or reports it in dry-run)
/// 4. Expands the template tree and prints every operation
fn run(args: Args) -> Result<()> {
    let model = load_model(&args.model)?;

    if !args.template.is_dir() {
        return Err(Error::TemplateError(format!(
            "template path '{}' must be a directory",
            args.template.display()
        )));
    }

    if args.dry_run {
        println!("DRY-RUN: would ensure output dir {} exists", args.output_dir.display());
    } else {
        std::fs::create_dir_all(&args.output_dir).map_err(Error::IoError)?;
    }

    let generator = Generator::new(model)?;
    let templates = FsStorage::new();
    let mut output = FsStorage::new();
    let report = generator.run(
        &templates,
        &args.template,
        &mut output,
        &args.output_dir,
        args.dry_run,
    )?;

    for operation in &report.operations {
        println!("{operation}");
    }

    if args.dry_run {
        println!("Dry-run complete. No files written.");
    } else {
        println!("Template expansion complete.");
    }
    Ok(())
}
