//! Command-line interface implementation for copycat.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for copycat.
#[derive(Parser, Debug)]
#[command(author, version, about = "copycat: expand a template tree using a YAML model", long_about = None)]
pub struct Args {
    /// Path to the YAML (or JSON) model file
    #[arg(short, long, value_name = "FILE")]
    pub model: PathBuf,

    /// Template directory; names may contain {{ }} placeholders
    #[arg(short, long, value_name = "DIR")]
    pub template: PathBuf,

    /// Directory where the generated tree will be written
    #[arg(short = 'o', long = "out", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Only print the planned operations, without touching the output
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 and the help text if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
