mod commands;
mod helpers;

use bsmcmp_core::domain::CmpError;
use bsmcmp_core::modules::{AdapterKind, format_unavailable_error};
use clap::{CommandFactory, FromArgMatches, Parser};

pub fn run_from_env() -> i32 {
    helpers::init_tracing();
    match run(std::env::args().skip(1)) {
        Ok(code) => code,
        Err(error) => {
            let cmp_error = error.as_cmp_error();
            eprintln!("{}", cmp_error.diagnostic_line());
            if let Some(summary_line) = cmp_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            cmp_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("bsmcmp".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    // Formats compiled out of the core stay parseable but are hidden and rejected.
    let mut command = Cli::command();
    for kind in AdapterKind::ALL {
        if !kind.available() {
            command = command.mut_subcommand(kind.as_str(), |sub| sub.hide(true));
        }
    }

    let parsed = command
        .try_get_matches_from(&args)
        .and_then(|matches| Cli::from_arg_matches(&matches));
    match parsed {
        Ok(cli) => {
            if cli.no_color {
                colored::control::set_override(false);
            }
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "bsmcmp",
    version,
    about = "Compare hierarchical dataset files or mirrored folders of them"
)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compare plain text files line by line
    Ascii(commands::CompareArgs),
    /// Compare delimited text files column by column
    Csv(commands::CompareArgs),
    /// Compare JSON dataset documents
    Json(commands::CompareArgs),
    /// List the formats available in this build
    Formats,
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Ascii(args) => dispatch_format(AdapterKind::Ascii, args),
        CliCommand::Csv(args) => dispatch_format(AdapterKind::Csv, args),
        CliCommand::Json(args) => dispatch_format(AdapterKind::Json, args),
        CliCommand::Formats => commands::run_formats_command(),
    }
}

fn dispatch_format(kind: AdapterKind, args: commands::CompareArgs) -> Result<i32, CliError> {
    if !kind.available() {
        return Err(CliError::Compare(format_unavailable_error(kind)));
    }
    commands::run_compare_command(kind, args)
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compare(CmpError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_cmp_error(&self) -> CmpError {
        match self {
            Self::Usage(message) => CmpError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compare(error) => error.clone(),
            Self::Internal(error) => CmpError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
