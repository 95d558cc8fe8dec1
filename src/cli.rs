use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::{ContextKind, ErrorKind};
use clap::{ArgAction, Parser, ValueHint};

use crate::types::Options;

mod run_impl;
mod switches;

pub use run_impl::run_with_options;

pub const USAGE: &str = "\
Removes UTF-8 BOM from file(s).

debom [/Q] [/R] [/V] [path][filename] ...

  /Q  Does not display any messages.
  /R  Removes BOM from files in directories recursively.
  /V  Lists modified files. Repeat to list every file and a summary.

Wildcards * and ? are allowed in the filename.
Switches may also be written -q/--quiet, -r/--recursive, -v/--verbose.
Use -- before names that start with - or /, e.g. debom -- -notes.txt";

#[derive(Parser, Debug, Clone)]
#[command(name = "debom", version, about = "Removes UTF-8 BOM from file(s)", long_about = None)]
pub struct Args {
    /// Do not display any messages
    #[arg(long = "quiet", short = 'q', action = ArgAction::SetTrue, overrides_with = "quiet")]
    pub quiet: bool,

    /// Descend into subdirectories
    #[arg(
        long = "recursive",
        short = 'r',
        action = ArgAction::SetTrue,
        overrides_with = "recursive"
    )]
    pub recursive: bool,

    /// List modified files (-vv: every file inspected, plus totals)
    #[arg(long = "verbose", short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Files, directories, or patterns such as dir/*.txt
    #[arg(value_name = "PATH", value_hint = ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,
}

impl From<Args> for Options {
    fn from(args: Args) -> Self {
        Options {
            quiet: args.quiet,
            recursive: args.recursive,
            verbose: args.verbose,
            paths: args.paths,
        }
    }
}

/// Why an invocation stopped before touching any file.
#[derive(Debug)]
pub enum UsageError {
    InvalidSwitch(String),
    MissingPaths,
    /// Help, version, or any other clap outcome.
    Clap(clap::Error),
}

/// Parses a full argument vector, program name first.
///
/// # Errors
/// Returns a [`UsageError`] for unknown switches, a missing path list, or
/// anything clap itself stops on.
pub fn parse_options<I, T>(argv: I) -> Result<Options, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let translated = switches::translate(argv).map_err(UsageError::InvalidSwitch)?;
    let args = Args::try_parse_from(translated.iter()).map_err(|err| match err.kind() {
        ErrorKind::UnknownArgument => {
            let reported = err
                .get(ContextKind::InvalidArg)
                .map_or_else(String::new, ToString::to_string);
            UsageError::InvalidSwitch(offending_token(&translated, &reported))
        }
        _ => UsageError::Clap(err),
    })?;
    if args.paths.is_empty() {
        return Err(UsageError::MissingPaths);
    }
    Ok(Options::from(args))
}

// clap names only the unknown part of a token (`-n` for `-notes.txt`);
// report the whole token the user typed.
fn offending_token(argv: &[OsString], reported: &str) -> String {
    if reported.is_empty() {
        return String::new();
    }
    argv.iter()
        .skip(1)
        .take_while(|a| a.as_os_str() != "--")
        .filter_map(|a| a.to_str())
        .find(|a| a.starts_with(reported))
        .unwrap_or(reported)
        .to_string()
}

/// Runs the CLI application.
///
/// # Errors
/// Returns an error only if help or version output cannot be written.
pub fn run() -> Result<ExitCode> {
    run_from(std::env::args_os())
}

/// Runs with an explicit argument vector.
///
/// # Errors
/// Returns an error only if help or version output cannot be written.
pub fn run_from<I, T>(argv: I) -> Result<ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    match parse_options(argv) {
        Ok(opts) => Ok(run_with_options(&opts).exit_code()),
        Err(UsageError::InvalidSwitch(token)) => {
            println!("Invalid switch - \"{token}\"");
            Ok(usage())
        }
        Err(UsageError::MissingPaths) => Ok(usage()),
        Err(UsageError::Clap(err)) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(ExitCode::SUCCESS)
            }
            _ => {
                eprintln!("{err}");
                Ok(usage())
            }
        },
    }
}

fn usage() -> ExitCode {
    println!("{USAGE}");
    ExitCode::FAILURE
}
