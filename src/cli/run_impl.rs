use std::path::Path;

use anyhow::Result;

use crate::stripper::{self, StripOutcome};
use crate::traversal;
use crate::types::{Options, RunSummary};

/// Processes every path argument in order and reports per-file problems as
/// they happen. A failing argument or file never stops the rest of the run.
pub fn run_with_options(opts: &Options) -> RunSummary {
    run_with(opts, stripper::strip_bom)
}

fn run_with<F>(opts: &Options, mut strip: F) -> RunSummary
where
    F: FnMut(&Path) -> Result<StripOutcome>,
{
    let mut summary = RunSummary::default();
    for arg in &opts.paths {
        summary.merge(&process_argument(arg, opts, &mut strip));
    }

    if opts.verbosity() > 1 {
        eprintln!(
            "Totals: files={}, stripped={}, failed={}, arguments failed={}",
            summary.files_seen, summary.files_stripped, summary.files_failed, summary.args_failed
        );
    }
    summary
}

fn process_argument<F>(arg: &Path, opts: &Options, strip: &mut F) -> RunSummary
where
    F: FnMut(&Path) -> Result<StripOutcome>,
{
    let mut summary = RunSummary::default();
    let candidates = match traversal::resolve(arg, opts.recursive) {
        Ok(c) => c,
        Err(err) => {
            if !opts.quiet {
                eprintln!("{err:#}");
            }
            summary.args_failed += 1;
            return summary;
        }
    };

    for candidate in candidates {
        let path = match candidate {
            Ok(p) => p,
            Err(err) => {
                if !opts.quiet {
                    eprintln!("error: {err:#}");
                }
                summary.files_failed += 1;
                continue;
            }
        };
        summary.files_seen += 1;
        match strip(&path) {
            Ok(outcome) => {
                if outcome.modified() {
                    summary.files_stripped += 1;
                }
                report(&path, outcome, opts.verbosity());
            }
            Err(err) => {
                if !opts.quiet {
                    eprintln!("error: {err:#}");
                }
                summary.files_failed += 1;
            }
        }
    }
    summary
}

fn report(path: &Path, outcome: StripOutcome, verbosity: u8) {
    if verbosity > 1 || (verbosity > 0 && outcome.modified()) {
        eprintln!("{}: {}", outcome.label(), path.display());
    }
}
