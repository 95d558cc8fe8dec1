use std::path::PathBuf;
use std::process::ExitCode;

/// Settings for one invocation, fixed once arguments are parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub quiet: bool,
    pub recursive: bool,
    pub verbose: u8,
    pub paths: Vec<PathBuf>,
}

impl Options {
    /// Verbosity after quiet has had its say.
    pub const fn verbosity(&self) -> u8 {
        if self.quiet { 0 } else { self.verbose }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_seen: usize,
    pub files_stripped: usize,
    pub files_failed: usize,
    pub args_failed: usize,
}

impl RunSummary {
    pub const fn success(&self) -> bool {
        self.files_failed == 0 && self.args_failed == 0
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.files_seen += other.files_seen;
        self.files_stripped += other.files_stripped;
        self.files_failed += other.files_failed;
        self.args_failed += other.args_failed;
    }
}
