use std::process::ExitCode;

fn main() -> ExitCode {
    // Per-file failures are reported inside; only setup errors land here.
    match debom::cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
