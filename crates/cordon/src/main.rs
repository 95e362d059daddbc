use std::io::{self, BufWriter};
use std::process::ExitCode;

fn main() -> ExitCode {
    cordon::logging::init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    match cordon::play(stdin.lock(), BufWriter::new(stdout.lock())) {
        Ok(summary) => {
            tracing::info!(
                outcome = ?summary.outcome,
                turns = summary.metrics.turns,
                doses = summary.metrics.doses,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}
