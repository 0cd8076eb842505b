use docker_workbench::cli::{Args, Runner};
use docker_workbench::logging::{Logger, init_tracing};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();
    init_tracing(args.verbose);
    let quiet = args.quiet;

    let result = match Runner::new(args) {
        Ok(runner) => runner.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // Dismissing a prompt is not a failure
        Err(e) if e.is_cancelled() => {
            tracing::debug!(reason = %e, "command cancelled");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let logger = if quiet { Logger::new_quiet() } else { Logger::default() };
            logger.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
