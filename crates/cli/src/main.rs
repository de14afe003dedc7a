use std::{io, process::ExitCode};

use clap::Parser;
use schwab::SchwabEndpoints;
use schwab_token::{
    diagnostics::{exit_code, report_failure, report_success},
    logging::init_logging,
    run, Args, Invocation,
};
use tracing::error;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let invocation = Invocation::from_args(&args, process_env);
    let result = run(invocation, SchwabEndpoints::default(), process_env).await;

    let reported = match &result {
        Ok(outcome) => report_success(&mut io::stdout(), outcome),
        Err(err) => report_failure(&mut io::stderr(), err),
    };
    if let Err(e) = reported {
        error!(error = %e, "failed to print the result");
    }

    ExitCode::from(exit_code(&result))
}
