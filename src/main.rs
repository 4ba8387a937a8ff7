use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};

mod backend;
mod cli;
mod config;
mod error;
mod logging;
mod proto;
mod report;
mod session;
mod signal;
mod stats;

use crate::{
    cli::{Cli, Cmd, ParseFailure},
    config::ControlConfig,
    report::{ErrorReport, Report},
    session::SessionStore,
    test::runner::TestController,
};

const EXIT_USAGE: u8 = 1;
/// Operational failures exit with -1 as seen by the shell.
const EXIT_FAILURE: u8 = 255;

const BAD_ARGS: &str = "Missing or invalid parameters";

fn main() -> ExitCode {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => return parse_failed(e),
    };
    let Some(cmd) = args.cmd else {
        cli::print_usage();
        return ExitCode::from(EXIT_USAGE);
    };

    if let Err(e) = logging::init(&args.control.log_level) {
        eprintln!("{e:#}");
        return bad_arguments();
    }
    let config = match ControlConfig::from_opts(&args.control) {
        Ok(c) => c,
        Err(e) => {
            error!("invalid configuration: {e:#}");
            return bad_arguments();
        }
    };

    let backend = config.build_backend();
    let session = SessionStore::new(&config.state_dir);
    if let Err(e) = signal::install(backend.clone(), session.clone()) {
        warn!("signal handler not installed: {e}");
    }

    let mut controller = TestController::new(backend.as_ref(), &session);
    let outcome = match cmd {
        Cmd::Start(opts) => controller.start(&opts).map(Report::Status),
        Cmd::Status => controller.status().map(Report::Status),
        Cmd::Stop => controller.stop().map(Report::Final),
    };

    let (doc, code) = match outcome {
        Ok(doc) => (doc, ExitCode::SUCCESS),
        Err(e) => {
            let doc = Report::Error(ErrorReport::new(&e));
            error!("{:#}", anyhow::Error::from(e));
            (doc, ExitCode::from(EXIT_FAILURE))
        }
    };
    if let Err(e) = report::emit(&doc) {
        error!("failed to write report: {e:#}");
        return ExitCode::from(EXIT_FAILURE);
    }
    code
}

fn parse_failed(err: clap::Error) -> ExitCode {
    match cli::classify(&err) {
        ParseFailure::Informational => err.exit(),
        ParseFailure::UnknownCommand => {
            cli::print_usage();
            ExitCode::from(EXIT_USAGE)
        }
        ParseFailure::BadArguments => {
            let _ = err.print();
            bad_arguments()
        }
    }
}

fn bad_arguments() -> ExitCode {
    if let Err(e) = report::emit(&Report::Error(ErrorReport::new(BAD_ARGS))) {
        eprintln!("failed to write report: {e:#}");
    }
    cli::print_usage();
    ExitCode::from(EXIT_USAGE)
}
