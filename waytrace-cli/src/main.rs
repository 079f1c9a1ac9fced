//! Entry point for the `waytrace` binary.
#![forbid(unsafe_code)]

use std::process::ExitCode;

use waytrace_cli::CliError;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match waytrace_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        // Clap renders help, version and usage errors itself.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            log::debug!("{err:?}");
            #[expect(clippy::print_stderr, reason = "fatal errors are reported on stderr")]
            {
                eprintln!("waytrace: {err}");
            }
            ExitCode::FAILURE
        }
    }
}
