// contribution-adder CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod exit_code;
mod output;
mod run;

use exit_code::ExitCode;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "contribution-adder",
    version,
    about = "Create and push automated contribution commits"
)]
struct Cli {
    #[command(flatten)]
    args: run::RunArgs,
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() { ExitCode::Usage } else { ExitCode::Success }.into();
        }
    };
    init_tracing();

    let format = OutputFormat::detect(cli.args.json);
    match run::run(&cli.args) {
        Ok(summary) => match output::print_output(format, &summary, run::format_human) {
            Ok(()) => ExitCode::Success.into(),
            Err(error) => {
                output::print_error(format, "OUTPUT_ERROR", &error.to_string());
                ExitCode::Error.into()
            }
        },
        Err(error) => {
            output::print_anyhow_error(format, &error);
            ExitCode::from_error(&error).into()
        }
    }
}

fn init_tracing() {
    // Logs go to stderr; stdout carries the run summary.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
