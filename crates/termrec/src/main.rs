//! termrec: record an interactive shell session.

use std::process::ExitCode;

use termrec::{Cli, Command, EnvConfig, RecordConfig, RecordConfigBuilder, init_logging, record};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::parse_command(std::env::args_os()) {
        Ok(Command::Record(cli)) => cli,
        Ok(Command::Help) => {
            eprint!("{}", Cli::usage());
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    let config = match RecordConfig::from_env(&EnvConfig::default()) {
        Ok(config) => RecordConfigBuilder::from_config(config)
            .output(cli.output)
            .build(),
        Err(e) => {
            eprintln!("termrec: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("termrec: {e}");
        return ExitCode::FAILURE;
    }

    match record(&config).await {
        Ok(path) => {
            println!("Session recorded to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("termrec: {e}");
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}
