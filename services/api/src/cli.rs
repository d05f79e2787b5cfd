use crate::demo::{run_demo, run_message, DemoArgs, MessageArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use motor_norm::error::AppError;
use motor_norm::norms::Operation;

#[derive(Parser, Debug)]
#[command(
    name = "Motor Norm Interchange",
    about = "Serve and exercise the motor-insurance norm interchange from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a tariff request file through the pipeline and print the reply
    Quote(MessageArgs),
    /// Run a claim notification file through the pipeline and print the reply
    Reserve(MessageArgs),
    /// Send a sample message of every standard through the interchange
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_message(Operation::Tariff, args),
        Command::Reserve(args) => run_message(Operation::Reserve, args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motor_norm::norms::NormStandard;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["motor-norm-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn quote_takes_a_standard_and_a_file() {
        let cli = Cli::try_parse_from([
            "motor-norm-api",
            "quote",
            "--standard",
            "sivi-afs",
            "--file",
            "offerte.json",
        ])
        .expect("parses");
        let Some(Command::Quote(args)) = cli.command else {
            panic!("expected quote command");
        };
        assert_eq!(args.standard, NormStandard::SiviAfs);
        assert_eq!(args.file.to_str(), Some("offerte.json"));
        assert!(args.norm_version.is_none());
    }

    #[test]
    fn unknown_standards_are_rejected_by_the_parser() {
        let result = Cli::try_parse_from([
            "motor-norm-api",
            "reserve",
            "--standard",
            "acord",
            "--file",
            "claim.xml",
        ]);
        assert!(result.is_err());
    }
}
