mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "topicpipe", version, about = "Named value streams over pub/sub")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_with_repeated_values() {
        let cli = Cli::try_parse_from([
            "topicpipe", "send", "TEST", "--json", "1", "--json", "[1,2]", "--port", "9000",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.name, "TEST");
                assert_eq!(args.json, vec!["1", "[1,2]"]);
                assert_eq!(args.endpoint.port, 9000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_mixed_payload_kinds() {
        let err = Cli::try_parse_from([
            "topicpipe", "send", "TEST", "--json", "1", "--data", "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn listen_defaults_to_standard_port() {
        let cli = Cli::try_parse_from(["topicpipe", "listen", "TEST"]).expect("listen args");
        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.endpoint.port, topicpipe::DEFAULT_PORT);
                assert!(args.endpoint.host.is_none());
                assert!(args.count.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_name_with_seed() {
        let cli = Cli::try_parse_from(["topicpipe", "name", "--seed", "7", "--count", "3"])
            .expect("name args should parse");
        assert!(matches!(cli.command, Command::Name(_)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "topicpipe", "version", "--log-level", "debug", "--format", "json",
        ])
        .expect("global flags should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
