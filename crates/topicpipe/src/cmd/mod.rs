use std::time::Duration;

use clap::{Args, Subcommand};
use topicpipe::{ChannelConfig, Direction, DEFAULT_PORT};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod name;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish values on a channel, then signal end-of-stream.
    Send(SendArgs),
    /// Print values received on a channel until end-of-stream.
    Listen(ListenArgs),
    /// Generate channel names.
    Name(NameArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Name(args) => name::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EndpointArgs {
    /// Host to bind (send, default `*`) or connect to (listen, default `localhost`).
    #[arg(long, env = "TOPICPIPE_HOST")]
    pub host: Option<String>,
    /// TCP port.
    #[arg(long, short = 'p', env = "TOPICPIPE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl EndpointArgs {
    pub fn channel_config(&self, direction: Direction, name: &str) -> ChannelConfig {
        let mut config = ChannelConfig::new(direction)
            .with_name(name)
            .with_port(self.port);
        config.host = self.host.clone();
        config
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Channel name (alphanumeric).
    pub name: String,
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// JSON value to send; repeat for several. Reads JSON lines from stdin
    /// when neither --json nor --data is given.
    #[arg(long, conflicts_with = "data")]
    pub json: Vec<String>,
    /// String value to send; repeat for several.
    #[arg(long, conflicts_with = "json")]
    pub data: Vec<String>,
    /// Wait until this many listeners are connected before sending.
    #[arg(long, value_name = "N")]
    pub wait_subscribers: Option<usize>,
    /// Maximum time to wait for listeners (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Channel name (alphanumeric).
    pub name: String,
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Exit after receiving N values.
    #[arg(long)]
    pub count: Option<usize>,
    /// Connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Seed for reproducible names.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Number of names to generate.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration(" ").is_err());
    }

    #[test]
    fn endpoint_args_build_config() {
        let args = EndpointArgs {
            host: None,
            port: 9100,
        };
        let config = args.channel_config(Direction::Incoming, "TEST");
        assert_eq!(config.name.as_deref(), Some("TEST"));
        assert_eq!(config.resolved_host(), "localhost");
        assert_eq!(config.port, 9100);
    }
}
