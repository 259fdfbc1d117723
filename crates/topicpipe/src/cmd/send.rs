use std::io::{self, BufRead};

use serde_json::Value;
use topicpipe::{Channel, Direction};
use tracing::{debug, info};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{
    channel_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{print_send_summary, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let literals = parse_literals(&args)?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;

    let config = args.endpoint.channel_config(Direction::Outgoing, &args.name);
    let mut channel =
        Channel::open_with_config(config).map_err(|err| channel_error("open failed", err))?;
    info!(channel = %channel, "publishing");

    if let Some(count) = args.wait_subscribers {
        let reached = channel
            .wait_for_subscribers(count, wait_timeout)
            .map_err(|err| channel_error("wait failed", err))?;
        if !reached {
            return Err(CliError::new(
                TIMEOUT,
                format!(
                    "timed out after {wait_timeout:?} waiting for {count} listener(s) on {}",
                    channel.endpoint()
                ),
            ));
        }
    }

    let mut values = 0usize;
    let mut bytes = 0usize;
    match literals {
        Some(literals) => {
            for value in &literals {
                bytes += send_one(&mut channel, value)?;
                values += 1;
            }
        }
        None => {
            let stdin = io::stdin();
            for (index, line) in stdin.lock().lines().enumerate() {
                let line = line.map_err(|err| io_error("stdin read failed", err))?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line).map_err(|err| {
                    CliError::new(
                        DATA_INVALID,
                        format!("stdin line {}: invalid JSON: {err}", index + 1),
                    )
                })?;
                bytes += send_one(&mut channel, &value)?;
                values += 1;
            }
        }
    }

    let endpoint = channel.endpoint().to_string();
    channel
        .close()
        .map_err(|err| channel_error("close failed", err))?;

    print_send_summary(channel.name(), &endpoint, values, bytes, format);
    Ok(SUCCESS)
}

/// `None` means values come from stdin.
fn parse_literals(args: &SendArgs) -> CliResult<Option<Vec<Value>>> {
    if !args.json.is_empty() {
        let values = args
            .json
            .iter()
            .map(|text| {
                serde_json::from_str(text).map_err(|err| {
                    CliError::new(USAGE, format!("invalid --json value {text:?}: {err}"))
                })
            })
            .collect::<CliResult<Vec<Value>>>()?;
        return Ok(Some(values));
    }

    if !args.data.is_empty() {
        return Ok(Some(args.data.iter().cloned().map(Value::String).collect()));
    }

    Ok(None)
}

fn send_one(channel: &mut Channel, value: &Value) -> CliResult<usize> {
    let size = channel
        .send(value)
        .map_err(|err| channel_error("send failed", err))?;
    debug!(name = channel.name(), size, "value sent");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cmd::EndpointArgs;

    fn args(json: &[&str], data: &[&str]) -> SendArgs {
        SendArgs {
            name: "TEST".to_string(),
            endpoint: EndpointArgs {
                host: None,
                port: 0,
            },
            json: json.iter().map(|s| s.to_string()).collect(),
            data: data.iter().map(|s| s.to_string()).collect(),
            wait_subscribers: None,
            wait_timeout: "5s".to_string(),
        }
    }

    #[test]
    fn json_literals_are_parsed() {
        let values = parse_literals(&args(&["1", "\"hello\"", "[1,2,3]"], &[]))
            .unwrap()
            .unwrap();
        assert_eq!(values, vec![json!(1), json!("hello"), json!([1, 2, 3])]);
    }

    #[test]
    fn data_values_are_strings() {
        let values = parse_literals(&args(&[], &["1", "two"])).unwrap().unwrap();
        assert_eq!(values, vec![json!("1"), json!("two")]);
    }

    #[test]
    fn invalid_json_literal_is_usage_error() {
        let err = parse_literals(&args(&["{not json"], &[])).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn no_literals_means_stdin() {
        assert!(parse_literals(&args(&[], &[])).unwrap().is_none());
    }
}
