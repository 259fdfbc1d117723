use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use topicpipe::channel::is_disconnect;
use topicpipe::transport::TransportError;
use topicpipe::{Channel, ChannelError, Direction, Received};
use tracing::{info, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{channel_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_value, OutputFormat};

/// How often a blocked receive wakes up to check for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let connect_timeout = parse_duration(&args.connect_timeout)?;
    let config = args
        .endpoint
        .channel_config(Direction::Incoming, &args.name)
        .with_connect_timeout(connect_timeout);

    let mut channel =
        Channel::open_with_config(config).map_err(|err| channel_error("connect failed", err))?;
    channel
        .set_receive_timeout(Some(POLL_INTERVAL))
        .map_err(|err| channel_error("connect failed", err))?;
    info!(channel = %channel, "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| printed >= count) {
            return Ok(SUCCESS);
        }

        match channel.receive_with_eof::<Value>() {
            Ok(Received::Value(value)) => {
                print_value(channel.name(), printed, &value, format);
                printed = printed.saturating_add(1);
            }
            Ok(Received::EndOfStream) => {
                info!(name = channel.name(), received = printed, "end of stream");
                return Ok(SUCCESS);
            }
            Err(err) if is_poll_timeout(&err) => {}
            Err(ChannelError::Codec(err)) => {
                warn!(name = channel.name(), error = %err, "skipping undecodable value");
            }
            Err(err) if is_disconnect(&err) => {
                return Err(CliError::new(
                    FAILURE,
                    format!(
                        "publisher on {} went away before end of stream",
                        channel.endpoint()
                    ),
                ));
            }
            Err(err) => return Err(channel_error("receive failed", err)),
        }
    }

    info!(name = channel.name(), received = printed, "interrupted");
    Ok(SUCCESS)
}

fn is_poll_timeout(err: &ChannelError) -> bool {
    matches!(
        err,
        ChannelError::Transport(TransportError::Io(io))
            if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
    )
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
