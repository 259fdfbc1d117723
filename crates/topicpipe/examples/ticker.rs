//! Publish a short run of prices on one thread and print them on another.
//!
//! ```text
//! cargo run -p topicpipe --example ticker
//! ```

use std::thread;
use std::time::Duration;

use serde_json::json;
use topicpipe::{Channel, ChannelConfig, Received};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let outgoing = ChannelConfig::outgoing()
        .with_name("TICKER")
        .with_host("127.0.0.1")
        .with_port(0);
    let mut publisher = Channel::open_with_config(outgoing)?;
    let port = publisher.port();
    println!("publishing on {publisher}");

    let listener = thread::spawn(move || -> topicpipe::channel::Result<usize> {
        let incoming = ChannelConfig::incoming()
            .with_name("TICKER")
            .with_host("127.0.0.1")
            .with_port(port);
        let mut channel = Channel::open_with_config(incoming)?;
        let mut seen = 0;
        while let Received::Value(tick) = channel.receive_with_eof::<serde_json::Value>()? {
            println!("tick {seen}: {tick}");
            seen += 1;
        }
        Ok(seen)
    });

    if !publisher.wait_for_subscribers(1, Duration::from_secs(5))? {
        return Err("listener never connected".into());
    }

    let mut price = 100.0_f64;
    for step in 0..10 {
        price += if step % 3 == 0 { -0.25 } else { 0.5 };
        publisher.send(&json!({ "symbol": "ABC", "step": step, "price": price }))?;
    }
    publisher.close()?;

    let seen = listener
        .join()
        .map_err(|_| "listener thread panicked")??;
    println!("listener saw {seen} ticks before end of stream");
    Ok(())
}
