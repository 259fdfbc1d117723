use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ValueOutput<'a> {
    channel: &'a str,
    seq: usize,
    value: &'a Value,
    timestamp: String,
}

#[derive(Serialize)]
struct SendSummary<'a> {
    channel: &'a str,
    endpoint: &'a str,
    values: usize,
    bytes: usize,
}

pub fn print_value(channel: &str, seq: usize, value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ValueOutput {
                channel,
                seq,
                value,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "SEQ", "VALUE"])
                .add_row(vec![channel.to_string(), seq.to_string(), value.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("channel={channel} seq={seq} value={value}");
        }
        OutputFormat::Raw => {
            print_raw(&raw_text(value));
        }
    }
}

pub fn print_send_summary(
    channel: &str,
    endpoint: &str,
    values: usize,
    bytes: usize,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = SendSummary {
                channel,
                endpoint,
                values,
                bytes,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "ENDPOINT", "VALUES", "BYTES"])
                .add_row(vec![
                    channel.to_string(),
                    endpoint.to_string(),
                    values.to_string(),
                    bytes.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("channel={channel} endpoint={endpoint} values={values} bytes={bytes}");
        }
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(text: &str) {
    let mut out = std::io::stdout();
    let _ = writeln!(out, "{text}");
    let _ = out.flush();
}

/// Strings print bare; everything else as compact JSON.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
