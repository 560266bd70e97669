use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use msgchan_frame::{Message, COMMAND, ERROR, EVENT, RESULT};
use serde::Serialize;

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
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    category: &'a str,
    kind: &'a str,
    serial: u64,
    payload: &'a str,
    payload_size: usize,
    peer: &'a str,
    timestamp: String,
}

pub fn print_message(message: &Message, peer: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                category: message.category(),
                kind: category_kind(message.category()),
                serial: message.serial(),
                payload: message.payload(),
                payload_size: message.payload().len(),
                peer,
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
                .set_header(vec!["CATEGORY", "SERIAL", "PEER", "PAYLOAD"])
                .add_row(vec![
                    message.category().to_string(),
                    message.serial().to_string(),
                    peer.to_string(),
                    message.payload().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "category={} ({}) serial={} peer={} payload={}",
                message.category(),
                category_kind(message.category()),
                message.serial(),
                peer,
                message.payload()
            );
        }
        OutputFormat::Raw => print_raw(message.payload()),
    }
}

pub fn print_raw(text: &str) {
    let mut out = std::io::stdout();
    let _ = writeln!(out, "{text}");
    let _ = out.flush();
}

pub fn category_kind(category: &str) -> &'static str {
    match category {
        COMMAND => "command",
        EVENT => "event",
        RESULT => "result",
        ERROR => "error",
        _ => "user",
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
