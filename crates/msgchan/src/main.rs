mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use msgchan_frame::{FrameConfig, TextCodec, DEFAULT_MAX_FRAME_LEN};

use crate::cmd::{Command, Settings};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "msgchan", version, about = "Command/event message channel CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Text codec for message bodies (utf-8, ascii, latin-1).
    #[arg(
        long,
        value_name = "CODEC",
        env = "MSGCHAN_ENCODING",
        default_value = "utf-8",
        global = true
    )]
    encoding: TextCodec,

    /// Maximum message body size in bytes.
    #[arg(
        long,
        value_name = "BYTES",
        env = "MSGCHAN_MAX_FRAME",
        default_value_t = DEFAULT_MAX_FRAME_LEN,
        global = true
    )]
    max_frame: usize,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            format: self.format.unwrap_or_else(OutputFormat::default_for_stdout),
            frame: FrameConfig {
                max_frame_len: self.max_frame,
                codec: self.encoding,
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let settings = cli.settings();
    let result = cmd::run(cli.command, &settings);

    match result {
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
    fn parses_send_command() {
        let cli = Cli::try_parse_from([
            "msgchan",
            "send",
            "/tmp/test.sock",
            "--command",
            "go",
            "--wait",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.command.as_deref(), Some("go"));
                assert!(args.wait);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_message_args() {
        let err = Cli::try_parse_from([
            "msgchan",
            "send",
            "/tmp/test.sock",
            "--command",
            "go",
            "--event",
            "hi",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn send_requires_a_message() {
        let err = Cli::try_parse_from(["msgchan", "send", "/tmp/test.sock"])
            .expect_err("missing message should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn category_requires_payload() {
        let err = Cli::try_parse_from(["msgchan", "send", "/tmp/test.sock", "--category", "LOG"])
            .expect_err("category without payload should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_codec_and_frame_limit() {
        let cli = Cli::try_parse_from([
            "msgchan",
            "listen",
            "unix:/tmp/test.sock",
            "--encoding",
            "latin-1",
            "--max-frame",
            "1024",
            "--category",
            "CMD,EVT",
        ])
        .expect("listen args should parse");

        let settings = cli.settings();
        assert_eq!(settings.frame.codec, TextCodec::Latin1);
        assert_eq!(settings.frame.max_frame_len, 1024);
        match cli.command {
            Command::Listen(args) => {
                assert_eq!(
                    args.category,
                    Some(vec!["CMD".to_string(), "EVT".to_string()])
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_codec() {
        let err = Cli::try_parse_from([
            "msgchan",
            "--encoding",
            "ebcdic",
            "version",
        ])
        .expect_err("unknown codec should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
