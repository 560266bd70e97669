use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand};
use msgchan_channel::{ChannelConfig, ChannelError};
use msgchan_frame::FrameConfig;
use msgchan_transport::Endpoint;

use tracing::warn;

use crate::exit::{channel_error, transport_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod send;
pub mod version;

/// Read timeout for server loops, so Ctrl-C is noticed between reads.
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer every command with an OK carrying the same payload.
    Echo(EchoArgs),
    /// Send a single message.
    Send(SendArgs),
    /// Listen and print received messages.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Options shared by every subcommand that opens a channel.
#[derive(Debug, Clone)]
pub struct Settings {
    pub format: OutputFormat,
    pub frame: FrameConfig,
}

impl Settings {
    pub fn channel_config(&self, read_timeout: Option<Duration>) -> ChannelConfig {
        ChannelConfig {
            frame: self.frame.clone(),
            read_timeout,
            ..ChannelConfig::default()
        }
    }
}

pub fn run(command: Command, settings: &Settings) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args, settings),
        Command::Send(args) => send::run(args, settings),
        Command::Listen(args) => listen::run(args, settings),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Endpoint to bind (`unix:PATH`, `tcp:HOST:PORT`, or a socket path).
    pub endpoint: String,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("message")
        .required(true)
        .args(["command", "event", "category"]),
))]
pub struct SendArgs {
    /// Endpoint to connect to (`unix:PATH`, `tcp:HOST:PORT`, or a socket path).
    pub endpoint: String,
    /// Send a command (CMD) with a fresh serial number.
    #[arg(long)]
    pub command: Option<String>,
    /// Send an event (EVT) with a fresh serial number.
    #[arg(long)]
    pub event: Option<String>,
    /// Send under an arbitrary category.
    #[arg(long, requires = "payload")]
    pub category: Option<String>,
    /// Payload for --category.
    #[arg(long, requires = "category")]
    pub payload: Option<String>,
    /// Explicit serial number for --category (default: allocate one).
    #[arg(long, requires = "category")]
    pub serial: Option<u64>,
    /// Wait for the OK/ERR reply carrying the sent serial and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Endpoint to bind (`unix:PATH`, `tcp:HOST:PORT`, or a socket path).
    pub endpoint: String,
    /// Only print messages with these categories (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub category: Option<Vec<String>>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_endpoint(input: &str) -> CliResult<Endpoint> {
    Endpoint::parse(input).map_err(|err| transport_error("invalid endpoint", err))
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// What a server loop does after a failed receive.
pub(crate) enum RecvErrorDisposition {
    /// End this peer's session and accept the next one.
    Break,
    Fatal(CliError),
}

/// A misbehaving or departed peer ends its session; the server keeps running.
pub(crate) fn classify_recv_error(err: ChannelError) -> RecvErrorDisposition {
    if matches!(err, ChannelError::Disconnected) {
        return RecvErrorDisposition::Break;
    }
    if err.is_framing() {
        warn!(error = %err, "dropping peer after framing error");
        return RecvErrorDisposition::Break;
    }
    RecvErrorDisposition::Fatal(channel_error("receive failed", err))
}
