//! Minimal echo peer: accepts one connection and answers every command with
//! an `OK` carrying the same payload.
//!
//! Run with:
//!   cargo run --example echo-peer
//!
//! In another terminal:
//!   cargo run --features cli -- send /tmp/msgchan-echo-<pid>/echo.sock \
//!     --command hello --wait

use std::fs;
use std::time::Duration;

use msgchan::channel::{Channel, ChannelConfig, ChannelError, ChannelListener, ProcessorBinding};
use msgchan::frame::{Message, COMMAND};
use msgchan::transport::{Endpoint, IpcStream};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_dir = std::env::temp_dir().join(format!("msgchan-echo-{}", std::process::id()));
    fs::create_dir_all(&sock_dir)?;
    let endpoint = Endpoint::unix(sock_dir.join("echo.sock"));

    let config = ChannelConfig {
        read_timeout: Some(Duration::from_millis(200)),
        ..ChannelConfig::default()
    };
    let listener = ChannelListener::bind_with_config(&endpoint, config)?;
    eprintln!("Listening on {}", listener.local_endpoint());

    let mut channel = listener.accept()?;
    channel.set_processor(ProcessorBinding::from_fn(
        |channel: &mut Channel<IpcStream>, message: Message| {
            eprintln!("Received {message}");
            if message.category() == COMMAND {
                channel.send_result(message.serial(), message.payload())?;
            }
            Ok(())
        },
    ));

    loop {
        match channel.receive() {
            Ok(_) => {
                channel.dispatch_pending()?;
            }
            Err(ChannelError::Disconnected) => {
                eprintln!("Peer disconnected");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    drop(listener);
    let _ = fs::remove_dir_all(&sock_dir);
    Ok(())
}
