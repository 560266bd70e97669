use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use msgchan_channel::{Channel, ChannelListener, ProcessorBinding};
use msgchan_frame::{Message, COMMAND};
use msgchan_transport::{IpcStream, Transport};
use tracing::{info, warn};

use crate::cmd::{
    classify_recv_error, install_ctrlc_handler, parse_endpoint, EchoArgs, RecvErrorDisposition,
    Settings, POLL_TIMEOUT,
};
use crate::exit::{channel_error, CliResult, SUCCESS};

pub fn run(args: EchoArgs, settings: &Settings) -> CliResult<i32> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    let listener =
        ChannelListener::bind_with_config(&endpoint, settings.channel_config(Some(POLL_TIMEOUT)))
            .map_err(|err| channel_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    while running.load(Ordering::SeqCst) {
        let mut channel = listener
            .accept()
            .map_err(|err| channel_error("accept failed", err))?;
        channel.set_processor(ProcessorBinding::from_fn(echo_job::<IpcStream>));

        while running.load(Ordering::SeqCst) {
            if let Err(err) = channel.receive() {
                match classify_recv_error(err) {
                    RecvErrorDisposition::Break => break,
                    RecvErrorDisposition::Fatal(cli_err) => return Err(cli_err),
                }
            }
            if let Err(err) = channel.dispatch_pending() {
                warn!(error = %err, "echo reply failed");
                break;
            }
        }
    }

    Ok(SUCCESS)
}

/// Answer commands with an `OK` carrying the same payload; log everything else.
fn echo_job<T: Transport>(channel: &mut Channel<T>, message: Message) -> msgchan_channel::Result<()> {
    if message.category() == COMMAND {
        info!(
            serial = message.serial(),
            payload = message.payload(),
            "echoing command"
        );
        return channel.send_result(message.serial(), message.payload());
    }
    info!(
        category = message.category(),
        serial = message.serial(),
        payload = message.payload(),
        "received message"
    );
    Ok(())
}
