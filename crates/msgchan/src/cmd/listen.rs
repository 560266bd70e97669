use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use msgchan_channel::ChannelListener;
use msgchan_frame::Message;

use crate::cmd::{
    classify_recv_error, install_ctrlc_handler, parse_endpoint, ListenArgs, RecvErrorDisposition,
    Settings, POLL_TIMEOUT,
};
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::print_message;

pub fn run(args: ListenArgs, settings: &Settings) -> CliResult<i32> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    let listener =
        ChannelListener::bind_with_config(&endpoint, settings.channel_config(Some(POLL_TIMEOUT)))
            .map_err(|err| channel_error("bind failed", err))?;
    let peer = listener.local_endpoint().to_string();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut channel = listener
            .accept()
            .map_err(|err| channel_error("accept failed", err))?;

        while running.load(Ordering::SeqCst) {
            if let Err(err) = channel.receive() {
                match classify_recv_error(err) {
                    RecvErrorDisposition::Break => break,
                    RecvErrorDisposition::Fatal(cli_err) => return Err(cli_err),
                }
            }

            while let Some(message) = channel.pop() {
                if !wanted(&message, args.category.as_deref()) {
                    continue;
                }

                print_message(&message, &peer, settings.format);
                printed = printed.saturating_add(1);

                if let Some(count) = args.count {
                    if printed >= count {
                        return Ok(SUCCESS);
                    }
                }
            }
        }
    }

    Ok(SUCCESS)
}

fn wanted(message: &Message, categories: Option<&[String]>) -> bool {
    match categories {
        Some(categories) => categories.iter().any(|c| c == message.category()),
        None => true,
    }
}
