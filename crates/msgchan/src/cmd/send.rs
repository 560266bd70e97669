use std::time::Duration;

use msgchan_channel::{connect_with_config, Channel};
use msgchan_frame::ERROR;
use msgchan_transport::Transport;
use tracing::{debug, info};

use crate::cmd::{parse_endpoint, SendArgs, Settings};
use crate::exit::{channel_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::print_message;

/// Socket read timeout while waiting for a reply.
const REPLY_READ_TIMEOUT: Duration = Duration::from_millis(100);

pub fn run(args: SendArgs, settings: &Settings) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let endpoint = parse_endpoint(&args.endpoint)?;

    let config = settings.channel_config(Some(REPLY_READ_TIMEOUT));
    let mut channel = connect_with_config(&endpoint, config)
        .map_err(|err| channel_error("connect failed", err))?;

    let serial =
        send_message(&mut channel, &args).map_err(|err| channel_error("send failed", err))?;
    info!(%endpoint, serial, "message sent");

    let mut code = SUCCESS;
    if args.wait {
        let reply = channel
            .wait_reply(serial, wait_timeout)
            .map_err(|err| channel_error("wait failed", err))?;
        print_message(&reply, &endpoint.to_string(), settings.format);
        if reply.category() == ERROR {
            code = FAILURE;
        }
    }

    if let Err(err) = channel.close() {
        debug!(error = %err, "close failed");
    }
    Ok(code)
}

/// Send the message selected on the command line; returns its serial.
fn send_message<T: Transport>(
    channel: &mut Channel<T>,
    args: &SendArgs,
) -> msgchan_channel::Result<u64> {
    if let Some(command) = &args.command {
        return channel.send_command(command);
    }
    if let Some(event) = &args.event {
        return channel.send_event(event);
    }

    let category = args.category.as_deref().unwrap_or_default();
    let payload = args.payload.as_deref().unwrap_or_default();
    match args.serial {
        Some(serial) => channel
            .send_format(category, serial, payload)
            .map(|()| serial),
        None => channel.send_serial(category, payload),
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
