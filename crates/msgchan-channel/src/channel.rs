use std::fmt;
use std::time::{Duration, Instant};

use msgchan_frame::{
    FrameDecoder, FrameEncoder, Message, SerialAllocator, TextCodec, COMMAND, ERROR, EVENT,
    RESULT,
};
use msgchan_transport::Transport;
use tracing::{debug, trace, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::processor::ProcessorBinding;
use crate::queue::JobQueue;

const REPLY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A bidirectional message channel bound to one transport.
///
/// Outbound, the channel allocates serial numbers for commands and events
/// and frames every message before writing it. Inbound,
/// [`receive`](Self::receive) drains whatever the transport has ready,
/// decodes every complete frame into the job queue, and keeps any trailing
/// partial frame for the next call. Nothing is processed until the owner
/// calls [`dispatch_next`](Self::dispatch_next) or
/// [`dispatch_pending`](Self::dispatch_pending).
///
/// A framing violation from the peer, a transport failure, or a full job
/// queue closes the channel; the error is returned to the caller. Send
/// contract violations (bad category, unencodable text, oversized body)
/// write nothing and leave the channel open.
pub struct Channel<T: Transport> {
    io: T,
    encoder: FrameEncoder,
    decoder: FrameDecoder,
    jobs: JobQueue,
    serials: SerialAllocator,
    processor: ProcessorBinding<T>,
    processor_generation: u64,
    config: ChannelConfig,
    closed: bool,
}

impl<T: Transport> Channel<T> {
    /// Bind a channel to `io` with default configuration.
    pub fn new(io: T) -> Self {
        Self::with_config(io, ChannelConfig::default())
    }

    /// Bind a channel to `io`.
    pub fn with_config(io: T, config: ChannelConfig) -> Self {
        let jobs = match config.max_pending_jobs {
            Some(capacity) => JobQueue::bounded(capacity),
            None => JobQueue::new(),
        };
        Self {
            io,
            encoder: FrameEncoder::with_config(config.frame.clone()),
            decoder: FrameDecoder::with_config(config.frame.clone()),
            jobs,
            serials: SerialAllocator::new(),
            processor: ProcessorBinding::Diagnostic,
            processor_generation: 0,
            config,
            closed: false,
        }
    }

    /// Send a command; returns its serial number.
    pub fn send_command(&mut self, command: &str) -> Result<u64> {
        self.send_serial(COMMAND, command)
    }

    /// Send an event; returns its serial number.
    pub fn send_event(&mut self, event: &str) -> Result<u64> {
        self.send_serial(EVENT, event)
    }

    /// Reply to command `serial` with a result.
    pub fn send_result(&mut self, serial: u64, value: &str) -> Result<()> {
        self.send_format(RESULT, serial, value)
    }

    /// Reply to command `serial` with an error.
    pub fn send_error(&mut self, serial: u64, message: &str) -> Result<()> {
        self.send_format(ERROR, serial, message)
    }

    /// Send under a freshly allocated serial number and return it.
    ///
    /// A serial is consumed once any byte may have reached the transport.
    /// Contract violations and sends on a closed channel leave the counter
    /// untouched.
    pub fn send_serial(&mut self, category: &str, payload: &str) -> Result<u64> {
        let serial = self.serials.peek()?;
        let result = self.send_format(category, serial, payload);
        let nothing_written = matches!(&result, Err(err) if err.is_contract())
            || matches!(&result, Err(ChannelError::Closed));
        if !nothing_written {
            self.serials.next()?;
        }
        result.map(|()| serial)
    }

    /// Send one frame with an explicit serial number.
    pub fn send_format(&mut self, category: &str, serial: u64, payload: &str) -> Result<()> {
        self.ensure_open()?;
        match self.encoder.send(&mut self.io, category, serial, payload) {
            Ok(()) => {
                debug!(category, serial, "sent message");
                Ok(())
            }
            Err(err) => {
                let err = ChannelError::from(err);
                if !err.is_contract() {
                    // A frame may be half written; the stream is unusable.
                    warn!(error = %err, "send failed, closing channel");
                    self.shutdown();
                }
                Err(err)
            }
        }
    }

    /// Drain the transport and queue every complete message.
    ///
    /// Returns the number of messages queued by this call; 0 when nothing
    /// complete arrived. Reading end-of-stream before any byte closes the
    /// channel and yields [`ChannelError::Disconnected`].
    pub fn receive(&mut self) -> Result<usize> {
        self.ensure_open()?;
        match self.receive_inner() {
            Ok(count) => Ok(count),
            Err(ChannelError::Disconnected) => {
                debug!("peer closed the stream");
                self.shutdown();
                Err(ChannelError::Disconnected)
            }
            Err(err) => {
                warn!(error = %err, "receive failed, closing channel");
                self.shutdown();
                Err(err)
            }
        }
    }

    fn receive_inner(&mut self) -> Result<usize> {
        let fill = self.decoder.fill_from(&mut self.io)?;
        if fill.eof && fill.bytes == 0 {
            return Err(ChannelError::Disconnected);
        }

        let mut queued = 0;
        while let Some(message) = self.decoder.decode()? {
            trace!(
                category = message.category(),
                serial = message.serial(),
                "queued message"
            );
            self.jobs.push(message)?;
            queued += 1;
        }
        self.decoder.compact();
        Ok(queued)
    }

    /// Receive until the `OK`/`ERR` reply to `serial` is queued, then take it.
    ///
    /// Every other message stays queued in arrival order. The transport must
    /// not block indefinitely: use a non-blocking stream or set a read
    /// timeout.
    pub fn wait_reply(&mut self, serial: u64, timeout: Duration) -> Result<Message> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(reply) = self.jobs.take_reply(serial) {
                return Ok(reply);
            }
            if Instant::now() >= deadline {
                return Err(ChannelError::Timeout(timeout));
            }
            if self.receive()? == 0 {
                std::thread::sleep(REPLY_POLL_INTERVAL);
            }
        }
    }

    /// Remove and return the oldest queued job.
    pub fn pop(&mut self) -> Option<Message> {
        self.jobs.pop()
    }

    pub fn has_pending(&self) -> bool {
        self.jobs.has_pending()
    }

    pub fn pending_len(&self) -> usize {
        self.jobs.len()
    }

    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }

    /// Pop the oldest job and hand it to the attached processor.
    ///
    /// Returns `Ok(false)` when the queue is empty. While the processor runs
    /// the channel reports a diagnostic binding; if the processor installs a
    /// replacement, the replacement is kept.
    pub fn dispatch_next(&mut self) -> Result<bool> {
        let Some(message) = self.jobs.pop() else {
            return Ok(false);
        };
        let generation = self.processor_generation;
        let mut binding = std::mem::take(&mut self.processor);
        let result = binding.process(self, message);
        if self.processor_generation == generation {
            self.processor = binding;
        }
        result.map(|()| true)
    }

    /// Dispatch until the queue is empty; returns the number dispatched.
    ///
    /// Stops at the first processor error, leaving later jobs queued.
    pub fn dispatch_pending(&mut self) -> Result<usize> {
        let mut dispatched = 0;
        while self.dispatch_next()? {
            dispatched += 1;
        }
        Ok(dispatched)
    }

    pub fn processor(&self) -> &ProcessorBinding<T> {
        &self.processor
    }

    /// Replace the attached processor.
    pub fn set_processor(&mut self, binding: ProcessorBinding<T>) {
        self.processor = binding;
        self.processor_generation = self.processor_generation.wrapping_add(1);
    }

    /// Text codec used in both directions.
    pub fn codec(&self) -> TextCodec {
        self.encoder.codec()
    }

    /// Change the text codec for both directions. Bytes already buffered
    /// but not yet decoded are decoded with the new codec.
    pub fn set_codec(&mut self, codec: TextCodec) {
        self.encoder.set_codec(codec);
        self.decoder.set_codec(codec);
        self.config.frame.codec = codec;
    }

    /// Most recently allocated serial number, 0 before the first send.
    pub fn last_serial(&self) -> u64 {
        self.serials.last()
    }

    /// Close the transport. Queued jobs remain available.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.io.close()?;
        debug!("channel closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.io
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.io
    }

    /// Unbind and return the transport.
    pub fn into_inner(self) -> T {
        self.io
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Err(err) = self.close() {
            debug!(error = %err, "transport close failed");
        }
    }
}

impl<T: Transport> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("codec", &self.codec())
            .field("pending", &self.jobs.len())
            .field("last_serial", &self.serials.last())
            .field("processor", &self.processor)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use msgchan_frame::{FrameConfig, FrameError, ParseState};
    use msgchan_transport::MemoryStream;

    use super::*;

    fn pair() -> (Channel<MemoryStream>, MemoryStream) {
        let (local, remote) = MemoryStream::pair();
        (Channel::new(local), remote)
    }

    fn malformed_reason(err: &ChannelError) -> Option<&'static str> {
        match err {
            ChannelError::Frame(FrameError::Malformed { reason }) => Some(*reason),
            _ => None,
        }
    }

    #[test]
    fn first_command_uses_serial_one() {
        let (mut channel, remote) = pair();
        assert_eq!(channel.send_command("go").unwrap(), 1);
        assert_eq!(remote.take_pending(), b"@8:CMD:1:go");
        assert_eq!(channel.last_serial(), 1);
    }

    #[test]
    fn events_and_commands_share_the_counter() {
        let (mut channel, remote) = pair();
        assert_eq!(channel.send_event("tick").unwrap(), 1);
        assert_eq!(channel.send_command("go").unwrap(), 2);
        assert_eq!(channel.send_serial("LOG", "hello").unwrap(), 3);
        assert_eq!(
            remote.take_pending(),
            b"@10:EVT:1:tick@8:CMD:2:go@11:LOG:3:hello"
        );
    }

    #[test]
    fn replies_reuse_the_given_serial() {
        let (mut channel, remote) = pair();
        channel.send_result(10, "done").unwrap();
        channel.send_error(11, "nope").unwrap();
        assert_eq!(remote.take_pending(), b"@10:OK:10:done@11:ERR:11:nope");
        assert_eq!(channel.last_serial(), 0);
    }

    #[test]
    fn contract_violation_writes_nothing_and_keeps_serial() {
        let (mut channel, remote) = pair();
        let err = channel.send_serial("A:B", "x").unwrap_err();
        assert!(err.is_contract());
        let err = channel.send_format("", 1, "x").unwrap_err();
        assert!(err.is_contract());
        assert!(remote.take_pending().is_empty());
        assert!(!channel.is_closed());

        assert_eq!(channel.send_command("go").unwrap(), 1);
    }

    #[test]
    fn oversized_send_is_rejected() {
        let (local, remote) = MemoryStream::pair();
        let config = ChannelConfig {
            frame: FrameConfig {
                max_frame_len: 8,
                ..FrameConfig::default()
            },
            ..ChannelConfig::default()
        };
        let mut channel = Channel::with_config(local, config);
        assert!(channel.send_command("this is too long").unwrap_err().is_contract());
        assert_eq!(channel.send_command("go").unwrap(), 1);
        assert_eq!(remote.take_pending(), b"@8:CMD:1:go");
    }

    #[test]
    fn receives_two_frames_from_one_read() {
        let (mut channel, remote) = pair();
        let _ = remote;
        channel.transport().inject(b"@11:EVT:1:hello@8:CMD:2:go");

        assert_eq!(channel.receive().unwrap(), 2);
        assert_eq!(channel.pop(), Some(Message::new("EVT", 1, "hello")));
        assert_eq!(channel.pop(), Some(Message::new("CMD", 2, "go")));
        assert_eq!(channel.pop(), None);
    }

    #[test]
    fn event_then_command_arrive_in_one_receive() {
        let (a, b) = MemoryStream::pair();
        let mut sender = Channel::new(a);
        let mut receiver = Channel::new(b);

        assert_eq!(sender.send_event("hi").unwrap(), 1);
        assert_eq!(sender.send_command("go").unwrap(), 2);
        assert_eq!(receiver.transport().available(), 22);

        assert_eq!(receiver.receive().unwrap(), 2);
        assert_eq!(receiver.pop(), Some(Message::new("EVT", 1, "hi")));
        assert_eq!(receiver.pop(), Some(Message::new("CMD", 2, "go")));
        assert_eq!(receiver.pop(), None);
    }

    #[test]
    fn three_byte_reads_deliver_the_same_messages() {
        let (a, b) = MemoryStream::pair();
        let mut sender = Channel::new(a);
        let mut receiver = Channel::new(b.with_max_read(3));

        sender.send_event("hi").unwrap();
        sender.send_command("go").unwrap();

        let mut receives = 0;
        while receiver.pending_len() < 2 {
            receiver.receive().unwrap();
            receives += 1;
            assert!(receives <= 22, "no progress after {receives} receives");
        }
        assert!(receives > 1);
        assert_eq!(receiver.pop(), Some(Message::new("EVT", 1, "hi")));
        assert_eq!(receiver.pop(), Some(Message::new("CMD", 2, "go")));
        assert_eq!(receiver.transport().available(), 0);
    }

    #[test]
    fn zero_padded_header_flood_closes_the_channel() {
        let (local, _remote) = MemoryStream::pair();
        let config = ChannelConfig {
            frame: FrameConfig {
                max_frame_len: 16,
                ..FrameConfig::default()
            },
            ..ChannelConfig::default()
        };
        let mut channel = Channel::with_config(local, config);
        channel.transport().inject(b"@");
        channel.transport().inject(&[b'0'; 4096]);
        let err = channel.receive().unwrap_err();
        assert_eq!(malformed_reason(&err), Some("header too long"));
        assert!(channel.is_closed());
    }

    #[test]
    fn reassembles_fragments_across_receives() {
        let (mut channel, _remote) = pair();
        let io = channel.transport().clone();

        io.inject(b"@1");
        assert_eq!(channel.receive().unwrap(), 0);
        io.inject(b"0:OK:3");
        assert_eq!(channel.receive().unwrap(), 0);
        io.inject(b"0:done");
        assert_eq!(channel.receive().unwrap(), 1);
        assert_eq!(channel.pop(), Some(Message::new("OK", 30, "done")));
    }

    #[test]
    fn partial_body_waits_for_the_rest() {
        let (mut channel, _remote) = pair();
        let io = channel.transport().clone();

        io.inject(b"@8:CMD");
        assert_eq!(channel.receive().unwrap(), 0);
        assert!(!channel.has_pending());
        io.inject(b":1:go@6:EVT:2:");
        assert_eq!(channel.receive().unwrap(), 2);
        assert_eq!(channel.pop(), Some(Message::new("CMD", 1, "go")));
        assert_eq!(channel.pop(), Some(Message::new("EVT", 2, "")));
    }

    #[test]
    fn empty_transport_queues_nothing() {
        let (mut channel, _remote) = pair();
        assert_eq!(channel.receive().unwrap(), 0);
        assert!(!channel.is_closed());
    }

    #[test]
    fn paired_channels_talk_to_each_other() {
        let (a, b) = MemoryStream::pair();
        let mut client = Channel::new(a);
        let mut server = Channel::new(b);

        let serial = client.send_command("ping").unwrap();
        assert_eq!(server.receive().unwrap(), 1);
        let job = server.pop().unwrap();
        assert_eq!(job, Message::new("CMD", serial, "ping"));
        server.send_result(job.serial(), "pong").unwrap();

        let reply = client.wait_reply(serial, Duration::from_secs(1)).unwrap();
        assert_eq!(reply, Message::new("OK", 1, "pong"));
    }

    #[test]
    fn wait_reply_leaves_other_messages_queued() {
        let (a, b) = MemoryStream::pair();
        let mut client = Channel::new(a);
        let mut server = Channel::new(b);

        let serial = client.send_command("work").unwrap();
        server.send_event("progress").unwrap();
        server.send_result(serial, "finished").unwrap();

        let reply = client.wait_reply(serial, Duration::from_secs(1)).unwrap();
        assert_eq!(reply.payload(), "finished");
        assert_eq!(client.pop(), Some(Message::new("EVT", 1, "progress")));
    }

    #[test]
    fn wait_reply_times_out() {
        let (mut channel, _remote) = pair();
        let err = channel
            .wait_reply(1, Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, ChannelError::Timeout(_)));
        assert!(!channel.is_closed());
    }

    #[test]
    fn bad_marker_closes_the_channel() {
        let (mut channel, _remote) = pair();
        channel.transport().inject(b"X");
        let err = channel.receive().unwrap_err();
        assert_eq!(malformed_reason(&err), Some("missing begin marker"));
        assert!(err.is_framing());
        assert!(channel.is_closed());
        assert!(channel.transport().is_closed());

        assert!(matches!(channel.receive(), Err(ChannelError::Closed)));
        assert!(matches!(channel.send_command("go"), Err(ChannelError::Closed)));
        assert_eq!(channel.last_serial(), 0);
    }

    #[test]
    fn header_errors_are_fatal() {
        for (bytes, reason) in [
            (&b"@:CMD:1:x"[..], "no size specified"),
            (&b"@1x"[..], "expecting digits or separator"),
        ] {
            let (mut channel, _remote) = pair();
            channel.transport().inject(bytes);
            let err = channel.receive().unwrap_err();
            assert_eq!(malformed_reason(&err), Some(reason));
            assert!(channel.is_closed());
        }
    }

    #[test]
    fn bad_body_is_fatal() {
        let (mut channel, _remote) = pair();
        channel.transport().inject(b"@7:CMD:x:y");
        let err = channel.receive().unwrap_err();
        assert_eq!(malformed_reason(&err), Some("invalid serial number"));
        assert!(channel.is_closed());
    }

    #[test]
    fn messages_before_a_bad_frame_stay_queued() {
        let (mut channel, _remote) = pair();
        channel.transport().inject(b"@8:CMD:1:go#");
        assert!(channel.receive().is_err());
        assert_eq!(channel.pop(), Some(Message::new("CMD", 1, "go")));
    }

    #[test]
    fn oversized_header_is_fatal() {
        let (local, _remote) = MemoryStream::pair();
        let config = ChannelConfig {
            frame: FrameConfig {
                max_frame_len: 16,
                ..FrameConfig::default()
            },
            ..ChannelConfig::default()
        };
        let mut channel = Channel::with_config(local, config);
        channel.transport().inject(b"@999");
        let err = channel.receive().unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Frame(FrameError::FrameTooLarge { .. })
        ));
        assert!(channel.is_closed());
    }

    #[cfg(unix)]
    #[test]
    fn expired_write_timeout_closes_the_channel() {
        use std::sync::mpsc;

        use msgchan_transport::IpcStream;

        let (local, _idle_peer) = IpcStream::pair().unwrap();
        local
            .set_write_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        let mut channel = Channel::new(local);
        let payload = "x".repeat(8 * 1024 * 1024);

        let (done_tx, done_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = channel.send_event(&payload);
            let io_kind = match &result {
                Err(ChannelError::Frame(FrameError::Io(err))) => Some(err.kind()),
                _ => None,
            };
            let _ = done_tx.send((io_kind, channel.is_closed(), channel.last_serial()));
        });

        let (io_kind, closed, last_serial) = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("send should give up once the write timeout expires");
        assert!(matches!(
            io_kind,
            Some(std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
        ));
        assert!(closed);
        // Part of the frame may have reached the socket.
        assert_eq!(last_serial, 1);
    }

    #[test]
    fn end_of_stream_disconnects() {
        let (a, mut b) = MemoryStream::pair();
        let mut channel = Channel::new(a);
        b.write_all(b"@8:CMD:1:go").unwrap();
        b.close().unwrap();

        assert_eq!(channel.receive().unwrap(), 1);
        assert!(matches!(channel.receive(), Err(ChannelError::Disconnected)));
        assert!(channel.is_closed());
        assert_eq!(channel.pop(), Some(Message::new("CMD", 1, "go")));
    }

    #[test]
    fn full_queue_closes_the_channel() {
        let (local, _remote) = MemoryStream::pair();
        let config = ChannelConfig {
            max_pending_jobs: Some(1),
            ..ChannelConfig::default()
        };
        let mut channel = Channel::with_config(local, config);
        channel.transport().inject(b"@7:EVT:1:a@7:EVT:2:b");
        let err = channel.receive().unwrap_err();
        assert!(matches!(err, ChannelError::QueueFull { capacity: 1 }));
        assert!(channel.is_closed());
        assert_eq!(channel.pending_len(), 1);
    }

    #[test]
    fn dispatch_runs_in_fifo_order() {
        let (mut channel, _remote) = pair();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        channel.set_processor(ProcessorBinding::from_fn(
            move |_: &mut Channel<MemoryStream>, message: Message| {
                sink.lock().unwrap().push(message.serial());
                Ok(())
            },
        ));

        channel.transport().inject(b"@7:EVT:1:a@7:EVT:2:b@7:EVT:3:c");
        assert_eq!(channel.receive().unwrap(), 3);
        // Receiving alone never processes.
        assert!(seen.lock().unwrap().is_empty());

        assert!(channel.dispatch_next().unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(channel.dispatch_pending().unwrap(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert!(!channel.dispatch_next().unwrap());
    }

    #[test]
    fn processor_can_reply_through_the_channel() {
        let (mut channel, remote) = pair();
        channel.set_processor(ProcessorBinding::from_fn(
            |channel: &mut Channel<MemoryStream>, message: Message| {
                channel.send_result(message.serial(), &message.payload().to_uppercase())
            },
        ));
        channel.transport().inject(b"@8:CMD:5:go");
        channel.receive().unwrap();
        channel.dispatch_pending().unwrap();
        assert_eq!(remote.take_pending(), b"@7:OK:5:GO");
    }

    #[test]
    fn processor_replacement_during_dispatch_is_kept() {
        let (mut channel, remote) = pair();
        channel.set_processor(ProcessorBinding::from_fn(
            |channel: &mut Channel<MemoryStream>, message: Message| {
                assert!(channel.processor().is_diagnostic());
                channel.set_processor(ProcessorBinding::from_fn(
                    |channel: &mut Channel<MemoryStream>, message: Message| {
                        channel.send_error(message.serial(), "second")
                    },
                ));
                channel.send_result(message.serial(), "first")
            },
        ));

        channel.transport().inject(b"@7:CMD:1:a@7:CMD:2:b");
        channel.receive().unwrap();
        assert_eq!(channel.dispatch_pending().unwrap(), 2);
        assert_eq!(remote.take_pending(), b"@10:OK:1:first@12:ERR:2:second");
        assert!(!channel.processor().is_diagnostic());
    }

    #[test]
    fn processor_error_stops_the_drain() {
        let (mut channel, _remote) = pair();
        channel.set_processor(ProcessorBinding::from_fn(
            |_: &mut Channel<MemoryStream>, message: Message| {
                if message.payload() == "bad" {
                    return Err(ChannelError::processor("rejected"));
                }
                Ok(())
            },
        ));
        channel.transport().inject(b"@7:EVT:1:a@9:EVT:2:bad@7:EVT:3:c");
        channel.receive().unwrap();

        let err = channel.dispatch_pending().unwrap_err();
        assert!(matches!(err, ChannelError::Processor(ref reason) if reason == "rejected"));
        assert_eq!(channel.pending_len(), 1);
        assert!(!channel.processor().is_diagnostic());
    }

    #[test]
    fn diagnostic_processor_consumes_jobs() {
        let (mut channel, _remote) = pair();
        assert!(channel.processor().is_diagnostic());
        channel.transport().inject(b"@8:CMD:1:go");
        channel.receive().unwrap();
        assert_eq!(channel.dispatch_pending().unwrap(), 1);
        assert!(!channel.has_pending());
    }

    #[test]
    fn codec_switch_applies_both_ways() {
        let (mut channel, remote) = pair();
        channel.set_codec(TextCodec::Latin1);
        assert_eq!(channel.codec(), TextCodec::Latin1);
        assert_eq!(channel.config().frame.codec, TextCodec::Latin1);

        channel.send_event("é").unwrap();
        assert_eq!(remote.take_pending(), b"@7:EVT:1:\xE9");

        channel.transport().inject(b"@7:EVT:9:\xE9");
        channel.receive().unwrap();
        assert_eq!(channel.pop(), Some(Message::new("EVT", 9, "é")));
    }

    #[test]
    fn close_is_idempotent() {
        let (mut channel, remote) = pair();
        channel.close().unwrap();
        channel.close().unwrap();
        assert!(channel.is_closed());
        assert!(channel.transport().is_closed());
        let _ = remote;
    }

    #[test]
    fn decoder_state_survives_between_receives() {
        let (mut channel, _remote) = pair();
        channel.transport().inject(b"@8:CMD:1");
        channel.receive().unwrap();
        assert_eq!(channel.decoder.state(), ParseState::Body(8));
    }
}
