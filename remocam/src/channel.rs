//! Request/response correlation over a [Transport].
//!
//! The device protocol is strictly half-duplex per logical channel: one
//! request may be in flight at a time, and the next response frame with a
//! matching opcode answers it. A second submission while the slot is
//! occupied fails fast with [`Error::Busy`] rather than queueing, so
//! callers keep control over ordering and latency.
//!
//! File transfer opcodes run on their own logical channel with its own
//! slot; a long download never blocks ordinary control traffic.
//!
//! Unsolicited frames (events, periodic status pushes) are handed off to
//! the receiver returned by [`CommandChannel::new`], in arrival order.
use crate::{transport::Transport, Error, Result};
use rand::Rng;
use remocam_protocol::{Command, Frame, FrameDecoder, OpCode};
use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};
use tokio::{
    select,
    sync::{mpsc, oneshot, Mutex, Notify},
    task::JoinHandle,
    time::{sleep_until, Duration, Instant},
};

/// How a completed (or failed) request is delivered back to the caller.
enum Responder {
    Block(oneshot::Sender<Result<Vec<u8>>>),
    Callback(Box<dyn FnOnce(Result<Vec<u8>>) + Send>),
}

impl Responder {
    fn complete(self, result: Result<Vec<u8>>) {
        match self {
            // The caller may have given up waiting; that is fine.
            Responder::Block(tx) => {
                let _ = tx.send(result);
            }
            Responder::Callback(cb) => cb(result),
        }
    }
}

struct Pending {
    opcode: OpCode,
    sequence: u8,
    deadline: Instant,
    responder: Responder,
}

/// One slot per logical channel.
#[derive(Default)]
struct Slots {
    command: Option<Pending>,
    file: Option<Pending>,
}

impl Slots {
    fn for_opcode(&mut self, opcode: OpCode) -> &mut Option<Pending> {
        if opcode.is_file_transfer() {
            &mut self.file
        } else {
            &mut self.command
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (&self.command, &self.file) {
            (Some(c), Some(f)) => Some(c.deadline.min(f.deadline)),
            (Some(c), None) => Some(c.deadline),
            (None, Some(f)) => Some(f.deadline),
            (None, None) => None,
        }
    }

    fn take_all(&mut self) -> Vec<Pending> {
        self.command.take().into_iter().chain(self.file.take()).collect()
    }

    fn take_expired(&mut self, now: Instant) -> Vec<Pending> {
        let mut expired = Vec::new();
        for slot in [&mut self.command, &mut self.file] {
            if matches!(slot, Some(p) if p.deadline <= now) {
                expired.extend(slot.take());
            }
        }
        expired
    }
}

struct Shared {
    slots: Mutex<Slots>,
    /// Signalled when a slot is filled or the channel shuts down, so the
    /// receive loop recomputes its sleep deadline.
    changed: Notify,
    down: AtomicBool,
}

/// A correlated request/response channel to one device.
pub struct CommandChannel {
    transport: Arc<dyn Transport>,
    sequence: AtomicU8,
    shared: Arc<Shared>,
    rx_task: JoinHandle<()>,
}

impl CommandChannel {
    /// Default per-request deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    /// Starts the receive loop on `transport`. The returned receiver
    /// yields unsolicited frames; dropping it discards them.
    pub fn new(transport: Arc<dyn Transport>) -> (Self, mpsc::Receiver<Frame>) {
        let shared = Arc::new(Shared {
            slots: Mutex::new(Slots::default()),
            changed: Notify::new(),
            down: AtomicBool::new(false),
        });
        let (unsolicited_tx, unsolicited_rx) = mpsc::channel(64);

        let rx_task = tokio::spawn(Self::run(
            transport.clone(),
            shared.clone(),
            unsolicited_tx,
        ));

        (
            Self {
                transport,
                // Start at a random point so stale frames from a previous
                // session do not alias fresh requests.
                sequence: AtomicU8::new(rand::rng().random()),
                shared,
                rx_task,
            },
            unsolicited_rx,
        )
    }

    /// Sends `cmd` and waits for its typed response, with the default
    /// deadline.
    pub async fn request<C: Command>(&self, cmd: &C) -> Result<C::Response> {
        self.request_timeout(cmd, Self::DEFAULT_TIMEOUT).await
    }

    /// Sends `cmd` and waits for its typed response.
    pub async fn request_timeout<C: Command>(
        &self,
        cmd: &C,
        timeout: Duration,
    ) -> Result<C::Response> {
        let (tx, rx) = oneshot::channel();
        self.submit(C::OPCODE, cmd.encode()?, timeout, Responder::Block(tx))
            .await?;
        let payload = rx.await.map_err(|_| Error::ChannelUnavailable)??;
        Ok(C::decode_response(&payload)?)
    }

    /// Sends `cmd` and delivers the typed response (or failure) to `cb`
    /// from the receive task, without blocking the caller.
    pub async fn request_callback<C, F>(&self, cmd: &C, timeout: Duration, cb: F) -> Result
    where
        C: Command,
        F: FnOnce(Result<C::Response>) + Send + 'static,
    {
        let decode = move |r: Result<Vec<u8>>| {
            cb(r.and_then(|payload| C::decode_response(&payload).map_err(Into::into)))
        };
        self.submit(
            C::OPCODE,
            cmd.encode()?,
            timeout,
            Responder::Callback(Box::new(decode)),
        )
        .await
    }

    /// `true` once the transport has failed or [`close`][Self::close] ran.
    pub fn is_down(&self) -> bool {
        self.shared.down.load(Ordering::Acquire)
    }

    /// Shuts the channel down, failing any in-flight request with
    /// [`Error::Disconnected`]. Idempotent.
    pub async fn close(&self) {
        if self.shared.down.swap(true, Ordering::AcqRel) {
            return;
        }
        let pending = self.shared.slots.lock().await.take_all();
        for p in pending {
            p.responder.complete(Err(Error::Disconnected));
        }
        self.shared.changed.notify_one();
    }

    fn next_sequence(&self) -> u8 {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if seq != 0 {
            seq
        } else {
            // 0 is the legacy-firmware wildcard, never assigned.
            self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
        }
    }

    async fn submit(
        &self,
        opcode: OpCode,
        payload: Vec<u8>,
        timeout: Duration,
        responder: Responder,
    ) -> Result {
        if self.is_down() {
            return Err(Error::Disconnected);
        }

        let sequence = self.next_sequence();
        let encoded = Frame::request(opcode, sequence, payload).encode()?;

        {
            let mut slots = self.shared.slots.lock().await;
            let slot = slots.for_opcode(opcode);
            if slot.is_some() {
                return Err(Error::Busy);
            }
            *slot = Some(Pending {
                opcode,
                sequence,
                deadline: Instant::now() + timeout,
                responder,
            });
        }
        self.shared.changed.notify_one();

        if let Err(e) = self.transport.send(&encoded).await {
            // Roll the reservation back; nothing can answer it.
            let mut slots = self.shared.slots.lock().await;
            let slot = slots.for_opcode(opcode);
            if matches!(slot, Some(p) if p.sequence == sequence) {
                *slot = None;
            }
            return Err(e);
        }
        trace!("sent request {opcode} seq {sequence}");
        Ok(())
    }

    async fn run(
        transport: Arc<dyn Transport>,
        shared: Arc<Shared>,
        unsolicited: mpsc::Sender<Frame>,
    ) {
        let mut decoder = FrameDecoder::new();
        loop {
            let deadline = shared.slots.lock().await.next_deadline();
            let expiry = async {
                match deadline {
                    Some(d) => sleep_until(d).await,
                    None => std::future::pending().await,
                }
            };

            select! {
                received = transport.recv() => match received {
                    Ok(bytes) => {
                        decoder.push(&bytes);
                        while let Some(frame) = decoder.next_frame() {
                            Self::handle_frame(&shared, &unsolicited, frame).await;
                        }
                    }
                    Err(e) => {
                        debug!("transport failed: {e}");
                        break;
                    }
                },
                _ = expiry => {
                    let expired = shared.slots.lock().await.take_expired(Instant::now());
                    for p in expired {
                        debug!("request {} seq {} timed out", p.opcode, p.sequence);
                        p.responder.complete(Err(Error::Timeout));
                    }
                }
                _ = shared.changed.notified() => {
                    if shared.down.load(Ordering::Acquire) {
                        break;
                    }
                }
            }
        }

        shared.down.store(true, Ordering::Release);
        for p in shared.slots.lock().await.take_all() {
            p.responder.complete(Err(Error::Disconnected));
        }
    }

    async fn handle_frame(shared: &Shared, unsolicited: &mpsc::Sender<Frame>, frame: Frame) {
        if frame.is_unsolicited() {
            // Dropped when nobody listens for events on this device.
            let _ = unsolicited.send(frame).await;
            return;
        }

        let matched = {
            let mut slots = shared.slots.lock().await;
            let slot = slots.for_opcode(frame.opcode);
            let hit = matches!(
                slot.as_ref(),
                Some(p) if p.opcode == frame.opcode
                    && (frame.sequence == 0 || frame.sequence == p.sequence)
            );
            if hit {
                slot.take()
            } else {
                None
            }
        };

        match matched {
            Some(p) => {
                let result = if frame.code < 0 {
                    Err(Error::Device(frame.code))
                } else {
                    Ok(frame.payload)
                };
                p.responder.complete(result);
            }
            None => debug!(
                "unmatched response {} seq {} dropped",
                frame.opcode, frame.sequence
            ),
        }
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.rx_task.abort();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::mock::MockTransport;
    use remocam_protocol::command::{
        CameraZoomRequest, FileChunkRequest, FileType, GimbalStop, HeartbeatRequest,
    };
    use std::sync::atomic::AtomicUsize;

    fn channel() -> (CommandChannel, crate::transport::mock::MockRemote) {
        let (transport, remote) = MockTransport::pair();
        let (channel, _unsolicited) = CommandChannel::new(Arc::new(transport));
        (channel, remote)
    }

    #[tokio::test]
    async fn response_resolves_request() -> Result {
        let (channel, mut remote) = channel();

        let request = tokio::spawn(async move {
            // Moves the channel into the task; keep it alive for the test.
            let value = channel.request(&CameraZoomRequest).await?;
            Ok::<u16, Error>(value.ratio)
        });

        let sent = remote.next_frame().await;
        assert_eq!(sent.opcode, CameraZoomRequest::OPCODE);
        remote
            .inject_frame(&Frame::response(
                sent.opcode,
                sent.sequence,
                0,
                vec![0x00, 0x2a],
            ))
            .await;

        assert_eq!(request.await.map_err(|_| Error::Internal)??, 42);
        Ok(())
    }

    #[tokio::test]
    async fn device_error_code_surfaces() -> Result {
        let (channel, mut remote) = channel();

        let request = tokio::spawn(async move { channel.request(&GimbalStop).await });

        let sent = remote.next_frame().await;
        remote
            .inject_frame(&Frame::response(sent.opcode, sent.sequence, -4, vec![]))
            .await;

        assert!(matches!(
            request.await.map_err(|_| Error::Internal)?,
            Err(Error::Device(-4))
        ));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_times_out() -> Result {
        let (channel, _remote) = channel();

        let before = Instant::now();
        let result = channel.request(&HeartbeatRequest).await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(before.elapsed(), CommandChannel::DEFAULT_TIMEOUT);

        // The slot is free again afterwards.
        assert!(matches!(
            channel.request(&HeartbeatRequest).await,
            Err(Error::Timeout)
        ));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_beats_deadline() -> Result {
        let (transport, mut remote) = MockTransport::pair();
        let (channel, _unsolicited) = CommandChannel::new(Arc::new(transport));

        // The device takes 50 ms to answer; well within the deadline, and
        // the caller resumes as soon as the echo lands.
        let echo = tokio::spawn(async move {
            let sent = remote.next_frame().await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            remote
                .inject_frame(&Frame::response(
                    sent.opcode,
                    sent.sequence,
                    0,
                    vec![0x00, 0x32],
                ))
                .await;
        });

        let before = Instant::now();
        let value = channel
            .request_timeout(&CameraZoomRequest, Duration::from_millis(500))
            .await?;
        assert_eq!(value.ratio, 50);
        assert_eq!(before.elapsed(), Duration::from_millis(50));
        echo.await.map_err(|_| Error::Internal)?;

        // The same deadline against a silent device expires on time.
        let (transport, _remote) = MockTransport::pair();
        let (channel, _unsolicited) = CommandChannel::new(Arc::new(transport));
        let before = Instant::now();
        let result = channel
            .request_timeout(&CameraZoomRequest, Duration::from_millis(500))
            .await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(before.elapsed(), Duration::from_millis(500));
        Ok(())
    }

    #[tokio::test]
    async fn second_request_fails_busy() -> Result {
        let (channel, mut remote) = channel();
        let channel = Arc::new(channel);

        let first = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.request(&CameraZoomRequest).await })
        };
        // Wait until the first request is actually on the wire.
        let sent = remote.next_frame().await;

        assert!(matches!(
            channel.request(&CameraZoomRequest).await,
            Err(Error::Busy)
        ));

        remote
            .inject_frame(&Frame::response(
                sent.opcode,
                sent.sequence,
                0,
                vec![0x00, 0x05],
            ))
            .await;
        assert_eq!(first.await.map_err(|_| Error::Internal)??.ratio, 5);
        Ok(())
    }

    #[tokio::test]
    async fn file_channel_is_independent() -> Result {
        let (channel, mut remote) = channel();
        let channel = Arc::new(channel);

        let zoom = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.request(&CameraZoomRequest).await })
        };
        let zoom_sent = remote.next_frame().await;

        // A file transfer request goes through while the command slot is
        // occupied.
        let chunk = {
            let channel = channel.clone();
            tokio::spawn(async move {
                channel
                    .request(&FileChunkRequest {
                        file_type: FileType::DOWNLOAD_LOG,
                        offset: 0,
                    })
                    .await
            })
        };
        let chunk_sent = remote.next_frame().await;
        assert!(chunk_sent.opcode.is_file_transfer());

        remote
            .inject_frame(&Frame::response(
                chunk_sent.opcode,
                chunk_sent.sequence,
                0,
                vec![0, 0, 0, 0, 0xab],
            ))
            .await;
        remote
            .inject_frame(&Frame::response(
                zoom_sent.opcode,
                zoom_sent.sequence,
                0,
                vec![0x00, 0x01],
            ))
            .await;

        assert_eq!(chunk.await.map_err(|_| Error::Internal)??.data, vec![0xab]);
        assert_eq!(zoom.await.map_err(|_| Error::Internal)??.ratio, 1);
        Ok(())
    }

    #[tokio::test]
    async fn mismatched_sequence_ignored() -> Result {
        let (channel, mut remote) = channel();

        let request = tokio::spawn(async move { channel.request(&CameraZoomRequest).await });
        let sent = remote.next_frame().await;

        // A stale response from an earlier session must not resolve it.
        remote
            .inject_frame(&Frame::response(
                sent.opcode,
                sent.sequence.wrapping_add(1),
                0,
                vec![0x00, 0x63],
            ))
            .await;
        remote
            .inject_frame(&Frame::response(
                sent.opcode,
                sent.sequence,
                0,
                vec![0x00, 0x07],
            ))
            .await;

        assert_eq!(request.await.map_err(|_| Error::Internal)??.ratio, 7);
        Ok(())
    }

    #[tokio::test]
    async fn zero_sequence_matches_legacy_firmware() -> Result {
        let (channel, mut remote) = channel();

        let request = tokio::spawn(async move { channel.request(&CameraZoomRequest).await });
        let sent = remote.next_frame().await;

        remote
            .inject_frame(&Frame::response(sent.opcode, 0, 0, vec![0x00, 0x09]))
            .await;
        assert_eq!(request.await.map_err(|_| Error::Internal)??.ratio, 9);
        Ok(())
    }

    #[tokio::test]
    async fn transport_loss_fails_pending() -> Result {
        let (channel, remote) = channel();

        let request = tokio::spawn(async move {
            let r = channel.request(&CameraZoomRequest).await;
            (r, channel)
        });
        tokio::task::yield_now().await;
        drop(remote);

        let (result, channel) = request.await.map_err(|_| Error::Internal)?;
        assert!(matches!(result, Err(Error::Disconnected)));
        while !channel.is_down() {
            tokio::task::yield_now().await;
        }
        assert!(matches!(
            channel.request(&CameraZoomRequest).await,
            Err(Error::Disconnected)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn callback_requests_do_not_block() -> Result {
        let (channel, mut remote) = channel();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits2 = hits.clone();
        channel
            .request_callback(
                &CameraZoomRequest,
                CommandChannel::DEFAULT_TIMEOUT,
                move |r: Result<remocam_protocol::command::ZoomValue>| {
                    assert_eq!(r.expect("zoom response").ratio, 33);
                    hits2.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await?;

        let sent = remote.next_frame().await;
        remote
            .inject_frame(&Frame::response(
                sent.opcode,
                sent.sequence,
                0,
                vec![0x00, 0x21],
            ))
            .await;

        // Wait for the receive task to run the callback.
        while hits.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}
