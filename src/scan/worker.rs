use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::decoder::{FrameRead, PresentationFilter};
use super::ledger::{LedgerClock, ScanInstant};
use super::pipeline::{AttendancePipeline, ScanReport};

#[derive(Debug)]
struct ScanEvent {
    code_data: String,
    at: ScanInstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// A scan is still in flight; the code was dropped.
    Busy,
    Closed,
}

/// Producer side of the scan loop, held by whatever drives the camera.
#[derive(Clone)]
pub struct ScanHandle {
    tx: mpsc::Sender<ScanEvent>,
    busy: Arc<AtomicBool>,
    clock: LedgerClock,
}

impl ScanHandle {
    pub fn offer(&self, code_data: String) -> Offer {
        self.offer_at(code_data, self.clock.now())
    }

    pub fn offer_at(&self, code_data: String, at: ScanInstant) -> Offer {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Offer::Busy;
        }

        match self.tx.try_send(ScanEvent { code_data, at }) {
            Ok(()) => Offer::Accepted,
            // The queued event clears the flag once it is processed.
            Err(TrySendError::Full(_)) => Offer::Busy,
            Err(TrySendError::Closed(_)) => {
                self.busy.store(false, Ordering::SeqCst);
                Offer::Closed
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

pub struct ScanLoop;

impl ScanLoop {
    /// Starts the single consumer. It stops once every `ScanHandle` is dropped.
    pub fn spawn(
        pipeline: Arc<AttendancePipeline>,
        outcomes: mpsc::Sender<ScanReport>,
    ) -> (ScanHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<ScanEvent>(1);
        let busy = Arc::new(AtomicBool::new(false));
        let clock = pipeline.clock();
        let worker_busy = busy.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let report = pipeline.process(&event.code_data, event.at).await;
                worker_busy.store(false, Ordering::SeqCst);

                if outcomes.send(report).await.is_err() {
                    warn!("scan outcome receiver dropped");
                }
            }
            info!("scan loop stopped");
        });

        (ScanHandle { tx, busy, clock }, task)
    }
}

/// Camera side: yields frames until the device goes away.
#[async_trait]
pub trait CodeSource: Send {
    async fn next_frame(&mut self) -> Option<FrameRead>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriveStats {
    pub accepted: usize,
    pub dropped: usize,
}

/// Feeds `source` into the scan loop until the source or the loop ends.
pub async fn drive<S: CodeSource>(mut source: S, handle: &ScanHandle) -> DriveStats {
    let mut filter = PresentationFilter::new();
    let mut stats = DriveStats::default();

    while let Some(frame) = source.next_frame().await {
        let Some(code) = filter.observe(frame) else {
            continue;
        };

        match handle.offer(code) {
            Offer::Accepted => stats.accepted += 1,
            Offer::Busy => {
                stats.dropped += 1;
                debug!("scan in flight, code dropped");
            }
            Offer::Closed => {
                warn!("scan loop closed, stopping source");
                break;
            }
        }
    }

    stats
}

/// Line-oriented reader, e.g. a keyboard-wedge QR scanner on stdin.
/// Each non-blank line is one presentation of a code. Bytes that are not
/// UTF-8 are passed on lossily and rejected by the decoder.
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
    gap_pending: bool,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            gap_pending: false,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CodeSource for LineSource<R> {
    async fn next_frame(&mut self) -> Option<FrameRead> {
        if self.gap_pending {
            self.gap_pending = false;
            return Some(FrameRead::Empty);
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf).await {
            Ok(0) => None,
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.buf);
                let text = line.trim_end_matches(['\n', '\r']);
                if text.trim().is_empty() {
                    Some(FrameRead::Empty)
                } else {
                    self.gap_pending = true;
                    Some(FrameRead::Code(text.to_string()))
                }
            }
            Err(e) => {
                error!(error = %e, "code reader failed");
                None
            }
        }
    }
}
