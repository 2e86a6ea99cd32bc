//! Decode worker: one background thread that turns page bytes into pixels.
//!
//! Three channels connect it to the interactive thread:
//!   - requests: bounded `mpsc::sync_channel`, interactive → worker
//!   - control:  `mpsc::channel`, interactive → worker (window, retire)
//!   - responses: `mpsc::channel`, worker → interactive
//!
//! The worker owns the decoder and the page source. Nothing is shared with
//! the interactive thread except what travels through the channels: a request
//! carries the page identifier (a path, or an `Arc` of immutable bytes) and a
//! response hands over freshly built pixel buffers by move.
//!
//! Requests are processed one at a time in FIFO order. Before each job the
//! worker moves requests from the channel into a local queue, but never more
//! than `queue_depth` of them, so a full channel still pushes back on the
//! interactive thread. A request whose (generation, index, kind) is already
//! queued replaces the queued entry's ticket and scale in place instead of
//! queueing a second copy, so a page is never decoded twice for the same
//! document.
//!
//! Control messages are read after the requests are pulled, so the worker's
//! idea of what is wanted is always at least as new as anything queued.
//! `Retire` ends older generations; `Window` names the pages of the current
//! generation the View still keeps. Queued work outside either is dropped
//! before it runs.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::io;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::RgbaImage;
use log::{debug, error, info, trace};

use crate::decode::{Decoder, scale_buffer, scaled_size};
use crate::error::PageError;
use crate::geometry::Size;
use crate::page::PageBuffer;
use crate::settings::ScaleParams;
use crate::source::{PageId, PageSource};
use crate::tracker::RequestId;

/// Work to perform for one page.
#[derive(Debug, Clone)]
pub enum Job {
    /// Read bytes, decode, scale.
    Decode { id: PageId },
    /// Rescale already-decoded natural pixels. No bytes are read.
    Resize { natural: Arc<RgbaImage> },
}

impl Job {
    fn kind(&self) -> JobKind {
        match self {
            Job::Decode { .. } => JobKind::Decode,
            Job::Resize { .. } => JobKind::Resize,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Decode,
    Resize,
}

#[derive(Debug, Clone)]
pub struct DecodeRequest {
    pub generation: u64,
    pub index: usize,
    pub ticket: RequestId,
    pub params: ScaleParams,
    pub job: Job,
}

impl DecodeRequest {
    fn same_work(&self, other: &DecodeRequest) -> bool {
        self.generation == other.generation
            && self.index == other.index
            && self.job.kind() == other.job.kind()
    }
}

#[derive(Debug)]
pub enum Outcome {
    Decoded {
        buffer: PageBuffer,
        scaled_size: Size,
    },
    Resized {
        scaled: Option<RgbaImage>,
        scaled_size: Size,
    },
    Failed(PageError),
}

/// Result of one request, tagged with everything needed to validate it on arrival.
#[derive(Debug)]
pub struct DecodeResponse {
    pub generation: u64,
    pub index: usize,
    pub ticket: RequestId,
    pub params: ScaleParams,
    pub outcome: Outcome,
}

enum Control {
    Retire { generation: u64 },
    Window {
        generation: u64,
        keep: RangeInclusive<usize>,
    },
}

#[derive(Debug)]
pub enum SubmitError {
    /// Request queue is at capacity; try again on a later pass.
    Full,
    /// Worker thread is gone.
    Disconnected,
}

/// Handle to the decode thread. Dropping it stops and joins the thread.
pub struct DecodeWorker {
    req_tx: Option<mpsc::SyncSender<DecodeRequest>>,
    ctrl_tx: Option<mpsc::Sender<Control>>,
    res_rx: mpsc::Receiver<DecodeResponse>,
    handle: Option<JoinHandle<()>>,
}

impl DecodeWorker {
    /// Spawn the worker thread. `queue_depth` bounds the request channel.
    pub fn spawn<D: Decoder, S: PageSource>(
        decoder: D,
        source: S,
        queue_depth: usize,
    ) -> io::Result<Self> {
        let depth = queue_depth.max(1);
        let (req_tx, req_rx) = mpsc::sync_channel::<DecodeRequest>(depth);
        let (ctrl_tx, ctrl_rx) = mpsc::channel::<Control>();
        let (res_tx, res_rx) = mpsc::channel::<DecodeResponse>();
        let handle = thread::Builder::new()
            .name("decode-worker".into())
            .spawn(move || worker_loop(&decoder, &source, depth, &req_rx, &ctrl_rx, &res_tx))?;
        info!("worker: spawned (queue_depth={depth})");
        Ok(Self {
            req_tx: Some(req_tx),
            ctrl_tx: Some(ctrl_tx),
            res_rx,
            handle: Some(handle),
        })
    }

    /// Queue a request without blocking.
    pub fn submit(&self, req: DecodeRequest) -> Result<(), SubmitError> {
        let Some(tx) = &self.req_tx else {
            return Err(SubmitError::Disconnected);
        };
        match tx.try_send(req) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SubmitError::Full),
            Err(TrySendError::Disconnected(_)) => Err(SubmitError::Disconnected),
        }
    }

    /// Tell the worker that generations below `generation` are dead.
    pub fn retire(&self, generation: u64) {
        self.control(Control::Retire { generation });
    }

    /// Tell the worker which pages of `generation` are still wanted. Queued
    /// work outside `keep` is dropped before it runs.
    pub fn retain_window(&self, generation: u64, keep: RangeInclusive<usize>) {
        self.control(Control::Window { generation, keep });
    }

    fn control(&self, msg: Control) {
        if let Some(tx) = &self.ctrl_tx
            && tx.send(msg).is_err()
        {
            debug!("worker: control channel closed");
        }
    }

    /// Next finished response, if any. Non-blocking.
    pub fn try_recv(&self) -> Option<DecodeResponse> {
        self.res_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next response.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<DecodeResponse> {
        match self.res_rx.recv_timeout(timeout) {
            Ok(res) => Some(res),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        // req_tx dropped → worker recv() gets Err → worker exits → join
        self.req_tx.take();
        self.ctrl_tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("worker: thread panicked");
        }
    }
}

fn worker_loop(
    decoder: &dyn Decoder,
    source: &dyn PageSource,
    depth: usize,
    req_rx: &mpsc::Receiver<DecodeRequest>,
    ctrl_rx: &mpsc::Receiver<Control>,
    res_tx: &mpsc::Sender<DecodeResponse>,
) {
    debug!("worker: started");
    let mut queue: VecDeque<DecodeRequest> = VecDeque::with_capacity(depth);
    let mut wanted = Wanted::default();
    loop {
        if queue.is_empty() {
            match req_rx.recv() {
                Ok(req) => enqueue(&mut queue, req),
                Err(_) => break,
            }
        }
        while queue.len() < depth {
            match req_rx.try_recv() {
                Ok(req) => enqueue(&mut queue, req),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("worker: channel closed, dropping {} queued job(s)", queue.len());
                    return;
                }
            }
        }
        loop {
            match ctrl_rx.try_recv() {
                Ok(msg) => wanted.update(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("worker: control channel closed, dropping {} queued job(s)", queue.len());
                    return;
                }
            }
        }
        wanted.prune(&mut queue);
        let Some(req) = queue.pop_front() else {
            continue;
        };
        let res = run_job(decoder, source, req);
        if res_tx.send(res).is_err() {
            debug!("worker: response channel closed");
            return;
        }
    }
    debug!("worker: channel closed, exiting");
}

fn enqueue(queue: &mut VecDeque<DecodeRequest>, req: DecodeRequest) {
    if let Some(queued) = queue.iter_mut().find(|q| q.same_work(&req)) {
        trace!(
            "worker: page {} already queued, refreshing ticket {:?} -> {:?}",
            req.index, queued.ticket, req.ticket
        );
        queued.ticket = req.ticket;
        queued.params = req.params;
        if let Job::Resize { .. } = req.job {
            queued.job = req.job;
        }
    } else {
        queue.push_back(req);
    }
}

/// What the interactive thread still wants, as far as the worker has heard.
#[derive(Debug, Default)]
struct Wanted {
    generation: u64,
    keep: Option<RangeInclusive<usize>>,
}

impl Wanted {
    fn update(&mut self, msg: Control) {
        match msg {
            Control::Retire { generation } => {
                if generation > self.generation {
                    self.generation = generation;
                    self.keep = None;
                }
            }
            Control::Window { generation, keep } => {
                if generation >= self.generation {
                    self.generation = generation;
                    self.keep = Some(keep);
                }
            }
        }
    }

    fn wants(&self, req: &DecodeRequest) -> bool {
        match req.generation.cmp(&self.generation) {
            Ordering::Less => false,
            Ordering::Equal => self.keep.as_ref().is_none_or(|k| k.contains(&req.index)),
            Ordering::Greater => true,
        }
    }

    fn prune(&self, queue: &mut VecDeque<DecodeRequest>) {
        let before = queue.len();
        queue.retain(|q| self.wants(q));
        let dropped = before - queue.len();
        if dropped > 0 {
            debug!(
                "worker: dropped {dropped} queued job(s), generation {} keeps pages {:?}",
                self.generation, self.keep
            );
        }
    }
}

/// Execute one request synchronously.
pub fn run_job(decoder: &dyn Decoder, source: &dyn PageSource, req: DecodeRequest) -> DecodeResponse {
    let start = Instant::now();
    let DecodeRequest {
        generation,
        index,
        ticket,
        params,
        job,
    } = req;

    let outcome = match job {
        Job::Decode { id } => match decode_page(decoder, source, &id, params) {
            Ok((buffer, scaled_size)) => {
                debug!(
                    "worker: page {index} decoded {} -> {scaled_size} in {:.1}ms",
                    buffer.natural_size(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                Outcome::Decoded { buffer, scaled_size }
            }
            Err(e) => {
                error!("worker: page {index} ({}) failed: {e}", id.label());
                Outcome::Failed(e)
            }
        },
        Job::Resize { natural } => {
            let natural_size = Size::new(natural.width(), natural.height());
            let target = scaled_size(natural_size, params);
            let scaled = if target == natural_size {
                None
            } else {
                Some(decoder.resize(&natural, target))
            };
            debug!(
                "worker: page {index} resized {natural_size} -> {target} in {:.1}ms",
                start.elapsed().as_secs_f64() * 1000.0
            );
            Outcome::Resized {
                scaled,
                scaled_size: target,
            }
        }
    };

    DecodeResponse {
        generation,
        index,
        ticket,
        params,
        outcome,
    }
}

fn decode_page(
    decoder: &dyn Decoder,
    source: &dyn PageSource,
    id: &PageId,
    params: ScaleParams,
) -> Result<(PageBuffer, Size), PageError> {
    let bytes = source.read_bytes(id)?;
    let natural = decoder.decode(&bytes)?;
    if natural.width() == 0 || natural.height() == 0 {
        return Err(PageError::CorruptData("image has no pixels".into()));
    }
    Ok(scale_buffer(decoder, Arc::new(natural), params))
}
