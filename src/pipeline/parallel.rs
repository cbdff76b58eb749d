//! Three-stage worker-pool scheduler: stage 0 produces frames, stage 1 runs
//! detection data-parallel across a thread pool, stage 2 (single thread)
//! re-serializes results into strict frame order and runs
//! associate/estimate-motion/track. Stages communicate over bounded FIFOs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use super::{advance, detect_frame, open_csv_log, DetectedFrame};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::{FrameSource, IndexedFrame};
use crate::ring_delay::RingDelay;
use crate::tracker::Tracker;

/// Depth of each inter-stage bounded queue.
pub const QUEUE_DEPTH: usize = 16;

struct Ticketed<T> {
    ticket: u64,
    value: T,
}

/// Run `source` to completion against `tracker` using `stage1_threads`
/// detection workers. `source` and `config` must be `'static`/`Send` since
/// the frame-production stage runs on its own thread.
pub fn run<S>(
    source: S,
    config: Config,
    max_roi: usize,
    stage1_threads: usize,
    tracker: &mut Tracker,
) -> Result<()>
where
    S: FrameSource + Send + 'static,
{
    let mut csv_log = open_csv_log(&config)?;

    let (frame_tx, frame_rx) = channellib::bounded::<Ticketed<IndexedFrame>>(QUEUE_DEPTH);
    let (result_tx, result_rx) =
        channellib::bounded::<Ticketed<Result<DetectedFrame>>>(QUEUE_DEPTH);

    let fra_start = config.fra_start;
    let fra_end = config.fra_end;
    let skip_fra = config.skip_fra.max(1);

    let mut producer_source = source;
    let producer = thread::Builder::new()
        .name("frame-source".to_string())
        .spawn(move || {
            let mut ticket = 0u64;
            while let Some(indexed) = producer_source.next_frame() {
                if indexed.index < fra_start {
                    continue;
                }
                if let Some(end) = fra_end {
                    if indexed.index > end {
                        break;
                    }
                }
                if (indexed.index - fra_start) % skip_fra != 0 {
                    continue;
                }
                if frame_tx
                    .send(Ticketed {
                        ticket,
                        value: indexed,
                    })
                    .is_err()
                {
                    break;
                }
                ticket += 1;
            }
        })
        .expect("spawn frame-source thread");

    let frame_rx = Arc::new(frame_rx);
    let worker_count = stage1_threads.max(1);
    let mut workers = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let frame_rx = Arc::clone(&frame_rx);
        let result_tx = result_tx.clone();
        let config = config.clone();
        let handle = thread::Builder::new()
            .name(format!("detect-{worker_id}"))
            .spawn(move || {
                while let Ok(Ticketed { ticket, value }) = frame_rx.recv() {
                    let outcome = detect_frame(&value.frame, &config, max_roi, value.index);
                    if result_tx.send(Ticketed { ticket, value: outcome }).is_err() {
                        break;
                    }
                }
            })
            .expect("spawn detect worker thread");
        workers.push(handle);
    }
    drop(result_tx);

    let mut pending: BTreeMap<u64, Result<DetectedFrame>> = BTreeMap::new();
    let mut next_ticket = 0u64;
    let mut delay: RingDelay<DetectedFrame> = RingDelay::new();
    let mut stage_error: Option<Error> = None;

    while let Ok(Ticketed { ticket, value }) = result_rx.recv() {
        pending.insert(ticket, value);
        while let Some(outcome) = pending.remove(&next_ticket) {
            next_ticket += 1;
            match outcome {
                Ok(mut cur) => {
                    if let Some(mut prev) = delay.step(cur.clone()) {
                        match advance(tracker, &mut prev, &mut cur, config.k as usize) {
                            Ok(motion) => {
                                if let Some(log) = csv_log.as_mut() {
                                    if let Err(e) = log
                                        .log_rois(cur.index, &cur.rois)
                                        .and_then(|_| log.log_motion(cur.index, &motion))
                                    {
                                        stage_error = Some(e);
                                    }
                                }
                            }
                            Err(e) => stage_error = Some(e),
                        }
                    }
                }
                Err(e) => stage_error = Some(e),
            }
            if stage_error.is_some() {
                break;
            }
        }
        if stage_error.is_some() {
            break;
        }
    }

    // If we broke out early on error, keep draining so producer/worker
    // threads never block sending into a queue nobody reads anymore.
    drop(pending);
    while result_rx.recv().is_ok() {}

    for handle in workers {
        let _ = handle.join();
    }
    let _ = producer.join();

    match stage_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
