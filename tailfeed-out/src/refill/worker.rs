//! Refill context
//!
//! [`Refiller`] owns the refill end of the primary buffer exchange and the
//! host's producer. It runs either on [`RefillWorker`]'s dedicated thread or
//! on whatever thread the host uses to poll the session.

use super::trigger::RefillTrigger;
use crate::buffer::FillEnd;
use crate::error::{Error, Result};
use crate::render::RenderStats;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

/// Host-supplied producer: fills one interleaved primary buffer instance
pub type Producer = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

struct FillState {
    fill: FillEnd,
    /// Silent frame count at the previous refill, for underrun reporting
    last_silent_frames: u64,
}

/// Refill side of a session. Only non-real-time threads lock its mutexes.
pub struct Refiller {
    state: Mutex<FillState>,
    producer: Mutex<Option<Producer>>,
    stats: Arc<RenderStats>,
}

impl Refiller {
    pub fn new(fill: FillEnd, stats: Arc<RenderStats>) -> Self {
        Self {
            state: Mutex::new(FillState {
                fill,
                last_silent_frames: 0,
            }),
            producer: Mutex::new(None),
            stats,
        }
    }

    /// Replace the producer; used from the next refill on
    pub fn set_producer(&self, producer: Option<Producer>) {
        *self.producer.lock().unwrap_or_else(PoisonError::into_inner) = producer;
    }

    pub fn has_producer(&self) -> bool {
        self.producer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Clear a spare instance, run the producer on it and publish it.
    ///
    /// Without a producer the cleared instance is published as silence. A
    /// panicking producer is contained: the instance is cleared again and
    /// published as silence. Returns false if no spare instance was free.
    pub fn refill(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut producer = self.producer.lock().unwrap_or_else(PoisonError::into_inner);
        let stats = &self.stats;

        let published = state.fill.fill_next(|samples| match producer.as_mut() {
            Some(produce) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| produce(samples)));
                if outcome.is_err() {
                    samples.fill(0.0);
                    stats.record_producer_failure();
                    error!("Refill producer panicked; publishing silence");
                }
            }
            None => trace!("No refill producer registered; publishing silence"),
        });

        if !published {
            debug!("Refill skipped: previous buffer not yet adopted");
            return false;
        }

        self.stats.record_refill_completed();

        let silent = self.stats.snapshot().silent_frames;
        if silent > state.last_silent_frames {
            warn!(
                "Audio underrun: {} silent frames since last refill (total: {})",
                silent - state.last_silent_frames,
                silent
            );
            state.last_silent_frames = silent;
        }

        trace!("Refill published");
        true
    }
}

/// Dedicated refill thread woken by the trigger
pub struct RefillWorker {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RefillWorker {
    /// Spawn the worker and arm `trigger` with it as observer
    pub fn spawn(refiller: Arc<Refiller>, trigger: Arc<RefillTrigger>) -> Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));

        let worker_stop = Arc::clone(&stop_flag);
        let worker_trigger = Arc::clone(&trigger);
        let handle = thread::Builder::new()
            .name("tailfeed-refill".to_string())
            .spawn(move || Self::worker_loop(refiller, worker_trigger, worker_stop))
            .map_err(|e| Error::Refill(format!("Failed to spawn refill worker: {}", e)))?;

        trigger.arm(Some(handle.thread().clone()));
        info!("Refill worker started");

        Ok(Self {
            stop_flag,
            thread: Some(handle),
        })
    }

    fn worker_loop(refiller: Arc<Refiller>, trigger: Arc<RefillTrigger>, stop_flag: Arc<AtomicBool>) {
        debug!("Refill worker running");

        while !stop_flag.load(Ordering::Acquire) {
            if trigger.observe() {
                refiller.refill();
            } else {
                // Unparked by the trigger or by shutdown; spurious wakeups loop
                thread::park();
            }
        }

        debug!("Refill worker received shutdown signal");
    }

    /// Stop and join the worker thread. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.thread.take() else {
            return;
        };

        self.stop_flag.store(true, Ordering::Release);
        handle.thread().unpark();

        match handle.join() {
            Ok(()) => info!("Refill worker stopped"),
            Err(e) => error!("Refill worker join failed: {:?}", e),
        }
    }
}

impl Drop for RefillWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::exchange;
    use crate::render::{Interleaved, RenderEngine};
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn setup(frames: usize) -> (Arc<Refiller>, RenderEngine, Arc<RefillTrigger>, Arc<RenderStats>) {
        let (fill, drain) = exchange(frames, 1);
        let stats = Arc::new(RenderStats::new());
        let trigger = Arc::new(RefillTrigger::new());
        let refiller = Arc::new(Refiller::new(fill, Arc::clone(&stats)));
        let engine = RenderEngine::new(1, drain, Arc::clone(&trigger), Arc::clone(&stats));
        (refiller, engine, trigger, stats)
    }

    fn pull(engine: &mut RenderEngine, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        engine.render(&mut Interleaved::new(&mut out, 1));
        out
    }

    #[test]
    fn test_refill_without_producer_publishes_silence() {
        let (refiller, mut engine, _, stats) = setup(4);
        assert!(!refiller.has_producer());
        assert!(refiller.refill());

        assert_eq!(pull(&mut engine, 2), vec![0.0, 0.0]);
        assert!(engine.has_primary());
        assert_eq!(stats.snapshot().refills_completed, 1);
    }

    #[test]
    fn test_producer_replaced_between_refills() {
        let (refiller, mut engine, trigger, _) = setup(2);
        trigger.arm(None);

        refiller.set_producer(Some(Box::new(|s: &mut [f32]| s.fill(1.0))));
        refiller.refill();
        refiller.set_producer(Some(Box::new(|s: &mut [f32]| s.fill(2.0))));

        assert_eq!(pull(&mut engine, 2), vec![1.0, 1.0]);
        assert!(trigger.observe());
        refiller.refill();
        assert_eq!(pull(&mut engine, 2), vec![2.0, 2.0]);
    }

    #[test]
    fn test_panicking_producer_is_contained() {
        let (refiller, mut engine, _, stats) = setup(2);
        refiller.set_producer(Some(Box::new(|s: &mut [f32]| {
            s[0] = 7.0;
            panic!("producer failure");
        })));

        assert!(refiller.refill());
        assert_eq!(pull(&mut engine, 2), vec![0.0, 0.0]);
        assert_eq!(stats.snapshot().producer_failures, 1);
    }

    #[test]
    fn test_worker_refills_on_trigger() {
        let (refiller, mut engine, trigger, stats) = setup(4);
        let calls = Arc::new(AtomicUsize::new(0));
        let producer_calls = Arc::clone(&calls);
        refiller.set_producer(Some(Box::new(move |s: &mut [f32]| {
            let n = producer_calls.fetch_add(1, Ordering::SeqCst) + 1;
            s.fill(n as f32);
        })));

        let mut worker = RefillWorker::spawn(Arc::clone(&refiller), Arc::clone(&trigger)).unwrap();
        refiller.refill();

        assert_eq!(pull(&mut engine, 4), vec![1.0; 4]);

        let deadline = Instant::now() + Duration::from_secs(5);
        while stats.snapshot().refills_completed < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(pull(&mut engine, 4), vec![2.0; 4]);

        worker.shutdown();
        worker.shutdown();
    }
}
