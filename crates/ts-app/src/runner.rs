//! Timer-driven engine host.
//!
//! [`EngineRunner`] owns a [`TitrationEngine`] and a timer thread that ticks
//! it at the configured period while a run is active. After every mutation
//! the engine's state is published as an immutable [`EngineView`]. Readers
//! (a UI poll loop, a progress printer) only ever clone the latest
//! `Arc<EngineView>`, so a slow reader never holds up a tick and never sees
//! a half-applied one.

use crate::engine::{EngineSnapshot, EngineView, TitrationEngine, save_record};
use crate::error::{AppError, AppResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use ts_chem::{IndicatorKind, SolutionState};
use ts_core::units::{in_seconds, millis};
use ts_results::{ExperimentRecord, ExperimentStore};
use ts_sim::{Clock, StartOutcome, SystemClock, TickOutcome, TitrationPoint};

type Published = Arc<RwLock<Arc<EngineView>>>;

struct Shared<C: Clock> {
    engine: Mutex<TitrationEngine<C>>,
    view: Published,
}

impl<C: Clock> Shared<C> {
    fn lock(&self) -> MutexGuard<'_, TitrationEngine<C>> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the published view. Called with the engine lock held so views
    /// appear in mutation order.
    fn publish(&self, engine: &TitrationEngine<C>) {
        let next = {
            let current = latest(&self.view);
            Arc::new(engine.view_after(Some(&current)))
        };
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

fn latest(view: &RwLock<Arc<EngineView>>) -> Arc<EngineView> {
    Arc::clone(&*view.read().unwrap_or_else(PoisonError::into_inner))
}

struct Timer {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Outcome of a background save.
#[derive(Debug)]
pub enum SaveMessage {
    Saved { id: String, name: String },
    Failed { message: String },
}

pub struct EngineRunner<C: Clock + 'static = SystemClock> {
    shared: Arc<Shared<C>>,
    timer: Option<Timer>,
}

/// Read-only handle for other threads. Never touches the engine itself.
#[derive(Clone)]
pub struct EngineReader {
    view: Published,
}

impl EngineReader {
    pub fn view(&self) -> Arc<EngineView> {
        latest(&self.view)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.view().snapshot.clone()
    }

    pub fn titration_points(&self) -> Vec<TitrationPoint> {
        self.view().points.to_vec()
    }
}

impl<C: Clock + 'static> EngineRunner<C> {
    pub fn new(engine: TitrationEngine<C>) -> Self {
        let view = Arc::new(RwLock::new(Arc::new(engine.view())));
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                view,
            }),
            timer: None,
        }
    }

    pub fn reader(&self) -> EngineReader {
        EngineReader {
            view: Arc::clone(&self.shared.view),
        }
    }

    /// The engine as of its last mutation.
    pub fn view(&self) -> Arc<EngineView> {
        latest(&self.shared.view)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.view().snapshot.clone()
    }

    pub fn is_dispensing(&self) -> bool {
        self.view().snapshot.dispensing
    }

    pub fn current_state(&self) -> SolutionState {
        self.view().snapshot.state.clone()
    }

    pub fn current_ph(&self) -> f64 {
        self.view().snapshot.ph
    }

    pub fn titration_points(&self) -> Vec<TitrationPoint> {
        self.view().points.to_vec()
    }

    /// Start dispensing and the timer thread.
    ///
    /// A second call while a run is active changes nothing. A tick period
    /// too long to schedule is rejected before anything starts.
    pub fn start(&mut self) -> AppResult<StartOutcome> {
        let (outcome, period) = {
            let mut engine = self.shared.lock();
            let period = tick_period(engine.dispense_config().tick_period_ms)?;
            let outcome = engine.start();
            self.shared.publish(&engine);
            (outcome, period)
        };
        if outcome != StartOutcome::Started {
            return Ok(outcome);
        }

        // A previous run that completed on its own leaves a finished thread.
        self.join_timer();

        let stop = Arc::new(AtomicBool::new(false));
        let shared = Arc::clone(&self.shared);
        let thread_stop = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name("titration-timer".to_string())
            .spawn(move || run_timer(&shared, &thread_stop, period));

        match spawned {
            Ok(handle) => {
                self.timer = Some(Timer { stop, handle });
                Ok(outcome)
            }
            Err(e) => {
                self.mutate(TitrationEngine::stop);
                Err(e.into())
            }
        }
    }

    /// Stop dispensing. No tick is processed after this returns.
    pub fn stop(&mut self) -> bool {
        if let Some(timer) = &self.timer {
            timer.stop.store(true, Ordering::SeqCst);
        }
        let stopped = self.mutate(TitrationEngine::stop);
        self.join_timer();
        stopped
    }

    pub fn reset(&mut self) {
        self.stop();
        self.mutate(TitrationEngine::reset);
    }

    pub fn set_indicator(&mut self, indicator: IndicatorKind) {
        self.mutate(|e| e.set_indicator(indicator));
    }

    /// Stop the timer thread. The engine stays readable; `start` may be
    /// called again.
    pub fn dispose(&mut self) {
        if self.stop() {
            tracing::debug!("runner disposed with an active run");
        }
    }

    /// Save a record copied out under the engine lock. Storage I/O runs
    /// after the lock is released, so a slow store never delays ticks.
    pub fn save(&self, store: &dyn ExperimentStore, name: &str) -> AppResult<ExperimentRecord> {
        let record = self.shared.lock().to_record(name);
        save_record(store, &record)?;
        Ok(record)
    }

    /// Like [`save`](Self::save), but the store is called on its own thread.
    /// The result arrives on the returned channel.
    pub fn save_in_background(
        &self,
        store: Arc<dyn ExperimentStore>,
        name: &str,
    ) -> Receiver<SaveMessage> {
        let record = self.shared.lock().to_record(name);
        let (tx, rx) = channel();
        thread::spawn(move || {
            let message = match save_record(store.as_ref(), &record) {
                Ok(()) => SaveMessage::Saved {
                    id: record.id,
                    name: record.name,
                },
                Err(e) => SaveMessage::Failed {
                    message: e.to_string(),
                },
            };
            let _ = tx.send(message);
        });
        rx
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut TitrationEngine<C>) -> R) -> R {
        let mut engine = self.shared.lock();
        let out = f(&mut *engine);
        self.shared.publish(&engine);
        out
    }

    fn join_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop.store(true, Ordering::SeqCst);
            if timer.handle.join().is_err() {
                tracing::warn!("titration timer thread panicked");
            }
        }
    }
}

impl<C: Clock + 'static> Drop for EngineRunner<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn tick_period(period_ms: f64) -> AppResult<Duration> {
    Duration::try_from_secs_f64(in_seconds(millis(period_ms))).map_err(|e| {
        AppError::Configuration(format!(
            "tick period of {period_ms} ms cannot be scheduled: {e}"
        ))
    })
}

fn run_timer<C: Clock>(shared: &Shared<C>, stop: &AtomicBool, period: Duration) {
    tracing::debug!(period_ms = period.as_millis() as u64, "timer started");
    loop {
        thread::sleep(period);
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let outcome = {
            let mut engine = shared.lock();
            let outcome = engine.tick();
            shared.publish(&engine);
            outcome
        };
        match outcome {
            TickOutcome::Advanced(_) => {}
            TickOutcome::Completed(_) | TickOutcome::Idle => break,
        }
    }
    tracing::debug!("timer stopped");
}
