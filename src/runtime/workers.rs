//! Worker threads for the threaded scheduler
//!
//! Three tasks run beside the frame loop:
//! - simulation: runs the entity update pass. The registry is moved to it by
//!   value and moved back, so only one side ever touches it.
//! - autopilot: turns ball snapshots into `ControlEvent::PaddleTarget`.
//! - timer: emits `ControlEvent::TimerTick` once per period.
//!
//! Every channel is owned by exactly one sender on the main side. Dropping
//! those senders is the shutdown signal; each worker sees its receive fail,
//! returns, and is joined.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::error::{GameError, Result};
use crate::sim::{AutopilotQuery, ControlEvent, GameEvent, Manager, UpdateContext, UpdateDriver};

type UpdateRequest = (Manager, UpdateContext);
type UpdateReply = (Manager, Vec<GameEvent>);

fn spawn_named<F>(name: &'static str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(format!("arkanoid-{name}"))
        .spawn(body)
        .map_err(|source| GameError::WorkerSpawn { name, source })?;
    log::debug!("Spawned {} worker", name);
    Ok(handle)
}

fn join_named(name: &'static str, handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        match handle.join() {
            Ok(()) => log::debug!("Joined {} worker", name),
            Err(_) => log::error!("{} worker panicked", name),
        }
    }
}

/// Runs `Manager::update` off the main thread, one frame at a time
#[derive(Debug)]
pub struct SimulationWorker {
    requests: Option<Sender<UpdateRequest>>,
    replies: Receiver<UpdateReply>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationWorker {
    const NAME: &'static str = "simulation";

    pub fn spawn() -> Result<Self> {
        let (requests, request_rx) = flume::bounded::<UpdateRequest>(1);
        let (reply_tx, replies) = flume::bounded::<UpdateReply>(1);
        let handle = spawn_named(Self::NAME, move || {
            while let Ok((mut manager, ctx)) = request_rx.recv() {
                let mut events = Vec::new();
                manager.update(&ctx, &mut events);
                if reply_tx.send((manager, events)).is_err() {
                    break;
                }
            }
        })?;
        Ok(Self {
            requests: Some(requests),
            replies,
            handle: Some(handle),
        })
    }

    pub fn shutdown(&mut self) {
        self.requests = None;
        join_named(Self::NAME, self.handle.take());
    }
}

impl UpdateDriver for SimulationWorker {
    fn update(&mut self, manager: &mut Manager, ctx: &UpdateContext) -> Result<Vec<GameEvent>> {
        let requests = self
            .requests
            .as_ref()
            .ok_or(GameError::WorkerDisconnected(Self::NAME))?;

        let owned = std::mem::take(manager);
        if let Err(flume::SendError((returned, _))) = requests.send((owned, *ctx)) {
            *manager = returned;
            return Err(GameError::WorkerDisconnected(Self::NAME));
        }

        let (updated, events) = self
            .replies
            .recv()
            .map_err(|_| GameError::WorkerDisconnected(Self::NAME))?;
        *manager = updated;
        Ok(events)
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Predicts paddle targets from ball snapshots
#[derive(Debug)]
pub struct AutopilotWorker {
    queries: Option<Sender<AutopilotQuery>>,
    handle: Option<JoinHandle<()>>,
}

impl AutopilotWorker {
    const NAME: &'static str = "autopilot";

    pub fn spawn(controls: Sender<ControlEvent>) -> Result<Self> {
        let (queries, query_rx) = flume::bounded::<AutopilotQuery>(1);
        let handle = spawn_named(Self::NAME, move || {
            while let Ok(query) = query_rx.recv() {
                let Some(x) = query.predict() else {
                    continue;
                };
                if controls.send(ControlEvent::PaddleTarget(x)).is_err() {
                    break;
                }
            }
        })?;
        Ok(Self {
            queries: Some(queries),
            handle: Some(handle),
        })
    }

    /// Hand over a snapshot; dropped if the worker is still busy with the last one
    pub fn submit(&self, query: AutopilotQuery) -> Result<()> {
        let queries = self
            .queries
            .as_ref()
            .ok_or(GameError::WorkerDisconnected(Self::NAME))?;
        match queries.try_send(query) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(GameError::WorkerDisconnected(Self::NAME)),
        }
    }

    pub fn shutdown(&mut self) {
        self.queries = None;
        join_named(Self::NAME, self.handle.take());
    }
}

impl Drop for AutopilotWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Counts down stage time
#[derive(Debug)]
pub struct TimerWorker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TimerWorker {
    const NAME: &'static str = "timer";

    pub fn spawn(period: Duration, controls: Sender<ControlEvent>) -> Result<Self> {
        let (stop, stop_rx) = flume::bounded::<()>(1);
        let handle = spawn_named(Self::NAME, move || {
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        if controls.send(ControlEvent::TimerTick).is_err() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn shutdown(&mut self) {
        self.stop = None;
        join_named(Self::NAME, self.handle.take());
    }
}

impl Drop for TimerWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// All three workers plus the control channel they report on
#[derive(Debug)]
pub struct Workers {
    pub simulation: SimulationWorker,
    pub autopilot: AutopilotWorker,
    pub timer: TimerWorker,
    controls: Receiver<ControlEvent>,
}

impl Workers {
    pub fn spawn(timer_period: Duration) -> Result<Self> {
        let (control_tx, controls) = flume::unbounded();
        let workers = Self {
            simulation: SimulationWorker::spawn()?,
            autopilot: AutopilotWorker::spawn(control_tx.clone())?,
            timer: TimerWorker::spawn(timer_period, control_tx)?,
            controls,
        };
        log::info!("Runtime workers started (timer period {:?})", timer_period);
        Ok(workers)
    }

    /// Everything the timer and autopilot sent since the last call
    pub fn drain_controls(&self) -> Vec<ControlEvent> {
        self.controls.try_iter().collect()
    }

    /// Signal every worker and wait for it; safe to call twice
    pub fn shutdown(&mut self) {
        self.simulation.shutdown();
        self.autopilot.shutdown();
        self.timer.shutdown();
    }
}
