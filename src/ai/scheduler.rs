//! Fixed worker pool fed through a bounded channel.
//!
//! A frame harvests the creatures within the AI cutoff of the player while
//! holding the world lock, releases it, queues one job per creature and
//! blocks on a condvar until every job is finished. Workers take the world
//! lock only for their own mutations.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::core::config::AiConfig;
use crate::core::types::Result;
use crate::core::Error;
use crate::world::{ObjectId, SharedWorld};

/// Per-creature work run on a pool thread
pub trait AiTask: Send + Sync {
    fn process(&self, id: ObjectId, world: &SharedWorld);
}

struct Job {
    id: ObjectId,
    world: SharedWorld,
}

/// Outstanding job counter with its completion signal
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    done: Condvar,
}

impl Pending {
    fn add(&self, n: usize) {
        *self.count.lock() += n;
    }

    fn finish(&self, n: usize) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(n);
        if *count == 0 {
            self.done.notify_all();
        }
    }

    fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.done.wait(&mut count);
        }
    }
}

/// Marks a job finished even if the task panics
struct JobGuard<'a>(&'a Pending);

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.0.finish(1);
    }
}

pub struct AiWorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    pending: Arc<Pending>,
}

impl AiWorkerPool {
    /// Spawn `workers` threads (at least one) sharing a queue of `queue_capacity` jobs
    pub fn new(workers: usize, queue_capacity: usize, task: Arc<dyn AiTask>) -> Result<Self> {
        let (sender, receiver) = bounded::<Job>(queue_capacity.max(1));
        let pending = Arc::new(Pending::default());

        let mut handles = Vec::with_capacity(workers.max(1));
        for index in 0..workers.max(1) {
            let receiver = receiver.clone();
            let task = Arc::clone(&task);
            let pending = Arc::clone(&pending);
            let handle = thread::Builder::new()
                .name(format!("umbra-ai-{index}"))
                .spawn(move || worker_loop(receiver, task, pending))?;
            handles.push(handle);
        }

        log::debug!("AI pool started with {} workers", handles.len());
        Ok(Self {
            sender: Some(sender),
            workers: handles,
            pending,
        })
    }

    pub fn from_config(config: &AiConfig, task: Arc<dyn AiTask>) -> Result<Self> {
        Self::new(config.workers, config.queue_capacity, task)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Process every creature within the AI cutoff of the player.
    /// Returns the number of creatures processed; zero without a player.
    ///
    /// Locks `world` to harvest creatures and the workers lock it for every
    /// job, so the caller must not hold the lock. A held guard on the calling
    /// thread deadlocks; a guard held elsewhere just delays the frame.
    pub fn run_frame(&self, world: &SharedWorld) -> Result<usize> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| Error::Worker("pool is shut down".to_string()))?;

        let creatures = {
            let w = world.lock();
            let Some((player, position)) = w.player().and_then(|id| w.object(id).map(|o| (id, o.position))) else {
                return Ok(0);
            };
            let mut near = w.creatures_near(position, w.config().ai.cutoff);
            near.retain(|id| *id != player);
            near
        };

        self.pending.add(creatures.len());
        for (sent, id) in creatures.iter().enumerate() {
            let job = Job { id: *id, world: Arc::clone(world) };
            if sender.send(job).is_err() {
                self.pending.finish(creatures.len() - sent);
                return Err(Error::Worker("all AI workers have exited".to_string()));
            }
        }

        self.pending.wait();
        log::trace!("AI frame processed {} creatures", creatures.len());
        Ok(creatures.len())
    }

    /// Close the queue and join every worker
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::warn!("AI worker panicked");
            }
        }
        log::debug!("AI pool stopped");
    }
}

impl Drop for AiWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: Receiver<Job>, task: Arc<dyn AiTask>, pending: Arc<Pending>) {
    for job in receiver.iter() {
        let _guard = JobGuard(&pending);
        task.process(job.id, &job.world);
    }
}
