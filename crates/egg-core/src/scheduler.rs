//! Cooperative single-thread task scheduler.
//!
//! Tasks are explicit state machines resumed by the host's frame loop. A task
//! suspends by returning [`Poll::Pending`] with a [`Wake`] condition; the
//! scheduler resumes it on the first `run` whose `now` satisfies it. Tasks run
//! in spawn order within one `run`, so a task spawned earlier observes its
//! own writes before later tasks read them in the same frame.

use std::cell::Cell;
use std::rc::Rc;

/// When a suspended task wants to run again.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Wake {
    NextFrame,
    After(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Poll {
    Pending(Wake),
    Ready,
}

pub trait Task<W> {
    fn name(&self) -> &'static str;
    fn resume(&mut self, now: f64, world: &mut W) -> Poll;
}

/// Owner-side handle used to cancel a spawned task.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The task will not be resumed again, even if already due this frame.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct Entry<W> {
    id: u64,
    due: Option<f64>,
    cancelled: Rc<Cell<bool>>,
    task: Box<dyn Task<W>>,
}

pub struct Scheduler<W> {
    entries: Vec<Entry<W>>,
    next_id: u64,
}

impl<W> Default for Scheduler<W> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<W> Scheduler<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task to run on the next `run`.
    pub fn spawn(&mut self, task: impl Task<W> + 'static) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        let cancelled = Rc::new(Cell::new(false));
        log::debug!("[sched] spawn #{id} {}", task.name());
        self.entries.push(Entry {
            id,
            due: None,
            cancelled: Rc::clone(&cancelled),
            task: Box::new(task),
        });
        TaskHandle { id, cancelled }
    }

    /// Resume every due task once. Returns how many were resumed.
    pub fn run(&mut self, now: f64, world: &mut W) -> usize {
        let mut resumed = 0;
        for entry in self.entries.iter_mut() {
            if entry.cancelled.get() {
                continue;
            }
            if matches!(entry.due, Some(due) if due > now) {
                continue;
            }
            resumed += 1;
            entry.due = match entry.task.resume(now, world) {
                Poll::Pending(Wake::NextFrame) => Some(now),
                Poll::Pending(Wake::After(secs)) => Some(now + secs.max(0.0)),
                Poll::Ready => {
                    entry.cancelled.set(true);
                    continue;
                }
            };
        }
        self.entries.retain(|e| {
            let keep = !e.cancelled.get();
            if !keep {
                log::debug!("[sched] drop #{} {}", e.id, e.task.name());
            }
            keep
        });
        resumed
    }

    /// Cancel everything, e.g. when the owner is torn down.
    pub fn cancel_all(&mut self) {
        for entry in &self.entries {
            entry.cancelled.set(true);
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.cancelled.get())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
