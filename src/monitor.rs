// Copyright 2026 xfercore contributors.

//! Progress and counter reporting, independent of any particular UI.
//!
//! A [`Monitor`] is handed into the enumerator and traversers so they can
//! report scan progress without depending on how (or whether) it's
//! displayed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

use strum::{EnumCount, EnumIter};

/// Named counters the enumeration pipeline increments as it runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumCount, EnumIter)]
#[repr(usize)]
pub enum Counter {
    ObjectsScanned,
    ObjectsFiltered,
    TransfersQueued,
    PartsDispatched,
    ContainersCreated,
    ContainersSkipped,
    SymlinkCyclesSkipped,
    DeletionsQueued,
}

/// Lock-free counters, one per [`Counter`] variant.
pub struct Counters {
    values: [AtomicUsize; Counter::COUNT],
}

impl Default for Counters {
    fn default() -> Self {
        Counters {
            values: std::array::from_fn(|_| AtomicUsize::new(0)),
        }
    }
}

impl Counters {
    pub fn count(&self, counter: Counter, increment: usize) {
        self.values[counter as usize].fetch_add(increment, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> usize {
        self.values[counter as usize].load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("Counters");
        for counter in <Counter as strum::IntoEnumIterator>::iter() {
            dbg.field(&format!("{counter:?}"), &self.get(counter));
        }
        dbg.finish()
    }
}

/// A problem encountered during enumeration, reported to the monitor
/// rather than immediately aborting, so the caller decides whether it's
/// fatal.
#[derive(Debug)]
pub enum Problem {
    Error(crate::error::Error),
}

/// State behind a [`Task`] handle; monitors hold only [`Weak`]
/// references so a dropped task disappears from progress display
/// without explicit deregistration.
#[derive(Debug)]
struct TaskState {
    name: RwLock<String>,
    total: AtomicUsize,
    done: AtomicUsize,
}

/// A named unit of progress with a total and a done count.
#[derive(Clone, Debug)]
pub struct Task(Arc<TaskState>);

impl Task {
    fn new(name: String) -> Self {
        Task(Arc::new(TaskState {
            name: RwLock::new(name),
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }))
    }

    pub fn set_total(&self, total: usize) {
        self.0.total.store(total, Ordering::Relaxed);
    }

    pub fn set_done(&self, done: usize) {
        self.0.done.store(done, Ordering::Relaxed);
    }

    pub fn increment(&self, by: usize) {
        self.0.done.fetch_add(by, Ordering::Relaxed);
    }

    pub fn set_name(&self, name: String) {
        *self.0.name.write().unwrap() = name;
    }

    pub fn name(&self) -> String {
        self.0.name.read().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.0.total.load(Ordering::Relaxed)
    }

    pub fn done(&self) -> usize {
        self.0.done.load(Ordering::Relaxed)
    }

    pub fn percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            100.0 * self.done() as f64 / total as f64
        }
    }

    fn downgrade(&self) -> Weak<TaskState> {
        Arc::downgrade(&self.0)
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}/{}, {:.1}%", self.name(), self.done(), self.total(), self.percent())
    }
}

/// The live set of active tasks, pruned of any whose [`Task`] handle has
/// been dropped.
#[derive(Default)]
pub struct TaskList {
    tasks: std::sync::Mutex<Vec<Weak<TaskState>>>,
}

impl TaskList {
    pub fn start_task(&self, name: String) -> Task {
        let task = Task::new(name);
        self.tasks.lock().unwrap().push(task.downgrade());
        task
    }

    pub fn active_tasks(&self) -> Vec<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.retain(|weak| weak.strong_count() > 0);
        tasks.iter().filter_map(|weak| weak.upgrade().map(Task)).collect()
    }
}

/// Reported by the core to whatever is driving progress display; backed
/// by [`Counters`] and [`TaskList`] for the common case but implementable
/// by anything (a test double, a nutmeg-driven terminal UI).
pub trait Monitor: Send + Sync + 'static {
    fn count(&self, counter: Counter, increment: usize);
    fn set_counter(&self, counter: Counter, value: usize);
    fn problem(&self, problem: Problem);
    fn start_task(&self, name: String) -> Task;
}

/// A concrete [`Monitor`] combining [`Counters`] and [`TaskList`],
/// suitable for both the CLI binary and tests that want to inspect
/// final counter values.
#[derive(Default)]
pub struct StandardMonitor {
    counters: Counters,
    tasks: TaskList,
    problems: std::sync::Mutex<Vec<Problem>>,
}

impl StandardMonitor {
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn problems(&self) -> std::sync::MutexGuard<'_, Vec<Problem>> {
        self.problems.lock().unwrap()
    }
}

impl Monitor for StandardMonitor {
    fn count(&self, counter: Counter, increment: usize) {
        self.counters.count(counter, increment);
    }

    fn set_counter(&self, counter: Counter, value: usize) {
        self.counters.values[counter as usize].store(value, Ordering::Relaxed);
    }

    fn problem(&self, problem: Problem) {
        self.problems.lock().unwrap().push(problem);
    }

    fn start_task(&self, name: String) -> Task {
        self.tasks.start_task(name)
    }
}

/// Discards everything; useful when a caller has no interest in
/// progress.
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn count(&self, _counter: Counter, _increment: usize) {}
    fn set_counter(&self, _counter: Counter, _value: usize) {}
    fn problem(&self, _problem: Problem) {}
    fn start_task(&self, name: String) -> Task {
        Task::new(name)
    }
}
