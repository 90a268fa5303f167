//! Execution contexts for completion callbacks

use tokio::sync::mpsc;

/// A unit of work handed to an [`Executor`]
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Chooses where a completion callback runs
pub trait Executor: Send + Sync + 'static {
    /// Run `task`, now or later, exactly once
    fn execute(&self, task: Task);
}

/// Runs callbacks on the task that completed the request
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Executor for Immediate {
    fn execute(&self, task: Task) {
        task()
    }
}

/// Runs each callback on the blocking pool of a tokio runtime
impl Executor for tokio::runtime::Handle {
    fn execute(&self, task: Task) {
        self.spawn_blocking(task);
    }
}

/// Posts callbacks to a queue drained by one thread
///
/// This is how results get back to a thread that owns some state, such as a
/// UI or event loop: dispatch with the executor, and let that thread drive
/// the matching [`ExecutorLoop`].
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    sender: mpsc::UnboundedSender<Task>,
}

/// Receiving side of a [`ChannelExecutor`]
#[derive(Debug)]
pub struct ExecutorLoop {
    receiver: mpsc::UnboundedReceiver<Task>,
}

impl ChannelExecutor {
    /// Create an executor and the loop that runs its callbacks
    pub fn channel() -> (ChannelExecutor, ExecutorLoop) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelExecutor { sender }, ExecutorLoop { receiver })
    }
}

impl Executor for ChannelExecutor {
    fn execute(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!("executor loop is gone, dropping callback");
        }
    }
}

impl ExecutorLoop {
    /// Run the next callback, blocking the current thread until one arrives
    ///
    /// Returns `false` once every [`ChannelExecutor`] has been dropped and the
    /// queue is empty. Must not be called from async code.
    pub fn run_one(&mut self) -> bool {
        match self.receiver.blocking_recv() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run the next callback from async code
    pub async fn run_one_async(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run every callback already queued without waiting, returning how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run callbacks until every executor is dropped
    pub fn run(mut self) {
        while self.run_one() {}
    }
}
