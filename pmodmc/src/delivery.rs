//! Delivery of listener callbacks on one designated execution context.
//!
//! Completion hooks fire on whatever thread the control channel uses. The
//! [`Marshaler`] moves every listener invocation onto a single
//! [`DeliveryContext`] so that a single-threaded observer (typically a UI
//! loop) never needs its own synchronisation:
//!
//! - if the caller already runs on the context, the task runs inline;
//! - otherwise the task is queued on the context.
//!
//! Three contexts are provided:
//! - [`LoopContext`]: a dedicated delivery thread fed by a channel,
//! - [`PumpedContext`]: the thread that created it, which drains the queue
//!   itself (e.g. from its main loop),
//! - [`InlineContext`]: runs everything immediately, for tests.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

/// Unit of work scheduled on a delivery context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A single logical execution context on which listener callbacks run.
pub trait DeliveryContext: Send + Sync {
    /// True if the calling thread is the designated context.
    fn is_current(&self) -> bool;

    /// Queues `task` for later execution on the context.
    fn schedule(&self, task: Task);
}

/// Runs tasks on a [`DeliveryContext`], inline when already on it.
#[derive(Clone)]
pub struct Marshaler {
    context: Arc<dyn DeliveryContext>,
}

impl Marshaler {
    pub fn new(context: Arc<dyn DeliveryContext>) -> Self {
        Self { context }
    }

    /// Marshaler over an [`InlineContext`].
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineContext))
    }

    pub fn is_current(&self) -> bool {
        self.context.is_current()
    }

    pub fn deliver<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.context.is_current() {
            task();
        } else {
            self.context.schedule(Box::new(task));
        }
    }
}

impl fmt::Debug for Marshaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marshaler").finish_non_exhaustive()
    }
}

/// Context that is current everywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineContext;

impl DeliveryContext for InlineContext {
    fn is_current(&self) -> bool {
        true
    }

    fn schedule(&self, task: Task) {
        task();
    }
}

/// Dedicated delivery thread.
///
/// Tasks are executed in the order they are scheduled. A panicking task is
/// logged and does not stop the thread. The thread exits once the context is
/// shut down, after draining what was already queued.
pub struct LoopContext {
    name: String,
    thread_id: ThreadId,
    sender: Mutex<Option<Sender<Task>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LoopContext {
    pub fn spawn(name: &str) -> io::Result<Arc<Self>> {
        let (tx, rx) = unbounded::<Task>();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || run_delivery_loop(&thread_name, rx))?;

        debug!(thread = name, "Delivery thread started");

        Ok(Arc::new(Self {
            name: name.to_string(),
            thread_id: handle.thread().id(),
            sender: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Stops accepting tasks and waits for the queue to drain.
    ///
    /// When called from the delivery thread itself the join is skipped.
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if thread::current().id() == self.thread_id {
                return;
            }
            if handle.join().is_err() {
                error!(thread = self.name.as_str(), "Delivery thread terminated abnormally");
            }
        }
    }
}

impl DeliveryContext for LoopContext {
    fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn schedule(&self, task: Task) {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(task).is_err() {
                    warn!(thread = self.name.as_str(), "Delivery thread is gone, dropping task");
                }
            }
            None => {
                warn!(thread = self.name.as_str(), "Delivery context shut down, dropping task");
            }
        }
    }
}

impl Drop for LoopContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for LoopContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopContext")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

fn run_delivery_loop(name: &str, rx: Receiver<Task>) {
    for task in rx.iter() {
        run_task(name, task);
    }
    debug!(thread = name, "Delivery thread stopped");
}

fn run_task(name: &str, task: Task) {
    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
        error!(thread = name, "Listener panicked during delivery");
    }
}

/// Context bound to the thread that created it.
///
/// Scheduled tasks wait in a queue until that thread calls
/// [`dispatch_pending`](Self::dispatch_pending) or
/// [`dispatch_timeout`](Self::dispatch_timeout).
pub struct PumpedContext {
    owner: ThreadId,
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl PumpedContext {
    pub fn for_current_thread() -> Arc<Self> {
        let (sender, receiver) = unbounded::<Task>();
        Arc::new(Self {
            owner: thread::current().id(),
            sender,
            receiver,
        })
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Runs every queued task. Returns how many ran.
    ///
    /// Does nothing when called from another thread than the owner.
    pub fn dispatch_pending(&self) -> usize {
        if !self.is_current() {
            warn!("dispatch_pending called outside of the owning thread");
            return 0;
        }
        let mut count = 0;
        while let Ok(task) = self.receiver.try_recv() {
            run_task("pumped", task);
            count += 1;
        }
        count
    }

    /// Waits up to `timeout` for a task, then runs everything queued.
    pub fn dispatch_timeout(&self, timeout: Duration) -> usize {
        if !self.is_current() {
            warn!("dispatch_timeout called outside of the owning thread");
            return 0;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                run_task("pumped", task);
                1 + self.dispatch_pending()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }
}

impl DeliveryContext for PumpedContext {
    fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    fn schedule(&self, task: Task) {
        // both ends live in self, the send cannot fail
        let _ = self.sender.send(task);
    }
}

impl fmt::Debug for PumpedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PumpedContext")
            .field("owner", &self.owner)
            .field("pending", &self.pending())
            .finish()
    }
}
