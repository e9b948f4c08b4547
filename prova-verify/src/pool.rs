use std::future::Future;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::debug;

/// Multi-threaded runtime whose workers have an explicitly sized stack.
///
/// VC generation recurses deeply on large bodies, so verification units run
/// here instead of on the caller's runtime.
#[derive(Debug)]
pub struct LargeStackRuntime {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl LargeStackRuntime {
    pub fn new(threads: usize, stack_size: usize) -> io::Result<Self> {
        let threads = threads.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads)
            .max_blocking_threads(threads)
            .thread_stack_size(stack_size)
            .thread_name("prova-verify")
            .enable_time()
            .build()?;
        debug!(threads, stack_size, "started verification runtime");
        let handle = runtime.handle().clone();
        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(fut)
    }

    /// Runs `fut` to completion from synchronous code. Must not be called
    /// from inside an async context.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.handle.block_on(fut)
    }
}

impl Drop for LargeStackRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Idle solver sessions waiting to be reused.
///
/// A checked-out session belongs to exactly one unit until it is given back
/// or discarded.
#[derive(Debug)]
pub struct SessionPool<S> {
    idle: Mutex<Vec<S>>,
    opened: AtomicUsize,
}

impl<S> Default for SessionPool<S> {
    fn default() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
        }
    }
}

impl<S> SessionPool<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// An idle session if there is one, otherwise a new one from `open`.
    pub fn checkout<E>(&self, open: impl FnOnce() -> Result<S, E>) -> Result<S, E> {
        if let Some(session) = self.lock().pop() {
            return Ok(session);
        }
        let session = open()?;
        self.opened.fetch_add(1, Ordering::Relaxed);
        Ok(session)
    }

    pub fn give_back(&self, session: S) {
        self.lock().push(session);
    }

    /// Drops a session that must not be reused.
    pub fn discard(&self, session: S) {
        drop(session);
    }

    /// Drops every idle session; returns how many were released.
    pub fn clear(&self) -> usize {
        let drained: Vec<S> = self.lock().drain(..).collect();
        drained.len()
    }

    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    /// Sessions opened over the pool's lifetime.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<S>> {
        match self.idle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
