use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

pub type SharedSink = Arc<Mutex<Box<dyn Write + Send>>>;

pub fn stdout_sink() -> SharedSink {
    Arc::new(Mutex::new(Box::new(io::stdout())))
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug)]
struct CollectorState {
    outputs: Vec<Option<String>>,
    next: usize,
}

/// Buffers per-implementation output and writes it in submission order.
///
/// Slot `i` holds the output of the `i`-th selected implementation. Output
/// is written only once every earlier slot has been written.
pub struct OutputCollector {
    state: Mutex<CollectorState>,
    sink: SharedSink,
}

impl OutputCollector {
    pub fn new(slots: usize, sink: SharedSink) -> Self {
        Self {
            state: Mutex::new(CollectorState {
                outputs: vec![None; slots],
                next: 0,
            }),
            sink,
        }
    }

    /// Stores the output for slot `index`. Out-of-range slots are ignored.
    pub fn add(&self, index: usize, output: String) {
        let mut state = lock(&self.state);
        if let Some(slot) = state.outputs.get_mut(index) {
            *slot = Some(output);
        }
    }

    /// Writes every output that is next in line; returns how many slots were
    /// flushed.
    pub fn write_more_output(&self) -> io::Result<usize> {
        let mut state = lock(&self.state);
        let mut sink = lock(&self.sink);
        let mut written = 0;
        while state.next < state.outputs.len() {
            let next = state.next;
            let Some(text) = state.outputs[next].take() else {
                break;
            };
            sink.write_all(text.as_bytes())?;
            state.next += 1;
            written += 1;
        }
        if written > 0 {
            sink.flush()?;
        }
        Ok(written)
    }

    /// Number of slots already written.
    pub fn flushed(&self) -> usize {
        lock(&self.state).next
    }

    pub fn len(&self) -> usize {
        lock(&self.state).outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for OutputCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCollector")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

/// An in-memory sink that can be read back after writing.
#[derive(Clone, Debug, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> SharedSink {
        Arc::new(Mutex::new(Box::new(self.clone())))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buffer)).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.buffer).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
