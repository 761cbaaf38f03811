//! Scripted backend for exercising the engine without audio hardware

use std::sync::{Arc, Mutex};

use micmon_platform::{
    AudioBackend, BlockHandler, DuplexConfig, DuplexStream, PlatformError, StreamStatus,
};

/// Calls observed by the mock backend
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    pub opened: Vec<DuplexConfig>,
    pub starts: usize,
    pub stops: usize,
    pub closes: usize,
}

#[derive(Default)]
struct MockState {
    log: MockLog,
    handler: Option<Box<dyn BlockHandler>>,
    playing: bool,
    fail_open: Option<PlatformError>,
    fail_start: Option<PlatformError>,
    fail_stop: Option<PlatformError>,
    fail_close: Option<PlatformError>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_open(&self, err: Option<PlatformError>) {
        self.state.lock().unwrap().fail_open = err;
    }

    pub fn set_fail_start(&self, err: Option<PlatformError>) {
        self.state.lock().unwrap().fail_start = err;
    }

    pub fn set_fail_stop(&self, err: Option<PlatformError>) {
        self.state.lock().unwrap().fail_stop = err;
    }

    pub fn set_fail_close(&self, err: Option<PlatformError>) {
        self.state.lock().unwrap().fail_close = err;
    }

    pub fn log(&self) -> MockLog {
        self.state.lock().unwrap().log.clone()
    }

    /// Whether a handler is still held by an open stream
    pub fn has_handler(&self) -> bool {
        self.state.lock().unwrap().handler.is_some()
    }

    /// Drive one block through the live handler, as the audio thread would
    ///
    /// Returns `false` when no started stream exists.
    pub fn run_block(&self, input: &[f32], output: &mut [f32], status: StreamStatus) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.playing {
            return false;
        }
        match state.handler.as_mut() {
            Some(handler) => {
                handler.process(input, output, status);
                true
            }
            None => false,
        }
    }
}

impl AudioBackend for MockBackend {
    type Stream = MockStream;

    fn name(&self) -> &str {
        "mock"
    }

    fn open_duplex<H: BlockHandler>(
        &mut self,
        config: &DuplexConfig,
        handler: H,
    ) -> Result<Self::Stream, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.log.opened.push(*config);
        if let Some(err) = state.fail_open.clone() {
            return Err(err);
        }
        state.handler = Some(Box::new(handler));
        Ok(MockStream {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockStream {
    state: Arc<Mutex<MockState>>,
}

impl DuplexStream for MockStream {
    fn start(&mut self) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.log.starts += 1;
        if let Some(err) = state.fail_start.clone() {
            return Err(err);
        }
        state.playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.log.stops += 1;
        state.playing = false;
        match state.fail_stop.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn close(self) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.log.closes += 1;
        state.playing = false;
        state.handler = None;
        match state.fail_close.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
