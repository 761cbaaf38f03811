//! Real-time Callback Processor
//!
//! The handler object the backend invokes once per block. It holds shared
//! references to the two pieces of state that cross the thread boundary:
//! the control values (`EngineConfig`, read) and the error slot
//! (`ErrorReporter`, written). Nothing else is reachable from the audio
//! thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use micmon_platform::{BlockHandler, StreamStatus};

use crate::config::EngineConfig;
use crate::reporter::{ErrorReporter, StatusFault};

/// Applies linear gain from input to output and reports status faults
pub struct CallbackProcessor {
    config: Arc<EngineConfig>,
    errors: Arc<ErrorReporter>,
}

impl CallbackProcessor {
    pub fn new(config: Arc<EngineConfig>, errors: Arc<ErrorReporter>) -> Self {
        Self { config, errors }
    }

    #[inline]
    fn render(&self, input: &[f32], output: &mut [f32], status: StreamStatus) {
        let gain = self.config.gain();

        let frames = input.len().min(output.len());
        for (out, sample) in output[..frames].iter_mut().zip(input) {
            *out = *sample * gain;
        }
        output[frames..].fill(0.0);

        if let Some(fault) = StatusFault::from_status(status) {
            self.errors.post_fault(fault);
        }
    }
}

impl BlockHandler for CallbackProcessor {
    fn process(&mut self, input: &[f32], output: &mut [f32], status: StreamStatus) {
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            self.render(input, output, status);
        }));

        // Last resort: the panic hook has already run on this thread
        if rendered.is_err() {
            output.fill(0.0);
            let errors = &self.errors;
            let _ = panic::catch_unwind(AssertUnwindSafe(|| {
                errors.post_fault(StatusFault::CallbackPanic);
            }));
        }
    }
}
