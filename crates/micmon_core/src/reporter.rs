//! Cross-thread Error Reporting
//!
//! The reporter holds at most one current error message plus an optional
//! notification sink. The audio thread writes it, the control thread reads
//! and clears it. Both cells are `ArcSwapOption`s, so every update is a
//! single atomic pointer swap: readers see either the old message or the
//! new one, never a torn value, and nobody ever waits on a lock.
//!
//! Messages for callback status faults are allocated once, up front. The
//! audio thread only bumps a reference count to publish one.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use micmon_platform::StreamStatus;

/// Immutable, cheaply clonable error message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage(Arc<String>);

impl ErrorMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrorMessage {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Faults the real-time callback can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFault {
    InputOverflow,
    OutputUnderflow,
    DeviceError,
    CallbackPanic,
}

impl StatusFault {
    const ALL: [StatusFault; 4] = [
        StatusFault::InputOverflow,
        StatusFault::OutputUnderflow,
        StatusFault::DeviceError,
        StatusFault::CallbackPanic,
    ];

    /// Most severe fault signalled by a block's status, if any
    pub fn from_status(status: StreamStatus) -> Option<Self> {
        if status.device_error {
            Some(StatusFault::DeviceError)
        } else if status.output_underflow {
            Some(StatusFault::OutputUnderflow)
        } else if status.input_overflow {
            Some(StatusFault::InputOverflow)
        } else {
            None
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            StatusFault::InputOverflow => {
                "Audio input overflow: microphone samples were dropped"
            }
            StatusFault::OutputUnderflow => {
                "Audio output underflow: headset output was padded with silence"
            }
            StatusFault::DeviceError => "Audio device reported an error during streaming",
            StatusFault::CallbackPanic => "Audio callback failed internally; block was silenced",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

struct Sink(Box<dyn Fn(ErrorMessage) + Send + Sync>);

/// Single-slot error state shared between the control and audio threads
pub struct ErrorReporter {
    slot: ArcSwapOption<String>,
    sink: ArcSwapOption<Sink>,
    fault_messages: [Arc<String>; 4],
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("message", &self.get())
            .field("has_sink", &self.sink.load().is_some())
            .finish()
    }
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            sink: ArcSwapOption::empty(),
            fault_messages: StatusFault::ALL.map(|fault| Arc::new(fault.message().to_string())),
        }
    }

    /// Replace the current message
    pub fn set(&self, message: impl Into<String>) {
        self.slot.store(Some(Arc::new(message.into())));
    }

    pub fn get(&self) -> Option<ErrorMessage> {
        self.slot.load_full().map(ErrorMessage)
    }

    pub fn clear(&self) {
        self.slot.store(None);
    }

    /// Set the current message and forward it to the sink
    pub fn report(&self, message: impl Into<String>) {
        let message = Arc::new(message.into());
        self.slot.store(Some(Arc::clone(&message)));
        self.notify(ErrorMessage(message));
    }

    /// Publish a callback fault from the real-time thread
    ///
    /// Does not allocate. The sink runs for every call, so a persistent
    /// condition notifies once per faulting block.
    pub fn post_fault(&self, fault: StatusFault) {
        let message = &self.fault_messages[fault.index()];
        self.slot.store(Some(Arc::clone(message)));
        self.notify(ErrorMessage(Arc::clone(message)));
    }

    /// Register the notification sink
    ///
    /// The sink may be invoked on the real-time audio thread and must not
    /// block. Posting into a bounded channel with `try_send` is the intended
    /// shape.
    pub fn set_sink<F>(&self, sink: F)
    where
        F: Fn(ErrorMessage) + Send + Sync + 'static,
    {
        self.sink.store(Some(Arc::new(Sink(Box::new(sink)))));
    }

    pub fn clear_sink(&self) {
        self.sink.store(None);
    }

    fn notify(&self, message: ErrorMessage) {
        if let Some(sink) = &*self.sink.load() {
            (sink.0)(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_set_get_clear() {
        let reporter = ErrorReporter::new();
        assert!(reporter.get().is_none());

        reporter.set("device busy");
        assert_eq!(reporter.get().unwrap().as_str(), "device busy");

        reporter.clear();
        assert!(reporter.get().is_none());
    }

    #[test]
    fn test_report_notifies_sink() {
        let reporter = ErrorReporter::new();
        let (sender, receiver) = crossbeam_channel::bounded::<ErrorMessage>(4);
        reporter.set_sink(move |message| {
            let _ = sender.try_send(message);
        });

        reporter.report("Failed to open audio stream");
        assert_eq!(&*receiver.try_recv().unwrap(), "Failed to open audio stream");
        assert_eq!(&*reporter.get().unwrap(), "Failed to open audio stream");

        // Plain set does not notify
        reporter.set("quiet");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_post_fault_notifies_every_time() {
        let reporter = ErrorReporter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        reporter.set_sink(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        reporter.post_fault(StatusFault::OutputUnderflow);
        reporter.post_fault(StatusFault::OutputUnderflow);
        reporter.post_fault(StatusFault::OutputUnderflow);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(
            reporter.get().unwrap().as_str(),
            StatusFault::OutputUnderflow.message()
        );

        reporter.post_fault(StatusFault::InputOverflow);
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        assert_eq!(
            reporter.get().unwrap().as_str(),
            StatusFault::InputOverflow.message()
        );

        reporter.clear();
        reporter.post_fault(StatusFault::InputOverflow);
        assert_eq!(calls.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_clear_sink() {
        let reporter = ErrorReporter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        reporter.set_sink(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        reporter.clear_sink();

        reporter.report("nobody listening");
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert!(reporter.get().is_some());
    }

    #[test]
    fn test_fault_from_status_priority() {
        assert_eq!(StatusFault::from_status(StreamStatus::default()), None);

        let all = StreamStatus {
            input_overflow: true,
            output_underflow: true,
            device_error: true,
        };
        assert_eq!(StatusFault::from_status(all), Some(StatusFault::DeviceError));

        let xruns = StreamStatus {
            input_overflow: true,
            output_underflow: true,
            device_error: false,
        };
        assert_eq!(
            StatusFault::from_status(xruns),
            Some(StatusFault::OutputUnderflow)
        );
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        let reporter = Arc::new(ErrorReporter::new());
        let audio = {
            let reporter = Arc::clone(&reporter);
            thread::spawn(move || {
                for i in 0..1000 {
                    let fault = if i % 2 == 0 {
                        StatusFault::InputOverflow
                    } else {
                        StatusFault::OutputUnderflow
                    };
                    reporter.post_fault(fault);
                }
            })
        };

        for _ in 0..1000 {
            reporter.set("control thread message");
            if let Some(message) = reporter.get() {
                assert!(
                    message.as_str() == "control thread message"
                        || message.as_str() == StatusFault::InputOverflow.message()
                        || message.as_str() == StatusFault::OutputUnderflow.message()
                );
            }
            reporter.clear();
        }

        audio.join().unwrap();
    }
}
