//! Message-passing relay between visitation workers and a progress sink
//!
//! Workers hold a [`ProgressReporter`] and send the index of each finished
//! row or column over a channel. A relay thread owns the sink for the
//! duration of the run and forwards those messages in arrival order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};

use pointdata_core::ProgressSink;

/// Worker-side handle for reporting finished subtasks
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<Sender<usize>>,
}

impl ProgressReporter {
    /// Reporter that drops every message
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Report one finished subtask
    #[inline]
    pub fn finished(&self, index: usize) {
        if let Some(sender) = &self.sender {
            // The relay only stops receiving after every reporter is gone
            let _ = sender.send(index);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }
}

/// Run `work` while relaying its progress to `progress`
///
/// `set_subtasks(subtasks)` is called before `work` starts and
/// `set_finished()` exactly once after it returns and every message has been
/// forwarded. Without a sink no channel or relay thread is created. A panic
/// in `work` is propagated after the relay shuts down, without calling
/// `set_finished()`.
pub fn with_progress<R, F>(progress: Option<&mut dyn ProgressSink>, subtasks: usize, work: F) -> R
where
    F: FnOnce(&ProgressReporter) -> R,
{
    let Some(sink) = progress else {
        return work(&ProgressReporter::disabled());
    };

    sink.set_subtasks(subtasks);
    let (sender, receiver) = mpsc::channel::<usize>();

    let (outcome, relayed) = std::thread::scope(|scope| {
        let relay = scope.spawn(move || {
            for index in receiver {
                sink.subtask_finished(index);
            }
            sink
        });

        let reporter = ProgressReporter {
            sender: Some(sender),
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&reporter)));
        drop(reporter);
        (outcome, relay.join())
    });

    let value = match outcome {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    };
    match relayed {
        Ok(sink) => sink.set_finished(),
        Err(payload) => panic::resume_unwind(payload),
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointdata_core::CountingProgress;
    use rayon::prelude::*;

    #[derive(Default)]
    struct RecordingSink {
        subtasks: Option<usize>,
        indices: Vec<usize>,
        finished: usize,
    }

    impl ProgressSink for RecordingSink {
        fn set_subtasks(&mut self, count: usize) {
            assert!(self.indices.is_empty());
            self.subtasks = Some(count);
        }

        fn subtask_finished(&mut self, index: usize) {
            self.indices.push(index);
        }

        fn set_finished(&mut self) {
            self.finished += 1;
        }
    }

    #[test]
    fn test_relay_forwards_every_index() {
        let mut sink = RecordingSink::default();
        let sum = with_progress(Some(&mut sink), 100, |reporter| {
            (0..100usize)
                .into_par_iter()
                .map(|i| {
                    reporter.finished(i);
                    i
                })
                .sum::<usize>()
        });

        assert_eq!(sum, 4950);
        assert_eq!(sink.subtasks, Some(100));
        assert_eq!(sink.finished, 1);
        sink.indices.sort_unstable();
        assert_eq!(sink.indices, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_no_sink_is_silent() {
        let value = with_progress(None, 10, |reporter| {
            assert!(!reporter.is_enabled());
            reporter.finished(3);
            42
        });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_panic_propagates_without_finishing() {
        let mut sink = CountingProgress::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            with_progress(Some(&mut sink), 2, |reporter| {
                reporter.finished(0);
                panic!("worker failed");
            })
        }));
        assert!(result.is_err());
        assert_eq!(sink.finished_calls, 0);
        assert_eq!(sink.finished_subtasks, 1);
    }
}
