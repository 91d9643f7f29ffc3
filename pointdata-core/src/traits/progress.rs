//! Progress reporting interface for long-running visitation

/// Receiver of progress notifications
///
/// Calls arrive from a single relay thread, never from visitation workers.
/// Subtask indices are row or column indices and may arrive in any order.
pub trait ProgressSink: Send {
    /// Announce the number of subtasks, once before any work starts
    fn set_subtasks(&mut self, count: usize);

    /// One subtask completed
    fn subtask_finished(&mut self, index: usize);

    /// All work completed, called exactly once
    fn set_finished(&mut self);
}

/// Sink that records how many notifications it received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountingProgress {
    pub subtasks: usize,
    pub finished_subtasks: usize,
    pub finished_calls: usize,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every announced subtask finished and the run completed once
    pub fn is_complete(&self) -> bool {
        self.finished_calls == 1 && self.finished_subtasks == self.subtasks
    }
}

impl ProgressSink for CountingProgress {
    fn set_subtasks(&mut self, count: usize) {
        self.subtasks = count;
    }

    fn subtask_finished(&mut self, _index: usize) {
        self.finished_subtasks += 1;
    }

    fn set_finished(&mut self) {
        self.finished_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_progress() {
        let mut sink = CountingProgress::new();
        sink.set_subtasks(2);
        sink.subtask_finished(1);
        assert!(!sink.is_complete());
        sink.subtask_finished(0);
        sink.set_finished();
        assert!(sink.is_complete());
    }
}
