/// Deadline-based one-shot tasks, keyed on scene time in seconds.
///
/// A `Timers` value lives inside the state that scheduled it; replacing the
/// state drops every pending task with it, so nothing fires into a later state.
#[derive(Debug, Clone, PartialEq)]
pub struct Timers<T> {
    pending: Vec<(f64, T)>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: f64, task: T) {
        // Keep sorted by deadline; equal deadlines keep insertion order
        let index = self.pending.partition_point(|(at, _)| *at <= deadline);
        self.pending.insert(index, (deadline, task));
    }

    pub fn schedule_after(&mut self, now: f64, delay: f64, task: T) {
        self.schedule(now + delay.max(0.0), task);
    }

    /// Remove and return every task whose deadline is <= `now`, earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<T> {
        let due = self.pending.partition_point(|(at, _)| *at <= now);
        self.pending.drain(..due).map(|(_, task)| task).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_tasks_come_out_in_deadline_order() {
        let mut timers = Timers::new();
        timers.schedule(15.0, "reset");
        timers.schedule_after(0.0, 0.9, "start");
        timers.schedule(0.9, "start-again");

        assert!(timers.take_due(0.5).is_empty());
        assert_eq!(timers.take_due(1.0), vec!["start", "start-again"]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.take_due(20.0), vec!["reset"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn negative_delay_fires_immediately() {
        let mut timers = Timers::new();
        timers.schedule_after(3.0, -1.0, 7);
        assert_eq!(timers.take_due(3.0), vec![7]);
    }
}
