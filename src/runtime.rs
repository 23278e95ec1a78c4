//! Cooperative single-threaded task queue.
//!
//! The host owns a [`Scheduler`] and drives it: it drains microtasks after
//! every event, pulls frame tasks once per rendering frame, and advances the
//! virtual clock so timers can fire. Nothing in here blocks or spawns.

use std::collections::VecDeque;
use std::time::Duration;

/// Handle for a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    deadline: Duration,
    task: T,
}

/// Queue of deferred work: microtasks, frame callbacks and timers.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use chatpane::runtime::Scheduler;
///
/// let mut tasks = Scheduler::new();
/// tasks.queue_microtask("flush");
/// let timer = tasks.set_timeout(Duration::from_millis(20), "late");
/// assert_eq!(tasks.drain_microtasks(), vec!["flush"]);
/// tasks.cancel(timer);
/// assert!(tasks.advance(Duration::from_millis(50)).is_empty());
/// ```
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_timer: u64,
    microtasks: VecDeque<T>,
    frames: VecDeque<(u32, T)>,
    timers: Vec<Timer<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler with its clock at zero.
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_timer: 0,
            microtasks: VecDeque::new(),
            frames: VecDeque::new(),
            timers: Vec::new(),
        }
    }

    /// Current virtual time.
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Queue work to run before control returns to the event source.
    pub fn queue_microtask(&mut self, task: T) {
        self.microtasks.push_back(task);
    }

    /// Queue work for the next rendering frame.
    pub fn request_frame(&mut self, task: T) {
        self.after_frames(1, task);
    }

    /// Queue work to run `frames` rendering frames from now (minimum one).
    pub fn after_frames(&mut self, frames: u32, task: T) {
        self.frames.push_back((frames.max(1), task));
    }

    /// Arm a timer that fires once `after` has elapsed on the virtual clock.
    pub fn set_timeout(&mut self, after: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.push(Timer {
            id,
            deadline: self.now + after,
            task,
        });
        id
    }

    /// Discard a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        before != self.timers.len()
    }

    /// Whether a timer is still armed.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    /// Take every queued microtask in FIFO order.
    ///
    /// Microtasks queued while the caller processes the result land in the
    /// next drain; hosts loop until this returns empty.
    pub fn drain_microtasks(&mut self) -> Vec<T> {
        self.microtasks.drain(..).collect()
    }

    /// Tick one rendering frame and return the tasks due on it.
    pub fn next_frame(&mut self) -> Vec<T> {
        let mut due = Vec::new();
        let mut waiting = VecDeque::with_capacity(self.frames.len());
        for (frames, task) in self.frames.drain(..) {
            if frames <= 1 {
                due.push(task);
            } else {
                waiting.push_back((frames - 1, task));
            }
        }
        self.frames = waiting;
        due
    }

    /// Move the clock forward and return timers that came due, earliest first.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now += elapsed;
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|timer| timer.deadline <= now);
        self.timers = pending;
        due.sort_by_key(|timer| (timer.deadline, timer.id));
        due.into_iter().map(|timer| timer.task).collect()
    }

    /// Time until the earliest armed timer, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers
            .iter()
            .map(|timer| timer.deadline.saturating_sub(self.now))
            .min()
    }

    /// Whether any frame work is queued.
    pub fn has_frame_work(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Whether nothing at all is queued.
    pub fn is_idle(&self) -> bool {
        self.microtasks.is_empty() && self.frames.is_empty() && self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microtasks_drain_in_fifo_order() {
        let mut tasks = Scheduler::new();
        tasks.queue_microtask(1);
        tasks.queue_microtask(2);
        tasks.queue_microtask(3);
        assert_eq!(tasks.drain_microtasks(), vec![1, 2, 3]);
        assert!(tasks.drain_microtasks().is_empty());
    }

    #[test]
    fn test_after_frames_waits_requested_frames() {
        let mut tasks = Scheduler::new();
        tasks.after_frames(2, "double");
        tasks.request_frame("single");
        assert_eq!(tasks.next_frame(), vec!["single"]);
        assert_eq!(tasks.next_frame(), vec!["double"]);
        assert!(tasks.next_frame().is_empty());
    }

    #[test]
    fn test_zero_frames_is_treated_as_next_frame() {
        let mut tasks = Scheduler::new();
        tasks.after_frames(0, "now");
        assert_eq!(tasks.next_frame(), vec!["now"]);
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let mut tasks = Scheduler::new();
        tasks.set_timeout(Duration::from_millis(30), "c");
        tasks.set_timeout(Duration::from_millis(10), "a");
        tasks.set_timeout(Duration::from_millis(10), "b");
        assert!(tasks.advance(Duration::from_millis(5)).is_empty());
        assert_eq!(tasks.advance(Duration::from_millis(25)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut tasks = Scheduler::new();
        let id = tasks.set_timeout(Duration::from_millis(10), "gone");
        assert!(tasks.is_pending(id));
        assert!(tasks.cancel(id));
        assert!(!tasks.cancel(id));
        assert!(tasks.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_next_deadline_reports_remaining_time() {
        let mut tasks = Scheduler::new();
        assert_eq!(tasks.next_deadline(), None);
        tasks.set_timeout(Duration::from_millis(100), ());
        tasks.advance(Duration::from_millis(40));
        assert_eq!(tasks.next_deadline(), Some(Duration::from_millis(60)));
    }
}
