use std::collections::BTreeMap;
use std::time::Duration;

/// Opaque handle to a scheduled timer. Cancelling a handle that already fired
/// (or was already cancelled) does nothing.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Timer<A> {
    deadline: Duration,
    period: Option<Duration>,
    action: A,
}

/// Single-threaded timer queue, driven by the caller's clock.
///
/// Timers fire in deadline order; ties go to whichever was scheduled first.
/// An interval that falls behind fires once per elapsed period.
#[derive(Debug)]
pub struct TimerQueue<A> {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerHandle, Timer<A>>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        TimerQueue {
            now: Duration::ZERO,
            next_id: 0,
            timers: BTreeMap::new(),
        }
    }
}

impl<A: Clone> TimerQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn set_timeout(&mut self, delay: Duration, action: A) -> TimerHandle {
        self.schedule(delay, None, action)
    }

    /// Zero periods are bumped to one millisecond, so an interval can't spin
    /// forever inside a single `pop_due`.
    pub fn set_interval(&mut self, period: Duration, action: A) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        self.schedule(period, Some(period), action)
    }

    fn schedule(&mut self, delay: Duration, period: Option<Duration>, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            handle,
            Timer {
                deadline: self.now + delay,
                period,
                action,
            },
        );
        handle
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Callers should run the action before popping again, so
    /// that anything it cancels or schedules is seen by the next pop.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, A)> {
        let (handle, deadline) = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.deadline <= until)
            .min_by_key(|(handle, timer)| (timer.deadline, **handle))
            .map(|(handle, timer)| (*handle, timer.deadline))?;

        self.now = self.now.max(deadline);

        let timer = self.timers.get_mut(&handle)?;
        let action = timer.action.clone();
        match timer.period {
            Some(period) => timer.deadline += period,
            None => {
                self.timers.remove(&handle);
            }
        }
        Some((handle, action))
    }

    /// Moves the clock forward without firing anything.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Fires everything due within `dt`, in order.
    pub fn advance(&mut self, dt: Duration) -> Vec<(TimerHandle, A)> {
        let until = self.now + dt;
        let mut fired = vec![];
        while let Some(entry) = self.pop_due(until) {
            fired.push(entry);
        }
        self.advance_to(until);
        fired
    }
}
