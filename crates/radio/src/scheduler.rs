//! Poll scheduler for the periodic datalink tasks
//!
//! One fixed tick drives three independent timers. A timer fires on the tick
//! where its accumulated wait has reached the interval and starts over from
//! zero; otherwise the tick is added to the wait.

use std::time::Duration;

use log::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimer {
    waited: Duration,
}

impl PollTimer {
    pub fn new() -> Self {
        Self {
            waited: Duration::ZERO,
        }
    }

    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Advances the timer by one tick and reports whether it fired.
    pub fn advance(&mut self, tick: Duration, interval: Duration) -> bool {
        if self.waited >= interval {
            self.waited = Duration::ZERO;
            true
        } else {
            self.waited += tick;
            false
        }
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Actions due on a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueActions {
    pub refresh_link: bool,
    pub poll_atc: bool,
    pub poll_company: bool,
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    tick: Duration,
    link_refresh_interval: Duration,
    link_refresh: PollTimer,
    atc: PollTimer,
    company: PollTimer,
    ticks: u64,
}

impl PollScheduler {
    pub fn new(tick: Duration, link_refresh_interval: Duration) -> Self {
        Self {
            tick,
            link_refresh_interval,
            link_refresh: PollTimer::new(),
            atc: PollTimer::new(),
            company: PollTimer::new(),
            ticks: 0,
        }
    }

    pub fn tick_period(&self) -> Duration {
        self.tick
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one tick. Backend poll intervals are supplied by the backends and
    /// may change between ticks.
    pub fn tick(&mut self, atc_interval: Duration, company_interval: Duration) -> DueActions {
        self.ticks += 1;
        let due = DueActions {
            refresh_link: self.link_refresh.advance(self.tick, self.link_refresh_interval),
            poll_atc: self.atc.advance(self.tick, atc_interval),
            poll_company: self.company.advance(self.tick, company_interval),
        };
        trace!("Scheduler tick {}: {:?}", self.ticks, due);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(5_000);

    #[test]
    fn test_timer_fires_when_wait_reaches_interval() {
        let mut timer = PollTimer::new();
        let interval = Duration::from_millis(15_000);

        let fired: Vec<bool> = (0..8).map(|_| timer.advance(TICK, interval)).collect();
        assert_eq!(fired, vec![false, false, false, true, false, false, false, true]);
        assert_eq!(timer.waited(), Duration::ZERO);
    }

    #[test]
    fn test_zero_interval_fires_every_tick() {
        let mut timer = PollTimer::new();
        assert!(timer.advance(TICK, Duration::ZERO));
        assert!(timer.advance(TICK, Duration::ZERO));
    }

    #[test]
    fn test_timers_are_independent() {
        let mut scheduler = PollScheduler::new(TICK, Duration::from_millis(30_000));
        let atc = Duration::from_millis(10_000);
        let company = Duration::from_millis(20_000);

        let mut refreshes = 0;
        let mut atc_polls = 0;
        let mut company_polls = 0;
        for _ in 0..70 {
            let due = scheduler.tick(atc, company);
            refreshes += due.refresh_link as u32;
            atc_polls += due.poll_atc as u32;
            company_polls += due.poll_company as u32;
        }

        // fires every (interval / tick + 1) ticks
        assert_eq!(refreshes, 10);
        assert_eq!(atc_polls, 23);
        assert_eq!(company_polls, 14);
        assert_eq!(scheduler.ticks(), 70);
    }

    #[test]
    fn test_interval_change_applies_on_next_tick() {
        let mut scheduler = PollScheduler::new(TICK, Duration::from_millis(30_000));
        let long = Duration::from_secs(3_600);

        for _ in 0..3 {
            assert!(!scheduler.tick(long, long).poll_atc);
        }
        // 15s waited, interval shrinks below it
        assert!(scheduler.tick(Duration::from_millis(10_000), long).poll_atc);
    }
}
