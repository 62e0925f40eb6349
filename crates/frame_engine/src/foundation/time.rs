//! Time management utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::events::{Event, EventQueue};

/// Slowest supported logic rate in Hz
pub const MIN_LOGIC_RATE: f64 = 1e-3;

/// Fastest supported logic rate in Hz
pub const MAX_LOGIC_RATE: f64 = 1e6;

/// Fixed-rate tick source feeding the event queue
///
/// The timer does not run on its own thread. The loop calls
/// [`LogicTimer::pump_at`] each iteration and receives one `Event::Timer`
/// for every period that elapsed since the last tick.
#[derive(Debug)]
pub struct LogicTimer {
    period: Duration,
    next_tick: Option<Instant>,
    count: u64,
}

impl LogicTimer {
    /// Create a stopped timer firing `rate` times per second
    ///
    /// Returns `None` when the rate lies outside
    /// [`MIN_LOGIC_RATE`]`..=`[`MAX_LOGIC_RATE`] or its period is not a
    /// representable non-zero duration.
    pub fn new(rate: f64) -> Option<Self> {
        if !(MIN_LOGIC_RATE..=MAX_LOGIC_RATE).contains(&rate) {
            return None;
        }
        let period = Duration::try_from_secs_f64(1.0 / rate).ok().filter(|p| !p.is_zero())?;
        Some(Self {
            period,
            next_tick: None,
            count: 0,
        })
    }

    /// Tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking, first tick one period after `now`
    pub fn start_at(&mut self, now: Instant) {
        self.next_tick = Some(now + self.period);
    }

    /// Start ticking from the current instant
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Stop ticking; the tick count is kept
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    /// Whether the timer is running
    pub fn is_started(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Total ticks emitted since creation
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Push a timer event for every period elapsed up to `now`
    ///
    /// Returns the number of events pushed.
    pub fn pump_at(&mut self, now: Instant, queue: &mut EventQueue) -> u64 {
        let Some(mut next) = self.next_tick else {
            return 0;
        };

        let mut fired = 0;
        while next <= now {
            self.count += 1;
            fired += 1;
            queue.push(Event::Timer { count: self.count });
            next += self.period;
        }
        self.next_tick = Some(next);
        fired
    }

    /// Push elapsed ticks using the current instant
    pub fn pump(&mut self, queue: &mut EventQueue) -> u64 {
        self.pump_at(Instant::now(), queue)
    }
}

/// Number of frame times averaged by [`FpsCounter`]
pub const FPS_SAMPLE_COUNT: usize = 100;

/// Frame rate sampler
///
/// Keeps the last [`FPS_SAMPLE_COUNT`] frame durations and reports both the
/// instantaneous and the averaged rate.
#[derive(Debug)]
pub struct FpsCounter {
    last_frame: Option<Instant>,
    samples: VecDeque<Duration>,
    total: Duration,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self {
            last_frame: None,
            samples: VecDeque::with_capacity(FPS_SAMPLE_COUNT),
            total: Duration::ZERO,
        }
    }

    /// Record the end of a frame at `now`
    pub fn frame_at(&mut self, now: Instant) {
        if let Some(last) = self.last_frame {
            self.record(now.saturating_duration_since(last));
        }
        self.last_frame = Some(now);
    }

    /// Record the end of a frame at the current instant
    pub fn frame(&mut self) {
        self.frame_at(Instant::now());
    }

    /// Record a single frame duration
    pub fn record(&mut self, frame_time: Duration) {
        if self.samples.len() == FPS_SAMPLE_COUNT {
            if let Some(oldest) = self.samples.pop_front() {
                self.total -= oldest;
            }
        }
        self.samples.push_back(frame_time);
        self.total += frame_time;
    }

    /// Number of samples currently held
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Rate derived from the most recent frame
    pub fn current_fps(&self) -> f64 {
        self.samples
            .back()
            .map_or(0.0, |last| rate(*last))
    }

    /// Rate averaged over the held samples
    pub fn average_fps(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        rate(self.total / self.samples.len() as u32)
    }

    /// Forget all samples
    pub fn reset(&mut self) {
        self.last_frame = None;
        self.samples.clear();
        self.total = Duration::ZERO;
    }
}

fn rate(frame_time: Duration) -> f64 {
    let secs = frame_time.as_secs_f64();
    if secs > 0.0 {
        1.0 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_rates() {
        assert!(LogicTimer::new(0.0).is_none());
        assert!(LogicTimer::new(-5.0).is_none());
        assert!(LogicTimer::new(f64::NAN).is_none());
        assert!(LogicTimer::new(f64::INFINITY).is_none());
    }

    #[test]
    fn test_out_of_range_rates() {
        // A zero period would never let pump_at catch up
        assert!(LogicTimer::new(1e10).is_none());
        assert!(LogicTimer::new(1e-30).is_none());

        let fastest = LogicTimer::new(MAX_LOGIC_RATE).unwrap();
        assert_relative_eq!(fastest.period().as_secs_f64(), 1e-6, epsilon = 1e-9);
        let slowest = LogicTimer::new(MIN_LOGIC_RATE).unwrap();
        assert_relative_eq!(slowest.period().as_secs_f64(), 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_stopped_timer_emits_nothing() {
        let mut timer = LogicTimer::new(60.0).unwrap();
        let mut queue = EventQueue::new();
        assert_eq!(timer.pump_at(Instant::now() + Duration::from_secs(1), &mut queue), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ticks_per_elapsed_period() {
        let mut timer = LogicTimer::new(100.0).unwrap();
        let mut queue = EventQueue::new();
        let start = Instant::now();
        timer.start_at(start);

        assert_eq!(timer.pump_at(start + Duration::from_millis(5), &mut queue), 0);
        assert_eq!(timer.pump_at(start + Duration::from_millis(35), &mut queue), 3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.next_event(), Some(Event::Timer { count: 1 }));

        // Next tick lands at 40ms, not 45ms
        assert_eq!(timer.pump_at(start + Duration::from_millis(40), &mut queue), 1);
        assert_eq!(timer.count(), 4);

        timer.stop();
        assert!(!timer.is_started());
        assert_eq!(timer.pump_at(start + Duration::from_secs(10), &mut queue), 0);
    }

    #[test]
    fn test_fps_average_window() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.average_fps(), 0.0);

        for _ in 0..FPS_SAMPLE_COUNT {
            fps.record(Duration::from_millis(10));
        }
        assert_relative_eq!(fps.average_fps(), 100.0, epsilon = 1e-6);

        // Old samples fall out of the window
        for _ in 0..FPS_SAMPLE_COUNT {
            fps.record(Duration::from_millis(20));
        }
        assert_eq!(fps.sample_count(), FPS_SAMPLE_COUNT);
        assert_relative_eq!(fps.average_fps(), 50.0, epsilon = 1e-6);
        assert_relative_eq!(fps.current_fps(), 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fps_frames() {
        let mut fps = FpsCounter::new();
        let start = Instant::now();
        fps.frame_at(start);
        assert_eq!(fps.sample_count(), 0);
        fps.frame_at(start + Duration::from_millis(250));
        assert_relative_eq!(fps.current_fps(), 4.0, epsilon = 1e-6);

        fps.reset();
        assert_eq!(fps.sample_count(), 0);
    }
}
