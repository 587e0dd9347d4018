//! Frame clock adapter
//!
//! The display link hands us `(timestamp, duration)` pairs, possibly on a
//! thread other than the one that owns the game. `FrameClock` turns those
//! into per-frame deltas; `tick_channel` is the hop onto the control thread.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::consts::MIN_FRAME_DT;

/// One display refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Monotonic seconds
    pub timestamp: f64,
    /// Nominal frame duration reported by the display (seconds)
    pub duration: f64,
}

impl FrameTick {
    pub fn new(timestamp: f64, duration: f64) -> Self {
        Self { timestamp, duration }
    }

    /// Delta used when the timestamps can't be trusted
    fn substitute_delta(&self) -> f64 {
        if self.duration.is_finite() {
            self.duration.max(MIN_FRAME_DT)
        } else {
            MIN_FRAME_DT
        }
    }
}

/// Per-frame delta computation
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick
    ///
    /// The first tick, a non-finite timestamp, or a clock that didn't move
    /// forward all yield `max(duration, 1/120)` instead.
    pub fn delta(&mut self, tick: FrameTick) -> f64 {
        let previous = self.last;
        if tick.timestamp.is_finite() {
            self.last = Some(tick.timestamp);
        }

        match previous {
            Some(last) => {
                let delta = tick.timestamp - last;
                if delta.is_finite() && delta > 0.0 {
                    delta
                } else {
                    tick.substitute_delta()
                }
            }
            None => tick.substitute_delta(),
        }
    }

    /// Forget the previous tick (the next one counts as first)
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last
    }
}

/// Cross-thread side of the tick hop
#[derive(Debug, Clone)]
pub struct TickSender {
    tx: Sender<FrameTick>,
}

impl TickSender {
    /// Queue a tick; returns false once the control side is gone
    pub fn send(&self, tick: FrameTick) -> bool {
        self.tx.send(tick).is_ok()
    }
}

/// Control-thread side of the tick hop
#[derive(Debug)]
pub struct TickInbox {
    rx: Receiver<FrameTick>,
}

impl TickInbox {
    /// Pending ticks in arrival order (never blocks)
    pub fn drain(&self) -> Vec<FrameTick> {
        self.rx.try_iter().collect()
    }
}

/// Channel carrying ticks from the display callback to the control thread
pub fn tick_channel() -> (TickSender, TickInbox) {
    let (tx, rx) = mpsc::channel();
    (TickSender { tx }, TickInbox { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_first_tick_uses_duration() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(FrameTick::new(10.0, 1.0 / 60.0)), 1.0 / 60.0);
        assert_eq!(clock.delta(FrameTick::new(10.02, 1.0 / 60.0)), 10.02 - 10.0);
    }

    #[test]
    fn test_substitute_has_floor() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(FrameTick::new(1.0, 0.0)), MIN_FRAME_DT);
        assert_eq!(clock.delta(FrameTick::new(1.0, f64::NAN)), MIN_FRAME_DT);
        assert_eq!(clock.delta(FrameTick::new(2.0, f64::NAN)), 1.0);
    }

    #[test]
    fn test_backwards_or_stalled_clock() {
        let mut clock = FrameClock::new();
        clock.delta(FrameTick::new(5.0, 1.0 / 60.0));
        assert_eq!(clock.delta(FrameTick::new(5.0, 1.0 / 60.0)), 1.0 / 60.0);
        assert_eq!(clock.delta(FrameTick::new(4.0, 1.0 / 30.0)), 1.0 / 30.0);
        // Measured from the latest timestamp, even a backwards one
        assert!((clock.delta(FrameTick::new(4.5, 1.0 / 60.0)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_timestamp_keeps_previous() {
        let mut clock = FrameClock::new();
        clock.delta(FrameTick::new(3.0, 1.0 / 60.0));
        assert_eq!(clock.delta(FrameTick::new(f64::NAN, 1.0 / 60.0)), 1.0 / 60.0);
        assert_eq!(clock.last_timestamp(), Some(3.0));
    }

    #[test]
    fn test_reset() {
        let mut clock = FrameClock::new();
        clock.delta(FrameTick::new(3.0, 1.0 / 60.0));
        clock.reset();
        assert_eq!(clock.delta(FrameTick::new(9.0, 1.0 / 120.0)), 1.0 / 120.0);
    }

    #[test]
    fn test_ticks_hop_threads_in_order() {
        let (sender, inbox) = tick_channel();
        let remote = sender.clone();
        let handle = thread::spawn(move || {
            for i in 0..5 {
                assert!(remote.send(FrameTick::new(i as f64, 1.0 / 60.0)));
            }
        });
        handle.join().unwrap();

        let ticks = inbox.drain();
        let stamps: Vec<f64> = ticks.iter().map(|t| t.timestamp).collect();
        assert_eq!(stamps, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_send_after_inbox_dropped() {
        let (sender, inbox) = tick_channel();
        drop(inbox);
        assert!(!sender.send(FrameTick::new(0.0, 1.0 / 60.0)));
    }
}
