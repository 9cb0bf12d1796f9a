/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One second elapsed; carries the seconds left.
    Running(u32),
    /// The countdown just reached zero. Returned exactly once.
    Expired,
    /// The countdown is stopped or already expired; nothing happened.
    Inert,
}

/// Whole-second countdown that signals expiry once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
    stopped: bool,
}

impl Countdown {
    /// Countdown starting at `duration` seconds.
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            stopped: false,
        }
    }

    /// Length the countdown started from.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether the countdown reached zero.
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Whether further ticks are ignored.
    pub fn is_inert(&self) -> bool {
        self.stopped || self.is_expired()
    }

    /// Freeze the countdown at its current value.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Tick {
        if self.is_inert() {
            return Tick::Inert;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_once_on_last_tick() {
        let mut countdown = Countdown::new(180);
        let mut expired_at = Vec::new();
        for n in 1..=180 {
            if countdown.tick() == Tick::Expired {
                expired_at.push(n);
            }
        }
        assert_eq!(expired_at, vec![180]);
        assert_eq!(countdown.remaining(), 0);

        for _ in 0..10 {
            assert_eq!(countdown.tick(), Tick::Inert);
        }
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn running_ticks_report_seconds_left() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.tick(), Tick::Running(2));
        assert_eq!(countdown.tick(), Tick::Running(1));
        assert_eq!(countdown.tick(), Tick::Expired);
    }

    #[test]
    fn stopped_countdown_keeps_its_value() {
        let mut countdown = Countdown::new(60);
        countdown.tick();
        countdown.stop();
        assert_eq!(countdown.tick(), Tick::Inert);
        assert_eq!(countdown.remaining(), 59);
        assert!(!countdown.is_expired());
    }

    #[test]
    fn zero_length_countdown_never_fires() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), Tick::Inert);
    }
}
