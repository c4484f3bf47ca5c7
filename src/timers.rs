/// One-shot countdown measured in ticks.
///
/// A slot holding `Option<Countdown>` is the whole timer discipline: arming
/// replaces whatever was pending, cancelling drops it, and the owner drains it
/// with [`Countdown::tick`] once per simulation tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    total: u32,
}

impl Countdown {
    pub fn new(ticks: u32) -> Self {
        Self {
            remaining: ticks,
            total: ticks,
        }
    }

    /// Advances one tick. Returns true exactly once, on the tick it expires.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    pub fn fraction_remaining(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.remaining as f32 / self.total as f32
        }
    }
}

/// Ticks `slot`, clearing it when it fires. Returns whether it fired.
pub fn drain(slot: &mut Option<Countdown>) -> bool {
    let Some(countdown) = slot.as_mut() else {
        return false;
    };
    countdown.tick();
    // A zero-length countdown fires on its first drain.
    let fired = countdown.is_expired();
    if fired {
        *slot = None;
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_exact_tick_count() {
        let mut slot = Some(Countdown::new(3));
        assert!(!drain(&mut slot));
        assert!(!drain(&mut slot));
        assert!(drain(&mut slot));
        assert!(slot.is_none());
        assert!(!drain(&mut slot));
    }

    #[test]
    fn rearming_replaces_the_pending_deadline() {
        let mut slot = Some(Countdown::new(3));
        drain(&mut slot);
        drain(&mut slot);
        slot = Some(Countdown::new(3));
        assert!(!drain(&mut slot));
        assert!(!drain(&mut slot));
        assert!(drain(&mut slot));
    }

    #[test]
    fn fraction_remaining_tracks_progress() {
        let mut countdown = Countdown::new(4);
        assert_eq!(countdown.fraction_remaining(), 1.0);
        countdown.tick();
        assert_eq!(countdown.fraction_remaining(), 0.75);
        assert_eq!(Countdown::new(0).fraction_remaining(), 0.0);
    }

    #[test]
    fn zero_length_countdown_fires_on_first_drain() {
        let mut slot = Some(Countdown::new(0));
        assert!(drain(&mut slot));
        assert!(slot.is_none());
        assert!(!drain(&mut slot));
    }
}
