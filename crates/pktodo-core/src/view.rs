//! Gate and form-visibility state.

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Locked,
    Unlocked,
}

/// Fixed-string PIN comparison. Keeps the list out of sight; it does not
/// protect the data.
#[derive(Debug, Clone)]
pub struct PinGate {
    pin: String,
    state: Gate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockResult {
    Opened,
    AlreadyOpen,
    IncorrectPin,
}

impl PinGate {
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            state: Gate::Locked,
        }
    }

    pub fn state(&self) -> Gate {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == Gate::Unlocked
    }

    /// Exact match only; whitespace is significant. There is no way back to
    /// `Locked`.
    pub fn try_unlock(&mut self, input: &str) -> UnlockResult {
        if self.state == Gate::Unlocked {
            return UnlockResult::AlreadyOpen;
        }
        if input == self.pin {
            info!("gate unlocked");
            self.state = Gate::Unlocked;
            UnlockResult::Opened
        } else {
            debug!(len = input.len(), "pin rejected");
            UnlockResult::IncorrectPin
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormVisibility {
    Visible,
    Hidden,
}

impl FormVisibility {
    pub fn is_visible(self) -> bool {
        self == FormVisibility::Visible
    }
}

/// Visibility as a pure function of the offset: shown strictly above the
/// threshold, hidden at or past it.
pub fn form_visibility(offset: f64, threshold: f64) -> FormVisibility {
    if offset < threshold {
        FormVisibility::Visible
    } else {
        FormVisibility::Hidden
    }
}

/// Follows the list's scroll offset. With a zero band this is exactly
/// [`form_visibility`]; a positive band keeps the current state while the
/// offset stays within `threshold ± band`.
#[derive(Debug, Clone)]
pub struct FormTracker {
    threshold: f64,
    band: f64,
    offset: f64,
    current: FormVisibility,
}

impl FormTracker {
    pub fn new(threshold: f64, band: f64) -> Self {
        Self {
            threshold,
            band: band.max(0.0),
            offset: 0.0,
            current: FormVisibility::Visible,
        }
    }

    pub fn visibility(&self) -> FormVisibility {
        self.current
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn on_scroll(&mut self, offset: f64) -> FormVisibility {
        self.offset = offset;
        let next = if self.band == 0.0 {
            form_visibility(offset, self.threshold)
        } else {
            match self.current {
                FormVisibility::Visible => form_visibility(offset, self.threshold + self.band),
                FormVisibility::Hidden => form_visibility(offset, self.threshold - self.band),
            }
        };
        if next != self.current {
            debug!(offset, ?next, "form visibility changed");
        }
        self.current = next;
        next
    }

    /// Scroll back to the top and show the form.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.current = FormVisibility::Visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_exact_pin_unlocks() {
        let mut gate = PinGate::new("2548");
        for wrong in ["", "2547", " 2548", "2548 ", "25480"] {
            assert_eq!(gate.try_unlock(wrong), UnlockResult::IncorrectPin);
            assert_eq!(gate.state(), Gate::Locked);
        }
        assert_eq!(gate.try_unlock("2548"), UnlockResult::Opened);
        assert!(gate.is_unlocked());
        assert_eq!(gate.try_unlock("nonsense"), UnlockResult::AlreadyOpen);
        assert!(gate.is_unlocked());
    }

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(form_visibility(0.0, 30.0), FormVisibility::Visible);
        assert_eq!(form_visibility(29.9, 30.0), FormVisibility::Visible);
        assert_eq!(form_visibility(30.0, 30.0), FormVisibility::Hidden);
        assert_eq!(form_visibility(300.0, 30.0), FormVisibility::Hidden);
    }

    #[test]
    fn zero_band_flips_on_every_crossing() {
        let mut tracker = FormTracker::new(30.0, 0.0);
        assert!(!tracker.on_scroll(30.0).is_visible());
        assert!(tracker.on_scroll(29.0).is_visible());
        assert!(!tracker.on_scroll(31.0).is_visible());
        assert_eq!(tracker.offset(), 31.0);
    }

    #[test]
    fn band_suppresses_flicker_around_threshold() {
        let mut tracker = FormTracker::new(30.0, 5.0);
        assert!(tracker.on_scroll(32.0).is_visible());
        assert!(!tracker.on_scroll(35.0).is_visible());
        assert!(!tracker.on_scroll(28.0).is_visible());
        assert!(tracker.on_scroll(24.0).is_visible());
    }

    #[test]
    fn reset_scrolls_to_top_and_shows_form() {
        let mut tracker = FormTracker::new(30.0, 0.0);
        tracker.on_scroll(120.0);
        tracker.reset();
        assert_eq!(tracker.offset(), 0.0);
        assert_eq!(tracker.visibility(), FormVisibility::Visible);
    }
}
