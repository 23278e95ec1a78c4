//! Viewport samples and the scroll lock.

/// One sample of a scrolling feed's geometry.
///
/// Units are whatever the view measures in (pixels, terminal rows).
///
/// # Example
///
/// ```
/// use chatpane::feed::ViewportState;
///
/// let state = ViewportState::new(100.0, 400.0, 1000.0);
/// assert_eq!(state.distance_from_bottom(), 500.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportState {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ViewportState {
    pub const fn new(scroll_top: f64, viewport_height: f64, content_height: f64) -> Self {
        Self {
            scroll_top,
            viewport_height,
            content_height,
        }
    }

    /// `content_height - scroll_top - viewport_height`.
    pub fn distance_from_bottom(&self) -> f64 {
        self.content_height - self.scroll_top - self.viewport_height
    }

    /// Largest meaningful scroll top.
    pub fn max_scroll_top(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }
}

/// Gate that stops auto-scroll while the user reads history.
///
/// Engages once the distance from bottom exceeds `engage`, and only
/// releases at or below the smaller `disengage`, so sub-pixel jitter near
/// either threshold cannot make it flap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollLock {
    engaged: bool,
    engage: f64,
    disengage: f64,
}

impl ScrollLock {
    /// A released lock. `disengage` is clamped to not exceed `engage`.
    pub fn new(engage: f64, disengage: f64) -> Self {
        Self {
            engaged: false,
            engage,
            disengage: disengage.min(engage),
        }
    }

    pub const fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Feed a new distance from bottom. Returns `true` if the lock flipped.
    pub fn observe(&mut self, distance_from_bottom: f64) -> bool {
        let was = self.engaged;
        if distance_from_bottom > self.engage {
            self.engaged = true;
        } else if distance_from_bottom <= self.disengage {
            self.engaged = false;
        }
        was != self.engaged
    }

    pub const fn release(&mut self) {
        self.engaged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_from_bottom_at_bottom_is_zero() {
        let state = ViewportState::new(600.0, 400.0, 1000.0);
        assert_eq!(state.distance_from_bottom(), 0.0);
        assert_eq!(state.max_scroll_top(), 600.0);
    }

    #[test]
    fn test_max_scroll_top_for_short_content() {
        let state = ViewportState::new(0.0, 400.0, 100.0);
        assert_eq!(state.max_scroll_top(), 0.0);
    }

    #[test]
    fn test_lock_hysteresis_sequence() {
        let mut lock = ScrollLock::new(200.0, 8.0);
        assert!(!lock.is_engaged());
        assert!(lock.observe(250.0));
        assert!(lock.is_engaged());
        assert!(!lock.observe(50.0));
        assert!(lock.is_engaged());
        assert!(lock.observe(5.0));
        assert!(!lock.is_engaged());
    }

    #[test]
    fn test_lock_thresholds_are_inclusive_on_release_only() {
        let mut lock = ScrollLock::new(200.0, 8.0);
        lock.observe(200.0);
        assert!(!lock.is_engaged());
        lock.observe(200.5);
        assert!(lock.is_engaged());
        lock.observe(8.0);
        assert!(!lock.is_engaged());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn band_between_thresholds_never_flips(
                start_engaged in any::<bool>(),
                samples in prop::collection::vec(8.01f64..200.0, 1..50),
            ) {
                let mut lock = ScrollLock::new(200.0, 8.0);
                if start_engaged {
                    lock.observe(1000.0);
                }
                for sample in samples {
                    prop_assert!(!lock.observe(sample));
                }
                prop_assert_eq!(lock.is_engaged(), start_engaged);
            }
        }
    }
}
