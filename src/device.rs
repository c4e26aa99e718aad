use std::time::Duration;

/// Viewports narrower than this are treated as constrained devices.
pub const CONSTRAINED_MAX_WIDTH: f32 = 720.0;

/// Items below this index always start loading at render time.
pub const EAGER_HEAD: usize = 6;

/// Items below this index are candidates for random prefetch admission
/// (unconstrained devices only).
pub const PREFETCH_WINDOW: usize = 16;
pub const PREFETCH_PROBABILITY: f64 = 0.5;

/// "Load more" streaming: records per batch and the gap between batches.
pub const BATCH_SIZE: usize = 10;
pub const BATCH_INTERVAL: Duration = Duration::from_millis(150);

/// Staggered reveal step per index, capped at [`STAGGER_CAP`] steps.
pub const STAGGER_STEP: Duration = Duration::from_millis(100);
pub const STAGGER_CAP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Constrained,
    Unconstrained,
}

impl DeviceClass {
    pub fn from_width(width: f32) -> Self {
        if width < CONSTRAINED_MAX_WIDTH {
            DeviceClass::Constrained
        } else {
            DeviceClass::Unconstrained
        }
    }

    pub fn is_constrained(self) -> bool {
        self == DeviceClass::Constrained
    }

    /// Blur strength at the start of the reveal animation.
    pub fn initial_blur(self) -> f32 {
        match self {
            DeviceClass::Constrained => 0.5,
            DeviceClass::Unconstrained => 1.0,
        }
    }

    /// How long the blur takes to reach zero.
    pub fn reveal_duration(self) -> Duration {
        match self {
            DeviceClass::Constrained => Duration::from_millis(300),
            DeviceClass::Unconstrained => Duration::from_millis(600),
        }
    }

    /// How many low-index items warm the lightbox preload cache after load.
    pub fn warm_head(self) -> usize {
        match self {
            DeviceClass::Constrained => 3,
            DeviceClass::Unconstrained => 8,
        }
    }

    /// Whether the thumbnail worker keeps the decoded full image around for
    /// the preload cache instead of dropping it.
    pub fn retain_full(self) -> bool {
        !self.is_constrained()
    }

    /// Pre-trigger margin around the viewport for the intersection trigger.
    pub fn trigger_margin(self) -> f32 {
        match self {
            DeviceClass::Constrained => 100.0,
            DeviceClass::Unconstrained => 300.0,
        }
    }

    /// Minimum spacing between fallback scans.
    pub fn scan_interval(self) -> Duration {
        match self {
            DeviceClass::Constrained => Duration::from_millis(300),
            DeviceClass::Unconstrained => Duration::from_millis(150),
        }
    }

    /// Upper bound on not-yet-triggered items examined per fallback scan.
    pub fn scan_ceiling(self) -> usize {
        match self {
            DeviceClass::Constrained => 20,
            DeviceClass::Unconstrained => 40,
        }
    }
}

/// Max items rendered synchronously in one pass, by viewport width.
pub fn render_budget(width: f32) -> usize {
    if width < CONSTRAINED_MAX_WIDTH {
        15
    } else if width < 1280.0 {
        30
    } else {
        45
    }
}

/// Reveal delay for an item: grows with index, flat past the cap so large
/// batches do not keep the tail waiting.
pub fn reveal_delay(index: usize) -> Duration {
    STAGGER_STEP * index.min(STAGGER_CAP) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_class_splits_at_breakpoint() {
        assert!(DeviceClass::from_width(480.0).is_constrained());
        assert!(DeviceClass::from_width(719.9).is_constrained());
        assert!(!DeviceClass::from_width(720.0).is_constrained());
        assert!(!DeviceClass::from_width(1920.0).is_constrained());
    }

    #[test]
    fn render_budget_grows_with_width() {
        assert_eq!(render_budget(390.0), 15);
        assert_eq!(render_budget(1024.0), 30);
        assert_eq!(render_budget(2560.0), 45);
    }

    #[test]
    fn reveal_delay_caps_at_ten_steps() {
        assert_eq!(reveal_delay(0), Duration::ZERO);
        assert_eq!(reveal_delay(3), Duration::from_millis(300));
        assert_eq!(reveal_delay(10), Duration::from_millis(1000));
        assert_eq!(reveal_delay(47), Duration::from_millis(1000));
    }

    #[test]
    fn constrained_policy_is_lighter() {
        let c = DeviceClass::Constrained;
        let u = DeviceClass::Unconstrained;
        assert!(c.reveal_duration() < u.reveal_duration());
        assert!(c.initial_blur() < u.initial_blur());
        assert!(c.warm_head() < u.warm_head());
        assert!(!c.retain_full());
        assert!(u.retain_full());
    }
}
