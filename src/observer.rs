use std::time::Instant;

use egui::{Rect, Vec2};

use crate::device::DeviceClass;

/// True iff `rect` sits entirely inside the viewport.
pub fn fully_within(rect: Rect, viewport: Rect) -> bool {
    viewport.contains_rect(rect)
}

/// True iff `rect` overlaps the viewport grown by `margin` on every side.
/// This is the pre-trigger used to start fetches before items scroll in.
pub fn near_viewport(rect: Rect, viewport: Rect, margin: f32) -> bool {
    viewport.expand(margin).intersects(rect)
}

/// Watches rendered items and decides when each should start loading.
///
/// Two mechanisms, both fire-once per item: a per-frame intersection trigger
/// with a device-dependent margin, and a throttled fallback scan that runs
/// after scroll/resize activity and strictly re-checks a bounded window of
/// untriggered items. The scan exists because the intersection trigger can
/// miss items at initialization or right after a batch insertion.
pub struct Observer {
    triggered: Vec<bool>,
    last_scan: Option<Instant>,
    last_offset: f32,
    last_viewport: Vec2,
    scan_pending: bool,
}

impl Observer {
    pub fn new() -> Self {
        Self {
            triggered: Vec::new(),
            last_scan: None,
            last_offset: 0.0,
            last_viewport: Vec2::ZERO,
            scan_pending: true,
        }
    }

    /// Re-arm over a fresh item sequence; every item becomes untriggered.
    /// The loader's entry guard makes re-triggering already-loaded items a
    /// no-op, so this is safe after the final load-more batch.
    pub fn rearm(&mut self, count: usize) {
        self.triggered.clear();
        self.triggered.resize(count, false);
        self.scan_pending = true;
    }

    /// Grow the watched set after a batch append, keeping prior trigger state.
    pub fn extend(&mut self, count: usize) {
        if count > self.triggered.len() {
            self.triggered.resize(count, false);
        }
        self.scan_pending = true;
    }

    pub fn is_triggered(&self, index: usize) -> bool {
        self.triggered.get(index).copied().unwrap_or(false)
    }

    pub fn mark_triggered(&mut self, index: usize) {
        if let Some(slot) = self.triggered.get_mut(index) {
            *slot = true;
        }
    }

    /// Record this frame's scroll offset and viewport size; any change arms
    /// the fallback scan.
    pub fn note_frame(&mut self, offset: f32, viewport: Vec2) {
        if offset != self.last_offset || viewport != self.last_viewport {
            self.scan_pending = true;
            self.last_offset = offset;
            self.last_viewport = viewport;
        }
    }

    /// Intersection trigger for one item. Fires at most once per item.
    pub fn check_intersection(
        &mut self,
        index: usize,
        rect: Rect,
        viewport: Rect,
        device: DeviceClass,
    ) -> bool {
        if self.is_triggered(index) {
            return false;
        }
        if near_viewport(rect, viewport, device.trigger_margin()) {
            self.mark_triggered(index);
            return true;
        }
        false
    }

    /// Throttled fallback scan over `rects` (index, bounding box) pairs.
    /// Returns the indices that qualify strictly (fully within the viewport)
    /// but were never caught by the intersection trigger. Examines at most
    /// the device's scan ceiling of untriggered items per invocation.
    pub fn scan(
        &mut self,
        now: Instant,
        device: DeviceClass,
        rects: &[(usize, Rect)],
        viewport: Rect,
    ) -> Vec<usize> {
        if !self.scan_pending {
            return Vec::new();
        }
        if let Some(last) = self.last_scan {
            if now.duration_since(last) < device.scan_interval() {
                return Vec::new();
            }
        }
        self.scan_pending = false;
        self.last_scan = Some(now);

        let mut hits = Vec::new();
        let mut examined = 0;
        for &(index, rect) in rects {
            if self.is_triggered(index) {
                continue;
            }
            examined += 1;
            if examined > device.scan_ceiling() {
                break;
            }
            if fully_within(rect, viewport) {
                self.mark_triggered(index);
                hits.push(index);
            }
        }
        hits
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use egui::pos2;

    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(pos2(x, y), egui::vec2(w, h))
    }

    const VIEWPORT: Rect = Rect {
        min: pos2(0.0, 0.0),
        max: pos2(800.0, 600.0),
    };

    #[test]
    fn fully_within_requires_every_edge_inside() {
        assert!(fully_within(rect(10.0, 10.0, 100.0, 100.0), VIEWPORT));
        // Flush against the edges still counts.
        assert!(fully_within(rect(0.0, 0.0, 800.0, 600.0), VIEWPORT));
        // One pixel past any edge does not.
        assert!(!fully_within(rect(-1.0, 10.0, 100.0, 100.0), VIEWPORT));
        assert!(!fully_within(rect(10.0, 550.0, 100.0, 100.0), VIEWPORT));
    }

    #[test]
    fn near_viewport_honors_margin() {
        let below = rect(10.0, 650.0, 100.0, 100.0);
        assert!(!near_viewport(below, VIEWPORT, 0.0));
        assert!(near_viewport(below, VIEWPORT, 100.0));
    }

    #[test]
    fn intersection_trigger_fires_once() {
        let mut obs = Observer::new();
        obs.rearm(3);
        let inside = rect(10.0, 10.0, 50.0, 50.0);
        assert!(obs.check_intersection(0, inside, VIEWPORT, DeviceClass::Unconstrained));
        assert!(!obs.check_intersection(0, inside, VIEWPORT, DeviceClass::Unconstrained));
        assert!(obs.is_triggered(0));
        assert!(!obs.is_triggered(1));
    }

    #[test]
    fn scan_only_runs_when_armed_and_unthrottled() {
        let mut obs = Observer::new();
        obs.rearm(2);
        let device = DeviceClass::Unconstrained;
        let rects = [(0, rect(10.0, 10.0, 50.0, 50.0)), (1, rect(10.0, 900.0, 50.0, 50.0))];
        let t0 = Instant::now();

        // rearm leaves the scan armed, so the first call catches item 0.
        assert_eq!(obs.scan(t0, device, &rects, VIEWPORT), vec![0]);
        // Disarmed until new scroll/resize activity.
        assert!(obs.scan(t0 + Duration::from_secs(1), device, &rects, VIEWPORT).is_empty());

        obs.note_frame(120.0, VIEWPORT.size());
        // Armed, but inside the throttle window.
        assert!(obs.scan(t0 + Duration::from_millis(10), device, &rects, VIEWPORT).is_empty());
        // Past the throttle window it runs again; item 1 is still offscreen.
        assert!(
            obs.scan(t0 + device.scan_interval(), device, &rects, VIEWPORT)
                .is_empty()
        );
    }

    #[test]
    fn scan_examines_a_bounded_window() {
        let mut obs = Observer::new();
        let device = DeviceClass::Constrained;
        let total = device.scan_ceiling() + 5;
        obs.rearm(total);
        // All rects qualify; only the first `ceiling` untriggered ones are
        // examined.
        let rects: Vec<(usize, Rect)> = (0..total)
            .map(|i| (i, rect(10.0, 10.0, 20.0, 20.0)))
            .collect();
        let hits = obs.scan(Instant::now(), device, &rects, VIEWPORT);
        assert_eq!(hits.len(), device.scan_ceiling());
    }

    #[test]
    fn scan_tolerates_empty_item_sequence() {
        let mut obs = Observer::new();
        obs.rearm(0);
        assert!(
            obs.scan(Instant::now(), DeviceClass::Unconstrained, &[], VIEWPORT)
                .is_empty()
        );
    }

    #[test]
    fn extend_keeps_existing_trigger_state() {
        let mut obs = Observer::new();
        obs.rearm(2);
        obs.mark_triggered(0);
        obs.extend(4);
        assert!(obs.is_triggered(0));
        assert!(!obs.is_triggered(2));
        assert!(!obs.is_triggered(3));
    }
}
