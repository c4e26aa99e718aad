use std::time::Instant;

use crate::device::{self, DeviceClass};
use crate::records::ImageRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-item load lifecycle. `Revealing` is the blur animation window between
/// texture arrival and the item counting as fully loaded.
pub enum LoadState {
    Pending,
    Loading,
    Revealing { since: Instant },
    Loaded,
    Error,
}

/// One rendered gallery cell. Recreated from scratch on every filter change;
/// `index` is its position within the current pass only.
pub struct GalleryItem {
    pub index: usize,
    pub record: ImageRecord,
    pub state: LoadState,
    /// Staggered-reveal deadline; the cell stays invisible until it passes.
    pub reveal_at: Instant,
    pub visible: bool,
    /// Random prefetch admission, decided once at creation.
    pub prefetch_hint: bool,
    pub texture: Option<egui::TextureHandle>,
}

impl GalleryItem {
    pub fn new(index: usize, record: ImageRecord, pass_start: Instant, prefetch_hint: bool) -> Self {
        Self {
            index,
            record,
            state: LoadState::Pending,
            reveal_at: pass_start + device::reveal_delay(index),
            visible: false,
            prefetch_hint,
            texture: None,
        }
    }

    /// Returns true on the frame the staggered reveal elapses.
    pub fn tick_visibility(&mut self, now: Instant) -> bool {
        if !self.visible && now >= self.reveal_at {
            self.visible = true;
            return true;
        }
        false
    }

    /// Idempotent entry guard: only a `Pending` item starts a fetch.
    pub fn begin_load(&mut self) -> bool {
        if self.state != LoadState::Pending {
            return false;
        }
        self.state = LoadState::Loading;
        true
    }

    pub fn thumbnail_ready(&mut self, texture: egui::TextureHandle, now: Instant) {
        self.texture = Some(texture);
        self.state = LoadState::Revealing { since: now };
    }

    pub fn load_failed(&mut self) {
        self.state = LoadState::Error;
    }

    /// Advances Revealing to Loaded once the blur animation has run its
    /// course. Returns true on the promoting frame, which is when the
    /// preload cache gets warmed for head items.
    pub fn tick_reveal(&mut self, now: Instant, device: DeviceClass) -> bool {
        if let LoadState::Revealing { since } = self.state {
            if now.duration_since(since) >= device.reveal_duration() {
                self.state = LoadState::Loaded;
                return true;
            }
        }
        false
    }

    /// Current blur strength for painting: full at texture arrival, easing
    /// linearly to zero over the reveal duration.
    pub fn blur_strength(&self, now: Instant, device: DeviceClass) -> f32 {
        match self.state {
            LoadState::Revealing { since } => {
                let total = device.reveal_duration().as_secs_f32();
                let elapsed = now.duration_since(since).as_secs_f32();
                device.initial_blur() * (1.0 - elapsed / total).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Whether the blur animation still needs frames.
    pub fn is_revealing(&self) -> bool {
        matches!(self.state, LoadState::Revealing { .. })
    }

    /// Clicks open the lightbox only once the thumbnail has arrived.
    pub fn is_interactive(&self) -> bool {
        matches!(self.state, LoadState::Revealing { .. } | LoadState::Loaded)
    }
}
