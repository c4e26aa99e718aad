use std::collections::VecDeque;
use std::time::Instant;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::device::{
    self, BATCH_INTERVAL, BATCH_SIZE, DeviceClass, EAGER_HEAD, PREFETCH_PROBABILITY,
    PREFETCH_WINDOW,
};
use crate::item::{GalleryItem, LoadState};
use crate::loader::ImageLoader;
use crate::observer::{self, Observer};
use crate::records::{ALL_CATEGORY, ImageRecord};

const CELL: f32 = 200.0;
const CELL_SPACING: f32 = 8.0;
const CAPTION_HEIGHT: f32 = 22.0;

/// Owns the rendered item sequence, the active category, and the streaming
/// state for records beyond the synchronous render budget. Every filter
/// change is a full re-render: prior items are dropped and indices restart
/// at zero for the new subset.
pub struct GalleryController {
    records: &'static [ImageRecord],
    active_category: String,
    items: Vec<GalleryItem>,
    /// Filtered records not yet materialized as items.
    remainder: VecDeque<ImageRecord>,
    /// Manual "load more" control is showing (constrained devices only).
    load_more_armed: bool,
    /// Deadline for appending the next batch of the remainder.
    next_batch_at: Option<Instant>,
    generation: u64,
    observer: Observer,
    rng: StdRng,
}

impl GalleryController {
    pub fn new(records: &'static [ImageRecord]) -> Self {
        Self {
            records,
            active_category: ALL_CATEGORY.to_string(),
            items: Vec::new(),
            remainder: VecDeque::new(),
            load_more_armed: false,
            next_batch_at: None,
            generation: 0,
            observer: Observer::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [GalleryItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_category(&self) -> &str {
        &self.active_category
    }

    pub fn load_more_armed(&self) -> bool {
        self.load_more_armed
    }

    /// Switches the active category and re-renders against the matching
    /// subset. Indices are reassigned 0..N-1; lightbox navigation after this
    /// operates only over the new subset.
    pub fn set_category(&mut self, tag: &str, width: f32, now: Instant) {
        if self.active_category != tag {
            self.active_category = tag.to_string();
        }
        self.rebuild(width, now);
    }

    /// Full re-render of the current filter subset under the width-derived
    /// budget. Deliberately not an incremental diff.
    pub fn rebuild(&mut self, width: f32, now: Instant) {
        let device = DeviceClass::from_width(width);
        let filtered: Vec<ImageRecord> = self
            .records
            .iter()
            .filter(|r| r.matches(&self.active_category))
            .copied()
            .collect();
        let budget = device::render_budget(width);
        let shown = filtered.len().min(budget);

        self.generation += 1;
        let mut items = Vec::with_capacity(shown);
        for (i, r) in filtered[..shown].iter().enumerate() {
            let item = self.make_item(i, *r, now);
            items.push(item);
        }
        self.items = items;
        self.remainder = filtered[shown..].iter().copied().collect();

        if self.remainder.is_empty() {
            self.load_more_armed = false;
            self.next_batch_at = None;
        } else if device.is_constrained() {
            // Defer the rest behind the manual control.
            self.load_more_armed = true;
            self.next_batch_at = None;
        } else {
            // Wide viewports stream the remainder without a control.
            self.load_more_armed = false;
            self.next_batch_at = Some(now);
        }

        self.observer.rearm(self.items.len());
        debug!(
            category = %self.active_category,
            rendered = self.items.len(),
            deferred = self.remainder.len(),
            "render pass"
        );
    }

    fn make_item(&mut self, index: usize, record: ImageRecord, pass_start: Instant) -> GalleryItem {
        let prefetch_hint =
            index < PREFETCH_WINDOW && self.rng.gen_bool(PREFETCH_PROBABILITY);
        GalleryItem::new(index, record, pass_start, prefetch_hint)
    }

    /// User activated the "load more" control: remove it and start streaming
    /// the remainder in batches.
    pub fn activate_load_more(&mut self, now: Instant) {
        if self.load_more_armed {
            self.load_more_armed = false;
            self.next_batch_at = Some(now);
        }
    }

    /// Appends one due batch. Batches are strictly sequential: the next
    /// deadline is armed only here, after the previous batch landed. After
    /// the final batch the observer is re-armed over all items.
    pub fn tick_batches(&mut self, now: Instant) -> bool {
        let Some(at) = self.next_batch_at else {
            return false;
        };
        if now < at {
            return false;
        }

        let base = self.items.len();
        for offset in 0..BATCH_SIZE {
            let Some(record) = self.remainder.pop_front() else {
                break;
            };
            let item = self.make_item(base + offset, record, now);
            self.items.push(item);
        }
        debug!(total = self.items.len(), "batch appended");

        if self.remainder.is_empty() {
            self.next_batch_at = None;
            self.observer.rearm(self.items.len());
        } else {
            self.next_batch_at = Some(now + BATCH_INTERVAL);
            self.observer.extend(self.items.len());
        }
        true
    }

    /// Whether timers are still outstanding (stagger, blur, batches), so the
    /// app keeps frames coming.
    pub fn has_pending_work(&self) -> bool {
        self.next_batch_at.is_some()
            || self
                .items
                .iter()
                .any(|it| !it.visible || it.is_revealing())
    }

    /// Paints the gallery grid and runs the per-frame load scheduling.
    /// Returns the index of a clicked, already-loaded item, if any.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        loader: &mut ImageLoader,
        now: Instant,
        width: f32,
        scroll_enabled: bool,
    ) -> Option<usize> {
        self.tick_batches(now);

        let device = DeviceClass::from_width(width);

        // Timer-driven transitions first, so this frame paints fresh state.
        let mut newly_visible = Vec::new();
        let mut promoted = Vec::new();
        for item in &mut self.items {
            if item.tick_visibility(now) {
                newly_visible.push(item.index);
            }
            if item.tick_reveal(now, device) {
                promoted.push(item.index);
            }
        }
        for index in promoted {
            if index < device.warm_head() {
                let path = self.items[index].record.resolve(loader.base_dir());
                loader.warm(path, ctx);
            }
        }

        let mut clicked = None;
        let mut rects: Vec<(usize, egui::Rect)> = Vec::with_capacity(self.items.len());
        let mut load_more_clicked = false;

        let avail_w = ui.available_width();
        let cols = ((avail_w / (CELL + CELL_SPACING)) as usize).max(1);

        let output = egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .enable_scrolling(scroll_enabled)
            .show(ui, |ui| {
                if self.items.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label("No images in this category");
                    });
                    return;
                }

                egui::Grid::new("gallery_grid")
                    .num_columns(cols)
                    .spacing([CELL_SPACING, CELL_SPACING])
                    .show(ui, |ui| {
                        for (i, item) in self.items.iter().enumerate() {
                            let (rect, hit) = draw_cell(ui, item, now, device);
                            rects.push((i, rect));
                            if hit && item.is_interactive() {
                                clicked = Some(i);
                            }
                            if (i + 1) % cols == 0 {
                                ui.end_row();
                            }
                        }
                    });

                if self.load_more_armed {
                    ui.add_space(12.0);
                    ui.vertical_centered(|ui| {
                        if ui.button("Load more").clicked() {
                            load_more_clicked = true;
                        }
                    });
                }
            });

        if load_more_clicked {
            self.activate_load_more(now);
        }

        // Load scheduling against this frame's geometry.
        let viewport = output.inner_rect;
        self.observer
            .note_frame(output.state.offset.y, viewport.size());

        let mut to_load: Vec<usize> = Vec::new();

        // Eligibility is evaluated once, right after the staggered reveal.
        for &index in &newly_visible {
            let Some(&(_, rect)) = rects.iter().find(|(i, _)| *i == index) else {
                continue;
            };
            let item = &self.items[index];
            if eligible_at_reveal(item, rect, viewport, device) {
                self.observer.mark_triggered(index);
                to_load.push(index);
            }
        }

        // Fire-once intersection trigger with the device pre-trigger margin.
        for &(index, rect) in &rects {
            if self.items[index].visible
                && self
                    .observer
                    .check_intersection(index, rect, viewport, device)
            {
                to_load.push(index);
            }
        }

        // Throttled fallback scan: catches items the trigger missed at
        // initialization or after a batch insertion.
        let scan_rects = scan_candidates(&self.items, &rects);
        to_load.extend(self.observer.scan(now, device, &scan_rects, viewport));

        for index in to_load {
            if let Some(item) = self.items.get_mut(index) {
                loader.request_thumb(self.generation, item, device, ctx);
            }
        }

        clicked
    }
}

/// "Should this item start loading now": within the viewport, inside the
/// eager head, or admitted by the random prefetch window (unconstrained
/// devices only; best effort, not a guarantee).
fn eligible_at_reveal(
    item: &GalleryItem,
    rect: egui::Rect,
    viewport: egui::Rect,
    device: DeviceClass,
) -> bool {
    observer::fully_within(rect, viewport)
        || item.index < EAGER_HEAD
        || (!device.is_constrained() && item.prefetch_hint)
}

/// Restricts the fallback scan to items whose staggered reveal has fired,
/// so both load triggers evaluate the same population.
fn scan_candidates(
    items: &[GalleryItem],
    rects: &[(usize, egui::Rect)],
) -> Vec<(usize, egui::Rect)> {
    rects
        .iter()
        .copied()
        .filter(|&(index, _)| items.get(index).is_some_and(|it| it.visible))
        .collect()
}

/// Paints one cell; returns its rect and whether it was clicked.
fn draw_cell(
    ui: &mut egui::Ui,
    item: &GalleryItem,
    now: Instant,
    device: DeviceClass,
) -> (egui::Rect, bool) {
    let (resp, painter) = ui.allocate_painter(
        egui::vec2(CELL, CELL + CAPTION_HEIGHT),
        egui::Sense::click(),
    );
    let rect = resp.rect;

    // Staggered reveal: the cell holds its place but paints nothing yet.
    if !item.visible {
        return (rect, false);
    }

    if resp.hovered() && item.is_interactive() {
        painter.rect_filled(rect, 4.0, ui.visuals().widgets.hovered.bg_fill);
    }

    let img_rect = egui::Rect::from_min_size(rect.min, egui::vec2(CELL, CELL));
    match (&item.texture, item.state) {
        (Some(tex), _) => {
            let tex_size = tex.size_vec2();
            let scale = (CELL / tex_size.x).min(CELL / tex_size.y);
            let display = tex_size * scale;
            let offset = (egui::vec2(CELL, CELL) - display) * 0.5;
            let draw_rect = egui::Rect::from_min_size(img_rect.min + offset, display);
            painter.image(
                tex.id(),
                draw_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            // Frosted overlay standing in for the progressive blur; fades
            // out over the reveal duration.
            let blur = item.blur_strength(now, device);
            if blur > 0.0 {
                let alpha = (blur * 230.0) as u8;
                painter.rect_filled(draw_rect, 0.0, egui::Color32::from_white_alpha(alpha));
            }
        }
        (None, LoadState::Error) => {
            painter.rect_filled(img_rect, 4.0, egui::Color32::from_gray(30));
            painter.text(
                img_rect.center(),
                egui::Align2::CENTER_CENTER,
                "⚠",
                egui::FontId::proportional(22.0),
                egui::Color32::GRAY,
            );
        }
        (None, _) => {
            painter.rect_filled(img_rect, 4.0, egui::Color32::from_gray(40));
            painter.text(
                img_rect.center(),
                egui::Align2::CENTER_CENTER,
                "…",
                egui::FontId::proportional(22.0),
                egui::Color32::GRAY,
            );
        }
    }

    painter.text(
        egui::pos2(rect.center().x, img_rect.max.y + CAPTION_HEIGHT * 0.5),
        egui::Align2::CENTER_CENTER,
        item.record.caption,
        egui::FontId::proportional(11.0),
        ui.visuals().text_color(),
    );

    (rect, resp.clicked())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::records::PORTFOLIO;

    const WIDE: f32 = 1024.0;
    const NARROW: f32 = 600.0;

    #[test]
    fn filter_all_yields_contiguous_indices_in_order() {
        let mut gallery = GalleryController::new(PORTFOLIO);
        gallery.rebuild(WIDE, Instant::now());

        assert_eq!(gallery.len(), PORTFOLIO.len());
        for (i, item) in gallery.items().iter().enumerate() {
            assert_eq!(item.index, i);
            assert_eq!(item.record.path, PORTFOLIO[i].path);
        }
    }

    #[test]
    fn category_filter_reassigns_indices_over_the_subset() {
        let mut gallery = GalleryController::new(PORTFOLIO);
        gallery.set_category("fall", WIDE, Instant::now());

        assert_eq!(gallery.len(), 8);
        let indices: Vec<usize> = gallery.items().iter().map(|it| it.index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        // The 4th matching record, as the lightbox would address it.
        assert_eq!(gallery.items()[3].record.path, "Ananya_Fall_Shoot_203.jpg");
        assert_eq!(gallery.items()[3].record.caption, "Fall Portrait");
    }

    #[test]
    fn refiltering_replaces_prior_items() {
        let mut gallery = GalleryController::new(PORTFOLIO);
        let t = Instant::now();
        gallery.set_category("fall", WIDE, t);
        let gen_fall = gallery.generation();
        gallery.set_category("editorial", WIDE, t);

        assert!(gallery.generation() > gen_fall);
        assert_eq!(gallery.len(), 6);
        assert!(
            gallery
                .items()
                .iter()
                .all(|it| it.record.matches("editorial"))
        );
    }

    fn synthetic_records(n: usize) -> &'static [ImageRecord] {
        let records: Vec<ImageRecord> = (0..n)
            .map(|i| ImageRecord {
                path: Box::leak(format!("img_{i}.jpg").into_boxed_str()),
                caption: "Synthetic",
                categories: &["portrait"],
            })
            .collect();
        Box::leak(records.into_boxed_slice())
    }

    #[test]
    fn constrained_pass_defers_remainder_behind_load_more() {
        let records = synthetic_records(90);
        let mut gallery = GalleryController::new(records);
        let t0 = Instant::now();
        gallery.rebuild(NARROW, t0);

        assert_eq!(gallery.len(), 15);
        assert!(gallery.load_more_armed());
        // Nothing streams until the control is activated.
        assert!(!gallery.tick_batches(t0 + Duration::from_secs(10)));
        assert_eq!(gallery.len(), 15);
    }

    #[test]
    fn load_more_streams_sequential_batches_of_ten() {
        let records = synthetic_records(90);
        let mut gallery = GalleryController::new(records);
        let t0 = Instant::now();
        gallery.rebuild(NARROW, t0);
        gallery.activate_load_more(t0);
        assert!(!gallery.load_more_armed());

        let mut t = t0;
        let mut sizes = vec![gallery.len()];
        while gallery.len() < 90 {
            // The pending batch is due exactly at its deadline.
            assert!(gallery.tick_batches(t));
            sizes.push(gallery.len());
            if gallery.len() < 90 {
                // Between deadlines nothing appends.
                assert!(!gallery.tick_batches(t + BATCH_INTERVAL / 2));
                t += BATCH_INTERVAL;
            }
        }

        // 15, then 10 at a time, with no overlap between batches.
        assert_eq!(
            sizes,
            vec![15, 25, 35, 45, 55, 65, 75, 85, 90]
        );
        for (i, item) in gallery.items().iter().enumerate() {
            assert_eq!(item.index, i);
        }
        // Fully drained: no further deadline.
        assert!(!gallery.tick_batches(t + Duration::from_secs(1)));
    }

    #[test]
    fn wide_pass_streams_remainder_without_a_control() {
        let records = synthetic_records(40);
        let mut gallery = GalleryController::new(records);
        let t0 = Instant::now();
        gallery.rebuild(WIDE, t0);

        assert_eq!(gallery.len(), 30);
        assert!(!gallery.load_more_armed());
        assert!(gallery.tick_batches(t0));
        assert_eq!(gallery.len(), 40);
    }

    #[test]
    fn stagger_deadlines_flatten_past_the_cap() {
        let records = synthetic_records(20);
        let mut gallery = GalleryController::new(records);
        let t0 = Instant::now();
        gallery.rebuild(WIDE, t0);

        let items = gallery.items();
        assert!(items[3].reveal_at < items[7].reveal_at);
        assert_eq!(items[10].reveal_at, items[19].reveal_at);
    }

    #[test]
    fn eager_head_loads_regardless_of_viewport() {
        let records = synthetic_records(10);
        let mut gallery = GalleryController::new(records);
        gallery.rebuild(WIDE, Instant::now());

        let offscreen = egui::Rect::from_min_size(egui::pos2(0.0, 5000.0), egui::vec2(10.0, 10.0));
        let viewport = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 600.0));
        let device = DeviceClass::Unconstrained;

        assert!(eligible_at_reveal(
            &gallery.items()[EAGER_HEAD - 1],
            offscreen,
            viewport,
            device
        ));

        // Beyond the prefetch window, only viewport position qualifies.
        let tail = &gallery.items()[PREFETCH_WINDOW.min(9)];
        let onscreen = egui::Rect::from_min_size(egui::pos2(10.0, 10.0), egui::vec2(10.0, 10.0));
        assert!(eligible_at_reveal(tail, onscreen, viewport, device));
        assert!(!eligible_at_reveal(tail, offscreen, viewport, device) || tail.prefetch_hint);
    }

    #[test]
    fn fallback_scan_skips_items_before_their_staggered_reveal() {
        let records = synthetic_records(10);
        let mut gallery = GalleryController::new(records);
        let t0 = Instant::now();
        gallery.rebuild(WIDE, t0);

        // Only the first two reveal deadlines have elapsed.
        let now = t0 + device::reveal_delay(1);
        for item in gallery.items_mut() {
            item.tick_visibility(now);
        }

        let cell = egui::Rect::from_min_size(egui::pos2(10.0, 10.0), egui::vec2(50.0, 50.0));
        let rects: Vec<(usize, egui::Rect)> = (0..gallery.len()).map(|i| (i, cell)).collect();
        let candidates = scan_candidates(gallery.items(), &rects);
        let indices: Vec<usize> = candidates.iter().map(|&(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn prefetch_hint_never_admits_on_constrained_devices() {
        let records = synthetic_records(10);
        let mut gallery = GalleryController::new(records);
        gallery.rebuild(NARROW, Instant::now());

        let offscreen = egui::Rect::from_min_size(egui::pos2(0.0, 5000.0), egui::vec2(10.0, 10.0));
        let viewport = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 600.0));
        for item in &gallery.items()[EAGER_HEAD..] {
            assert!(!eligible_at_reveal(
                item,
                offscreen,
                viewport,
                DeviceClass::Constrained
            ));
        }
    }
}
