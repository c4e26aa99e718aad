use tracing::debug;

use crate::item::GalleryItem;
use crate::loader::ImageLoader;

/// Wraparound successor within a sequence of length `n` (n > 0).
pub fn wrap_next(index: usize, n: usize) -> usize {
    (index + 1) % n
}

/// Wraparound predecessor within a sequence of length `n` (n > 0).
pub fn wrap_previous(index: usize, n: usize) -> usize {
    (index + n - 1) % n
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { index: usize },
}

/// Full-screen single-image viewer. `index` addresses the currently rendered
/// item sequence and is only meaningful within one render pass; a filter
/// change that invalidates it forces the viewer closed.
pub struct Lightbox {
    state: State,
    /// Item whose neighbors were already warmed, so adjacency preloading
    /// fires once per displayed image.
    warmed_for: Option<usize>,
}

impl Lightbox {
    pub fn new() -> Self {
        Self {
            state: State::Closed,
            warmed_for: None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            State::Open { index } => Some(index),
            State::Closed => None,
        }
    }

    /// Opens at `index`. Rejected (stays Closed) when out of range.
    pub fn open(&mut self, index: usize, item_count: usize) -> bool {
        if index >= item_count {
            return false;
        }
        self.state = State::Open { index };
        self.warmed_for = None;
        debug!(index, "lightbox opened");
        true
    }

    pub fn close(&mut self) {
        self.state = State::Closed;
        self.warmed_for = None;
    }

    pub fn next(&mut self, item_count: usize) {
        if let State::Open { index } = self.state {
            if item_count == 0 {
                self.close();
                return;
            }
            self.state = State::Open {
                index: wrap_next(index, item_count),
            };
        }
    }

    pub fn previous(&mut self, item_count: usize) {
        if let State::Open { index } = self.state {
            if item_count == 0 {
                self.close();
                return;
            }
            self.state = State::Open {
                index: wrap_previous(index, item_count),
            };
        }
    }

    /// Guard against the item sequence shrinking underneath an open viewer
    /// (filter change): force Closed rather than render invalid content.
    pub fn ensure_valid(&mut self, item_count: usize) {
        if let State::Open { index } = self.state {
            if index >= item_count {
                self.close();
            }
        }
    }

    /// Paints the modal viewer. Prefers the full-resolution preload entry
    /// over the gallery thumbnail; once the full image is up, warms the
    /// neighbors (index±1 mod n).
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        items: &[GalleryItem],
        loader: &mut ImageLoader,
    ) {
        self.ensure_valid(items.len());
        let State::Open { index } = self.state else {
            return;
        };
        let item = &items[index];
        let full_path = item.record.resolve(loader.base_dir());

        // Request the full image if nobody warmed it yet (deduped).
        loader.warm(full_path.clone(), ctx);

        let full_tex = loader.cache().ready(&full_path).cloned();
        if full_tex.is_some() && self.warmed_for != Some(index) {
            self.warmed_for = Some(index);
            if items.len() > 1 {
                let next_path = items[wrap_next(index, items.len())]
                    .record
                    .resolve(loader.base_dir());
                let prev_path = items[wrap_previous(index, items.len())]
                    .record
                    .resolve(loader.base_dir());
                loader.warm(next_path, ctx);
                loader.warm(prev_path, ctx);
            }
        }

        let screen = ctx.screen_rect();
        let mut close_requested = false;
        let mut go_next = false;
        let mut go_previous = false;

        egui::Area::new(egui::Id::new("lightbox"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                // Backdrop swallows clicks; a click that hits the backdrop
                // itself (not the image or controls) closes the viewer.
                let backdrop = ui.allocate_rect(screen, egui::Sense::click());
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(230));
                if backdrop.clicked() {
                    close_requested = true;
                }

                // Image, centered; thumbnail stands in while the full
                // resolution is still decoding.
                let shown_tex = full_tex.as_ref().or(item.texture.as_ref());
                let max = screen.size() * 0.86;
                match shown_tex {
                    Some(tex) => {
                        let tex_size = tex.size_vec2();
                        let scale = (max.x / tex_size.x).min(max.y / tex_size.y).min(1.0);
                        let display = tex_size * scale;
                        let img_rect =
                            egui::Rect::from_center_size(screen.center(), display);
                        // Clicks on the content are not dismissals.
                        let _ = ui.allocate_rect(img_rect, egui::Sense::click());
                        ui.painter().image(
                            tex.id(),
                            img_rect,
                            egui::Rect::from_min_max(
                                egui::pos2(0.0, 0.0),
                                egui::pos2(1.0, 1.0),
                            ),
                            egui::Color32::WHITE,
                        );
                        if full_tex.is_none() {
                            ui.put(
                                egui::Rect::from_center_size(
                                    screen.center(),
                                    egui::vec2(32.0, 32.0),
                                ),
                                egui::Spinner::new(),
                            );
                        }
                    }
                    None => {
                        ui.put(
                            egui::Rect::from_center_size(
                                screen.center(),
                                egui::vec2(32.0, 32.0),
                            ),
                            egui::Spinner::new(),
                        );
                    }
                }

                // Caption
                ui.painter().text(
                    egui::pos2(screen.center().x, screen.max.y - 36.0),
                    egui::Align2::CENTER_CENTER,
                    item.record.caption,
                    egui::FontId::proportional(15.0),
                    egui::Color32::from_gray(220),
                );

                // Controls
                let button = |ui: &mut egui::Ui, rect: egui::Rect, glyph: &str| {
                    ui.put(
                        rect,
                        egui::Button::new(egui::RichText::new(glyph).size(22.0)),
                    )
                    .clicked()
                };
                let side = egui::vec2(44.0, 44.0);
                if button(
                    ui,
                    egui::Rect::from_center_size(
                        egui::pos2(screen.min.x + 40.0, screen.center().y),
                        side,
                    ),
                    "‹",
                ) {
                    go_previous = true;
                }
                if button(
                    ui,
                    egui::Rect::from_center_size(
                        egui::pos2(screen.max.x - 40.0, screen.center().y),
                        side,
                    ),
                    "›",
                ) {
                    go_next = true;
                }
                if button(
                    ui,
                    egui::Rect::from_center_size(
                        egui::pos2(screen.max.x - 40.0, screen.min.y + 40.0),
                        side,
                    ),
                    "✕",
                ) {
                    close_requested = true;
                }
            });

        if close_requested {
            self.close();
        } else if go_next {
            self.next(items.len());
        } else if go_previous {
            self.previous(items.len());
        }
    }
}

impl Default for Lightbox {
    fn default() -> Self {
        Self::new()
    }
}
