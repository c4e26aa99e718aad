use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::device::DeviceClass;
use crate::gallery::GalleryController;
use crate::lightbox::Lightbox;
use crate::loader::ImageLoader;
use crate::records;

pub struct GalleriaApp {
    gallery: GalleryController,
    lightbox: Lightbox,
    loader: ImageLoader,
    config: AppConfig,
    /// Forced device class from config/env; None means width-based.
    device_override: Option<DeviceClass>,
    start_category: Option<String>,
    initialized: bool,
}

impl GalleriaApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        start_category: Option<String>,
        device_override: Option<DeviceClass>,
    ) -> Self {
        let loader = ImageLoader::new(config.resolve_gallery_dir());
        Self {
            gallery: GalleryController::new(records::PORTFOLIO),
            lightbox: Lightbox::new(),
            loader,
            config,
            device_override,
            start_category,
            initialized: false,
        }
    }

    fn effective_width(&self, ctx: &egui::Context) -> f32 {
        match self.device_override {
            // Forcing a class narrows/widens the width the layout math sees
            // just across the breakpoint; painting still uses real geometry.
            Some(DeviceClass::Constrained) => {
                ctx.screen_rect().width().min(crate::device::CONSTRAINED_MAX_WIDTH - 1.0)
            }
            Some(DeviceClass::Unconstrained) => {
                ctx.screen_rect().width().max(crate::device::CONSTRAINED_MAX_WIDTH)
            }
            None => ctx.screen_rect().width(),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let (escape, left, right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        // Escape is always live; arrows only navigate while open.
        if escape {
            self.lightbox.close();
        }
        if self.lightbox.is_open() {
            if right {
                self.lightbox.next(self.gallery.len());
            }
            if left {
                self.lightbox.previous(self.gallery.len());
            }
        }
    }
}

impl eframe::App for GalleriaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let width = self.effective_width(ctx);

        // Track window size for saving on exit
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        if !self.initialized {
            self.initialized = true;
            if let Some(tag) = self.start_category.take() {
                // The startup tag only sticks when a matching filter exists.
                if records::category_tags().contains(&tag.as_str())
                    || tag == records::ALL_CATEGORY
                {
                    self.gallery.set_category(&tag, width, now);
                }
            }
            if self.gallery.is_empty() && self.gallery.generation() == 0 {
                self.gallery.rebuild(width, now);
            }
        }

        self.loader.drain(
            self.gallery.generation(),
            self.gallery.items_mut(),
            now,
            ctx,
        );
        self.handle_keys(ctx);

        // Category filter bar
        let mut selected: Option<&str> = None;
        egui::TopBottomPanel::top("filter_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Galleria").strong());
                ui.separator();
                let active = self.gallery.active_category().to_string();
                let mut tags = vec![records::ALL_CATEGORY];
                tags.extend(records::category_tags());
                for tag in tags {
                    if ui.selectable_label(active == tag, tag).clicked() {
                        selected = Some(tag);
                    }
                }
            });
        });
        if let Some(tag) = selected {
            self.gallery.set_category(tag, width, now);
            // Indices were reassigned; an open viewer may now be stale.
            self.lightbox.ensure_valid(self.gallery.len());
        }

        // Gallery grid; scrolling is suppressed while the lightbox is open.
        let scroll_enabled = !self.lightbox.is_open();
        let mut clicked_item = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            clicked_item =
                self.gallery
                    .show(ui, ctx, &mut self.loader, now, width, scroll_enabled);
        });
        if let Some(index) = clicked_item {
            self.lightbox.open(index, self.gallery.len());
        }

        self.lightbox
            .show(ctx, self.gallery.items(), &mut self.loader);

        // Keep frames coming while stagger/blur/batch deadlines are pending.
        if self.gallery.has_pending_work() {
            ctx.request_repaint_after(Duration::from_millis(33));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}
