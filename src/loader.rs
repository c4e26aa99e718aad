use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::mpsc,
    time::Instant,
};

use tracing::{debug, warn};

use crate::device::DeviceClass;
use crate::item::GalleryItem;

/// Longest edge of a gallery thumbnail.
pub const THUMB_SIZE: u32 = 480;
/// Longest edge kept for lightbox display.
pub const LIGHTBOX_MAX: u32 = 2048;

type Rgba = (Vec<u8>, usize, usize);

enum LoadResult {
    Thumb {
        generation: u64,
        index: usize,
        /// Thumbnail plus, under the retain-full policy, a downscaled full
        /// image so the preload cache is warmed for free.
        outcome: anyhow::Result<(Rgba, Option<Rgba>)>,
    },
    Full {
        path: PathBuf,
        outcome: anyhow::Result<Rgba>,
    },
}

enum PreloadEntry {
    /// Fetch issued; the marker alone is enough to dedupe requests.
    Requested,
    Ready(egui::TextureHandle),
}

/// Process-wide set of already-requested full-size images. Monotonic, never
/// evicted; bounded by the portfolio size.
pub struct PreloadCache {
    entries: HashMap<PathBuf, PreloadEntry>,
}

impl PreloadCache {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Records a request marker. Returns false when the URL was already
    /// requested, in which case no new fetch should be issued.
    fn mark_requested(&mut self, path: PathBuf) -> bool {
        if self.entries.contains_key(&path) {
            return false;
        }
        self.entries.insert(path, PreloadEntry::Requested);
        true
    }

    fn insert_ready(&mut self, path: PathBuf, texture: egui::TextureHandle) {
        self.entries.insert(path, PreloadEntry::Ready(texture));
    }

    pub fn ready(&self, path: &Path) -> Option<&egui::TextureHandle> {
        match self.entries.get(path) {
            Some(PreloadEntry::Ready(tex)) => Some(tex),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drives image fetches on background threads and applies completions to
/// gallery items on the UI thread. A generation counter ties thumbnail
/// results to the render pass that requested them; results from superseded
/// passes are dropped, the way timers against detached nodes become no-ops.
pub struct ImageLoader {
    base_dir: PathBuf,
    cache: PreloadCache,
    tx: mpsc::SyncSender<LoadResult>,
    rx: mpsc::Receiver<LoadResult>,
}

impl ImageLoader {
    pub fn new(base_dir: PathBuf) -> Self {
        let (tx, rx) = mpsc::sync_channel(64);
        Self {
            base_dir,
            cache: PreloadCache::new(),
            tx,
            rx,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn cache(&self) -> &PreloadCache {
        &self.cache
    }

    /// Starts the thumbnail fetch for one item. The item's entry guard makes
    /// repeat calls no-ops; returns whether a fetch was actually issued.
    pub fn request_thumb(
        &self,
        generation: u64,
        item: &mut GalleryItem,
        device: DeviceClass,
        ctx: &egui::Context,
    ) -> bool {
        if !item.begin_load() {
            return false;
        }
        let index = item.index;
        let path = item.record.resolve(&self.base_dir);
        let retain_full = device.retain_full() && index < device.warm_head();
        let tx = self.tx.clone();
        let ctx2 = ctx.clone();
        std::thread::spawn(move || {
            let outcome = decode_for_gallery(&path, retain_full);
            let _ = tx.send(LoadResult::Thumb {
                generation,
                index,
                outcome,
            });
            ctx2.request_repaint();
        });
        true
    }

    /// Warms the preload cache for a full-size image. Deduped by the cache's
    /// request marker; safe to call repeatedly.
    pub fn warm(&mut self, path: PathBuf, ctx: &egui::Context) {
        if !self.cache.mark_requested(path.clone()) {
            return;
        }
        debug!(path = %path.display(), "warming preload cache");
        let tx = self.tx.clone();
        let ctx2 = ctx.clone();
        std::thread::spawn(move || {
            let outcome = decode_full(&path);
            let _ = tx.send(LoadResult::Full { path, outcome });
            ctx2.request_repaint();
        });
    }

    /// Drains completed fetches into the current item sequence. Thumbnail
    /// results from older generations are discarded.
    pub fn drain(
        &mut self,
        generation: u64,
        items: &mut [GalleryItem],
        now: Instant,
        ctx: &egui::Context,
    ) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                LoadResult::Thumb {
                    generation: result_generation,
                    index,
                    outcome,
                } => {
                    if result_generation != generation {
                        continue;
                    }
                    let Some(item) = items.get_mut(index) else {
                        continue;
                    };
                    match outcome {
                        Ok(((data, w, h), full)) => {
                            let img = egui::ColorImage::from_rgba_unmultiplied([w, h], &data);
                            let tex = ctx.load_texture(
                                format!("thumb_{index}"),
                                img,
                                egui::TextureOptions::LINEAR,
                            );
                            item.thumbnail_ready(tex, now);
                            if let Some((data, w, h)) = full {
                                let path = item.record.resolve(&self.base_dir);
                                // The marker keeps a later warm() from
                                // re-fetching what we already carry.
                                self.cache.mark_requested(path.clone());
                                let img =
                                    egui::ColorImage::from_rgba_unmultiplied([w, h], &data);
                                let tex = ctx.load_texture(
                                    path.display().to_string(),
                                    img,
                                    egui::TextureOptions::LINEAR,
                                );
                                self.cache.insert_ready(path, tex);
                            }
                        }
                        Err(err) => {
                            warn!(
                                path = item.record.path,
                                error = %err,
                                "gallery image failed to load"
                            );
                            item.load_failed();
                        }
                    }
                }
                LoadResult::Full { path, outcome } => match outcome {
                    Ok((data, w, h)) => {
                        let img = egui::ColorImage::from_rgba_unmultiplied([w, h], &data);
                        let tex = ctx.load_texture(
                            path.display().to_string(),
                            img,
                            egui::TextureOptions::LINEAR,
                        );
                        self.cache.insert_ready(path, tex);
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "preload fetch failed");
                    }
                },
            }
        }
    }
}

fn to_rgba(img: image::DynamicImage) -> Rgba {
    let rgba = img.to_rgba8();
    let w = rgba.width() as usize;
    let h = rgba.height() as usize;
    (rgba.into_raw(), w, h)
}

/// Decode one source image into a thumbnail, optionally keeping a
/// lightbox-sized copy instead of dropping the decoded original.
fn decode_for_gallery(path: &Path, retain_full: bool) -> anyhow::Result<(Rgba, Option<Rgba>)> {
    let img = image::open(path)?;
    let thumb = img.thumbnail(THUMB_SIZE, THUMB_SIZE);
    let full = if retain_full {
        Some(to_rgba(downscale_for_lightbox(img)))
    } else {
        None
    };
    Ok((to_rgba(thumb), full))
}

fn decode_full(path: &Path) -> anyhow::Result<Rgba> {
    let img = image::open(path)?;
    Ok(to_rgba(downscale_for_lightbox(img)))
}

fn downscale_for_lightbox(img: image::DynamicImage) -> image::DynamicImage {
    if img.width() > LIGHTBOX_MAX || img.height() > LIGHTBOX_MAX {
        img.thumbnail(LIGHTBOX_MAX, LIGHTBOX_MAX)
    } else {
        img
    }
}
