//! Render surfaces the tile engine draws onto.
//!
//! The engine only decides *what* tile exists *where*. A [`RenderSink`] turns
//! that into visuals and reports when each image has loaded.

use std::time::Duration;

use crossbeam_channel::Sender;
use instant::Instant;

use super::events::{LoadEvent, LoadOutcome, TileDescriptor, TileHandle};
use crate::core::geo::{Point, TileAddress};
use crate::prelude::HashMap;

/// One-shot completion report for a tile image.
///
/// Consuming `self` guarantees at most one report per visual. Reports for a
/// tile that has since been evicted are ignored by the engine.
#[derive(Debug)]
pub struct LoadCallback {
    handle: TileHandle,
    tx: Sender<LoadEvent>,
}

impl LoadCallback {
    pub(crate) fn new(handle: TileHandle, tx: Sender<LoadEvent>) -> Self {
        Self { handle, tx }
    }

    pub fn handle(&self) -> TileHandle {
        self.handle
    }

    pub fn loaded(self) {
        self.report(LoadOutcome::Loaded);
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.report(LoadOutcome::Failed(reason.into()));
    }

    fn report(self, outcome: LoadOutcome) {
        // A closed channel means the engine is gone; nothing left to notify.
        let _ = self.tx.send(LoadEvent {
            handle: self.handle,
            outcome,
        });
    }
}

/// Surface capable of showing tile visuals
pub trait RenderSink {
    /// Instantiate a visual for `tile` and arrange for `on_load` to fire once
    /// its image has loaded or failed
    fn create_tile_visual(&mut self, tile: &TileDescriptor, on_load: LoadCallback);

    /// Destroy the visual; called exactly once per created handle
    fn remove_tile_visual(&mut self, handle: TileHandle);

    /// Fade a loaded tile in over `duration`
    fn fade_in(&mut self, handle: TileHandle, duration: Duration);

    /// Replace a failed tile's image with the placeholder
    fn show_error_tile(&mut self, handle: TileHandle, error_tile_url: &str);

    /// Move the layer container by `offset` pixels (drag panning)
    fn move_container(&mut self, _offset: Point) {}
}

/// State of one visual held by a [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryVisual {
    pub address: TileAddress,
    pub position: Point,
    pub src: String,
    pub fade_started: Option<Instant>,
    pub fade_duration: Duration,
    pub errored: bool,
}

impl MemoryVisual {
    /// Opacity at `now`: 0 until loaded, then ramps linearly to 1
    pub fn opacity_at(&self, now: Instant) -> f32 {
        match self.fade_started {
            None => 0.0,
            Some(_) if self.fade_duration.is_zero() => 1.0,
            Some(start) => {
                let elapsed = now.saturating_duration_since(start).as_secs_f32();
                (elapsed / self.fade_duration.as_secs_f32()).min(1.0)
            }
        }
    }
}

/// Headless render surface that keeps visuals in memory.
///
/// Load callbacks are held until the owner decides how each load ends, which
/// makes the engine's asynchronous paths deterministic to drive.
#[derive(Debug, Default)]
pub struct MemorySink {
    visuals: HashMap<TileHandle, MemoryVisual>,
    pending: HashMap<TileHandle, LoadCallback>,
    container_offset: Point,
    created: usize,
    removed: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visual(&self, handle: TileHandle) -> Option<&MemoryVisual> {
        self.visuals.get(&handle)
    }

    pub fn visuals(&self) -> impl Iterator<Item = (&TileHandle, &MemoryVisual)> {
        self.visuals.iter()
    }

    pub fn visual_at(&self, address: TileAddress) -> Option<&MemoryVisual> {
        self.visuals.values().find(|v| v.address == address)
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn removed_count(&self) -> usize {
        self.removed
    }

    pub fn container_offset(&self) -> Point {
        self.container_offset
    }

    pub fn pending_handles(&self) -> Vec<TileHandle> {
        let mut handles: Vec<_> = self.pending.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Report a successful load for `handle`; false if nothing was pending
    pub fn complete(&mut self, handle: TileHandle) -> bool {
        match self.pending.remove(&handle) {
            Some(callback) => {
                callback.loaded();
                true
            }
            None => false,
        }
    }

    /// Report a failed load for `handle`; false if nothing was pending
    pub fn fail(&mut self, handle: TileHandle, reason: &str) -> bool {
        match self.pending.remove(&handle) {
            Some(callback) => {
                callback.failed(reason);
                true
            }
            None => false,
        }
    }

    /// Report every pending load as successful
    pub fn complete_all(&mut self) -> usize {
        let count = self.pending.len();
        for (_, callback) in self.pending.drain() {
            callback.loaded();
        }
        count
    }

    /// Hand out a pending callback so a test can fire it later
    pub fn take_callback(&mut self, handle: TileHandle) -> Option<LoadCallback> {
        self.pending.remove(&handle)
    }
}

impl RenderSink for MemorySink {
    fn create_tile_visual(&mut self, tile: &TileDescriptor, on_load: LoadCallback) {
        self.created += 1;
        self.visuals.insert(
            tile.handle,
            MemoryVisual {
                address: tile.address,
                position: tile.position,
                src: tile.url.clone(),
                fade_started: None,
                fade_duration: Duration::ZERO,
                errored: false,
            },
        );
        self.pending.insert(tile.handle, on_load);
    }

    fn remove_tile_visual(&mut self, handle: TileHandle) {
        if self.visuals.remove(&handle).is_some() {
            self.removed += 1;
        }
        // A load can no longer be reported for a removed visual.
        self.pending.remove(&handle);
    }

    fn fade_in(&mut self, handle: TileHandle, duration: Duration) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.fade_started = Some(Instant::now());
            visual.fade_duration = duration;
        }
    }

    fn show_error_tile(&mut self, handle: TileHandle, error_tile_url: &str) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.src = error_tile_url.to_string();
            visual.errored = true;
            visual.fade_started = Some(Instant::now());
            visual.fade_duration = Duration::ZERO;
        }
    }

    fn move_container(&mut self, offset: Point) {
        self.container_offset = offset;
    }
}

#[cfg(feature = "fetch")]
pub use fetching::FetchingSink;

#[cfg(feature = "fetch")]
mod fetching {
    use std::time::Duration;

    use crossbeam_channel::{unbounded, Receiver};

    use super::{LoadCallback, RenderSink};
    use crate::core::geo::Point;
    use crate::layers::tile::events::{TileDescriptor, TileHandle};
    use crate::prelude::HashMap;
    use crate::tiles::loader::{FetchedTile, TileLoader};

    /// A tile shown by a [`FetchingSink`]
    #[derive(Debug, Clone)]
    pub struct FetchedVisual {
        pub descriptor: TileDescriptor,
        pub image: Option<image::RgbaImage>,
        pub visible: bool,
        pub error_src: Option<String>,
    }

    /// Render sink that downloads and decodes real tile images in the background.
    ///
    /// Call [`FetchingSink::drain_fetched`] on the UI thread to move finished
    /// downloads into their visuals.
    pub struct FetchingSink {
        loader: TileLoader,
        rx: Receiver<FetchedTile>,
        visuals: HashMap<TileHandle, FetchedVisual>,
        container_offset: Point,
    }

    impl FetchingSink {
        pub fn new() -> Self {
            let (tx, rx) = unbounded();
            Self {
                loader: TileLoader::new(tx),
                rx,
                visuals: HashMap::default(),
                container_offset: Point::default(),
            }
        }

        /// Attach decoded images to their visuals; returns how many were kept.
        /// Images for tiles removed while downloading are dropped.
        pub fn drain_fetched(&mut self) -> usize {
            let mut kept = 0;
            for fetched in self.rx.try_iter() {
                if let Some(visual) = self.visuals.get_mut(&fetched.handle) {
                    visual.image = Some(fetched.image);
                    kept += 1;
                }
            }
            kept
        }

        pub fn visual(&self, handle: TileHandle) -> Option<&FetchedVisual> {
            self.visuals.get(&handle)
        }

        pub fn len(&self) -> usize {
            self.visuals.len()
        }

        pub fn is_empty(&self) -> bool {
            self.visuals.is_empty()
        }

        pub fn container_offset(&self) -> Point {
            self.container_offset
        }
    }

    impl Default for FetchingSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RenderSink for FetchingSink {
        fn create_tile_visual(&mut self, tile: &TileDescriptor, on_load: LoadCallback) {
            self.visuals.insert(
                tile.handle,
                FetchedVisual {
                    descriptor: tile.clone(),
                    image: None,
                    visible: false,
                    error_src: None,
                },
            );
            self.loader.start_download(tile.url.clone(), on_load);
        }

        fn remove_tile_visual(&mut self, handle: TileHandle) {
            self.visuals.remove(&handle);
        }

        fn fade_in(&mut self, handle: TileHandle, _duration: Duration) {
            if let Some(visual) = self.visuals.get_mut(&handle) {
                visual.visible = true;
            }
        }

        fn show_error_tile(&mut self, handle: TileHandle, error_tile_url: &str) {
            if let Some(visual) = self.visuals.get_mut(&handle) {
                visual.error_src = Some(error_tile_url.to_string());
                visual.visible = true;
            }
        }

        fn move_container(&mut self, offset: Point) {
            self.container_offset = offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn descriptor(handle: u64, x: i64, y: i64) -> TileDescriptor {
        TileDescriptor {
            handle: TileHandle(handle),
            address: TileAddress::new(x, y, 3),
            position: Point::new(x as f64 * 256.0, y as f64 * 256.0),
            url: format!("http://a.t/3/{}/{}.png", x, y),
        }
    }

    #[test]
    fn test_callback_reports_once() {
        let (tx, rx) = unbounded();
        let callback = LoadCallback::new(TileHandle(4), tx);
        assert_eq!(callback.handle(), TileHandle(4));
        callback.failed("404");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![LoadEvent {
                handle: TileHandle(4),
                outcome: LoadOutcome::Failed("404".into()),
            }]
        );
    }

    #[test]
    fn test_memory_sink_lifecycle() {
        let (tx, rx) = unbounded();
        let mut sink = MemorySink::new();
        let tile = descriptor(1, 2, 3);

        sink.create_tile_visual(&tile, LoadCallback::new(tile.handle, tx));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.pending_handles(), vec![TileHandle(1)]);
        assert_eq!(sink.visual(TileHandle(1)).unwrap().opacity_at(Instant::now()), 0.0);

        assert!(sink.complete(TileHandle(1)));
        assert!(!sink.complete(TileHandle(1)));
        assert_eq!(rx.try_iter().count(), 1);

        sink.fade_in(TileHandle(1), Duration::ZERO);
        assert_eq!(sink.visual(TileHandle(1)).unwrap().opacity_at(Instant::now()), 1.0);

        sink.remove_tile_visual(TileHandle(1));
        sink.remove_tile_visual(TileHandle(1));
        assert!(sink.is_empty());
        assert_eq!(sink.created_count(), 1);
        assert_eq!(sink.removed_count(), 1);
    }

    #[test]
    fn test_removed_visual_drops_pending_callback() {
        let (tx, rx) = unbounded();
        let mut sink = MemorySink::new();
        for handle in 1..=3 {
            let tile = descriptor(handle, handle as i64, 0);
            sink.create_tile_visual(&tile, LoadCallback::new(tile.handle, tx.clone()));
        }

        sink.remove_tile_visual(TileHandle(2));
        assert_eq!(sink.pending_handles(), vec![TileHandle(1), TileHandle(3)]);
        assert!(!sink.complete(TileHandle(2)));
        assert!(sink.take_callback(TileHandle(2)).is_none());

        assert_eq!(sink.complete_all(), 2);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn test_fade_ramps_over_duration() {
        let start = Instant::now();
        let visual = MemoryVisual {
            address: TileAddress::new(0, 0, 0),
            position: Point::default(),
            src: String::new(),
            fade_started: Some(start),
            fade_duration: Duration::from_millis(200),
            errored: false,
        };
        let halfway = visual.opacity_at(start + Duration::from_millis(100));
        assert!((halfway - 0.5).abs() < 0.01);
        assert_eq!(visual.opacity_at(start + Duration::from_secs(1)), 1.0);
    }

    #[test]
    fn test_error_tile_replaces_source() {
        let (tx, _rx) = unbounded();
        let mut sink = MemorySink::new();
        let tile = descriptor(9, 0, 0);
        sink.create_tile_visual(&tile, LoadCallback::new(tile.handle, tx));
        sink.show_error_tile(TileHandle(9), "http://err.png");

        let visual = sink.visual(TileHandle(9)).unwrap();
        assert!(visual.errored);
        assert_eq!(visual.src, "http://err.png");
    }
}
