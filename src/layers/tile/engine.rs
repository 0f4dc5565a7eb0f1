//! Tile-grid viewport engine
//!
//! Owns the [`ViewportWindow`] and keeps the set of tile visuals on a
//! [`RenderSink`] equal to the window's addresses. Two operations mutate it:
//!
//! - [`TileGridEngine::full_redraw`] rebuilds the window from a center/zoom.
//! - [`TileGridEngine::shift_by`] follows a drag by swapping single rows or
//!   columns at the window's edges, so redraw cost tracks the exposed
//!   perimeter instead of the window area.
//!
//! Everything runs on the caller's thread. Image loads complete
//! asynchronously and are applied by [`TileGridEngine::process_loads`]; work
//! requested from inside notifications is queued through a [`CommandSender`].

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{
    events::{
        CommandSender, EngineCommand, LoadEvent, LoadOutcome, TileDescriptor, TileEventObserver,
        TileHandle,
    },
    sink::{LoadCallback, RenderSink},
    window::{Edge, TileOffset, ViewportWindow},
};
use crate::{
    core::{
        config::TileLayerOptions,
        constants::MAX_ZOOM,
        geo::{GeoPoint, GridSize, Point, Size, TileAddress},
        projection::{Projection, SphericalMercator},
    },
    prelude::HashMap,
    tiles::source::{address_for, TemplateSource, TileSource},
    MapError, Result,
};

#[cfg(feature = "debug")]
use log;

/// Lifecycle of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No window yet, or torn down by [`TileGridEngine::detach`]
    Uninitialized,
    /// A window is drawn and may be shifted
    Ready,
}

/// Load progress of a live tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLoadState {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
struct LiveTile {
    descriptor: TileDescriptor,
    load_state: TileLoadState,
}

/// Convert a pixel offset into whole tiles, rounding half away from zero
pub fn tile_offset(pixels: f64, tile_size: u32) -> i64 {
    (pixels / tile_size as f64).round() as i64
}

pub struct TileGridEngine<S: RenderSink> {
    options: TileLayerOptions,
    source: Box<dyn TileSource>,
    projection: Box<dyn Projection>,
    sink: S,
    state: EngineState,
    viewport: Size,
    window: Option<ViewportWindow>,
    tiles: HashMap<TileAddress, TileHandle>,
    live: HashMap<TileHandle, LiveTile>,
    next_handle: u64,
    observers: Vec<Box<dyn TileEventObserver>>,
    load_tx: Sender<LoadEvent>,
    load_rx: Receiver<LoadEvent>,
    command_tx: Sender<EngineCommand>,
    command_rx: Receiver<EngineCommand>,
}

impl<S: RenderSink> TileGridEngine<S> {
    /// Build an engine from validated options; fails without creating anything
    /// when the options are invalid.
    pub fn new(options: TileLayerOptions, sink: S) -> Result<Self> {
        options.validate()?;

        let (load_tx, load_rx) = unbounded();
        let (command_tx, command_rx) = unbounded();

        Ok(Self {
            source: Box::new(TemplateSource::from_options(&options)),
            projection: Box::new(SphericalMercator),
            options,
            sink,
            state: EngineState::Uninitialized,
            viewport: Size::default(),
            window: None,
            tiles: HashMap::default(),
            live: HashMap::default(),
            next_handle: 0,
            observers: Vec::new(),
            load_tx,
            load_rx,
            command_tx,
            command_rx,
        })
    }

    /// Replace the default spherical mercator projection
    pub fn with_projection(mut self, projection: Box<dyn Projection>) -> Self {
        self.projection = projection;
        self
    }

    /// Replace the URL source built from the options' template
    pub fn with_source(mut self, source: Box<dyn TileSource>) -> Self {
        self.source = source;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn TileEventObserver>) {
        self.observers.push(observer);
    }

    /// Handle for queueing work from observers or load handlers
    pub fn command_sender(&self) -> CommandSender {
        CommandSender::new(self.command_tx.clone())
    }

    pub fn options(&self) -> &TileLayerOptions {
        &self.options
    }

    pub fn projection(&self) -> &dyn Projection {
        self.projection.as_ref()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn window(&self) -> Option<&ViewportWindow> {
        self.window.as_ref()
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Pixel size of the map container; used to center the central tile
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Grid covering the viewport plus the configured buffer
    pub fn grid_for_viewport(&self) -> GridSize {
        GridSize::covering(
            self.viewport,
            self.options.tile_size,
            self.options.tile_buffer_size,
        )
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn tile_count(&self) -> usize {
        self.live.len()
    }

    pub fn handle_at(&self, address: &TileAddress) -> Option<TileHandle> {
        self.tiles.get(address).copied()
    }

    pub fn descriptor(&self, handle: TileHandle) -> Option<&TileDescriptor> {
        self.live.get(&handle).map(|tile| &tile.descriptor)
    }

    pub fn load_state(&self, handle: TileHandle) -> Option<TileLoadState> {
        self.live.get(&handle).map(|tile| tile.load_state)
    }

    /// Descriptors of every live tile, row by row
    pub fn descriptors(&self) -> Vec<&TileDescriptor> {
        let mut tiles: Vec<_> = self.live.values().map(|tile| &tile.descriptor).collect();
        tiles.sort_by_key(|d| (d.address.y, d.address.x));
        tiles
    }

    /// Clear everything and draw a `grid` window around `center` at `zoom`.
    ///
    /// Zoom levels above [`MAX_ZOOM`] are clamped to it.
    pub fn full_redraw(&mut self, center: GeoPoint, zoom: u8, grid: GridSize) -> Result<()> {
        self.do_full_redraw(center, zoom, grid);
        self.settle();
        Ok(())
    }

    /// Full redraw with a grid derived from the viewport size
    pub fn redraw(&mut self, center: GeoPoint, zoom: u8) -> Result<()> {
        let grid = self.grid_for_viewport();
        self.full_redraw(center, zoom, grid)
    }

    /// Follow the layer container to pixel offset `(dx, dy)` from where the
    /// last full redraw left it.
    pub fn shift_by(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.do_shift_by(dx, dy)?;
        self.settle();
        Ok(())
    }

    /// Remove every visual and return to [`EngineState::Uninitialized`]
    pub fn detach(&mut self) {
        self.do_detach();
        self.settle();
    }

    /// Apply pending load events then run queued commands
    pub fn pump(&mut self) -> usize {
        let applied = self.process_loads();
        self.run_queued();
        applied
    }

    /// Apply every load event received so far; returns how many changed a tile.
    ///
    /// Events for evicted tiles, and repeats for tiles already settled, are
    /// dropped.
    pub fn process_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.load_rx.try_recv() {
            let Some(tile) = self.live.get_mut(&event.handle) else {
                #[cfg(feature = "debug")]
                log::trace!("ignoring load event for evicted tile {}", event.handle);
                continue;
            };
            if tile.load_state != TileLoadState::Pending {
                continue;
            }

            match event.outcome {
                LoadOutcome::Loaded => {
                    tile.load_state = TileLoadState::Loaded;
                    self.sink.fade_in(event.handle, self.options.fade_in());
                }
                LoadOutcome::Failed(_reason) => {
                    #[cfg(feature = "debug")]
                    log::warn!(
                        "tile {} ({}) failed to load: {}",
                        tile.descriptor.address,
                        tile.descriptor.url,
                        _reason
                    );
                    tile.load_state = TileLoadState::Failed;
                    self.sink.show_error_tile(event.handle, &self.options.error_tile_url);
                }
            }
            applied += 1;
        }
        applied
    }

    fn settle(&mut self) {
        self.process_loads();
        self.run_queued();
    }

    /// Drain the command queue, each command running to completion before the
    /// next; commands queued meanwhile are picked up by the same loop.
    fn run_queued(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            #[cfg(feature = "debug")]
            log::debug!("running queued {:?}", command);
            match command {
                EngineCommand::FullRedraw { center, zoom, grid } => {
                    self.do_full_redraw(center, zoom, grid)
                }
                EngineCommand::Redraw { center, zoom } => {
                    let grid = self.grid_for_viewport();
                    self.do_full_redraw(center, zoom, grid)
                }
                EngineCommand::ShiftBy { dx, dy } => {
                    if let Err(_e) = self.do_shift_by(dx, dy) {
                        #[cfg(feature = "debug")]
                        log::warn!("dropping queued shift: {}", _e);
                    }
                }
                EngineCommand::Detach => self.do_detach(),
            }
            self.process_loads();
        }
    }

    fn do_full_redraw(&mut self, center: GeoPoint, zoom: u8, grid: GridSize) {
        let zoom = zoom.min(MAX_ZOOM);
        let tile_size = self.options.tile_size;
        let central_tile = address_for(center, zoom);
        let global = self.projection.to_global_pixel(center, tile_size, zoom);
        let central_shift = global.subtract(&central_tile.origin_pixel(tile_size));
        let central_tile_pixel = self.viewport.center().subtract(&central_shift).trunc();

        #[cfg(feature = "debug")]
        log::debug!(
            "full redraw at {:?} z{}: central tile {} at ({}, {}), grid {}x{}",
            center,
            zoom,
            central_tile,
            central_tile_pixel.x,
            central_tile_pixel.y,
            grid.width,
            grid.height
        );

        self.clear_tiles();
        self.sink.move_container(Point::default());

        let window = ViewportWindow::around(central_tile, central_tile_pixel, grid);
        let addresses: Vec<_> = window.addresses().collect();
        self.window = Some(window);
        self.state = EngineState::Ready;

        let drawn = self.create_tiles(&addresses);
        self.notify_draw(&drawn);
    }

    fn do_shift_by(&mut self, dx: f64, dy: f64) -> Result<()> {
        let previous = match (&self.window, self.state) {
            (Some(window), EngineState::Ready) => window.container_offset(),
            _ => return Err(MapError::NotReady),
        };
        let tile_size = self.options.tile_size;
        let offset = TileOffset::new(tile_offset(dx, tile_size), tile_offset(dy, tile_size));

        // Container moved right/down: the left/top side comes into view.
        for _ in previous.x..offset.x {
            self.edge_insert(Edge::Left);
        }
        for _ in offset.x..previous.x {
            self.edge_insert(Edge::Right);
        }
        for _ in previous.y..offset.y {
            self.edge_insert(Edge::Top);
        }
        for _ in offset.y..previous.y {
            self.edge_insert(Edge::Bottom);
        }

        if let Some(window) = self.window.as_mut() {
            window.container_offset = offset;
        }
        Ok(())
    }

    fn do_detach(&mut self) {
        self.clear_tiles();
        self.window = None;
        self.state = EngineState::Uninitialized;
    }

    /// One atomic step: add a line beyond `edge`, then drop the opposite line
    fn edge_insert(&mut self, edge: Edge) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let added = window.extend(edge);
        let dropped = window.retract(edge.opposite());

        #[cfg(feature = "debug")]
        log::trace!(
            "edge insert {:?}: +{} tiles, -{} tiles",
            edge,
            added.len(),
            dropped.len()
        );

        let drawn = self.create_tiles(&added);
        for address in dropped {
            self.evict(&address);
        }
        self.notify_draw(&drawn);
    }

    fn create_tiles(&mut self, addresses: &[TileAddress]) -> Vec<TileDescriptor> {
        let Some(window) = self.window.as_ref() else {
            return Vec::new();
        };
        let tile_size = self.options.tile_size;

        let descriptors: Vec<TileDescriptor> = addresses
            .iter()
            .map(|address| {
                let handle = TileHandle(self.next_handle + 1);
                self.next_handle += 1;
                TileDescriptor {
                    handle,
                    address: *address,
                    position: window.pixel_for(address, tile_size),
                    url: self
                        .source
                        .url(*address)
                        .unwrap_or_else(|| self.options.error_tile_url.clone()),
                }
            })
            .collect();

        for descriptor in &descriptors {
            let previous = self.tiles.insert(descriptor.address, descriptor.handle);
            assert!(
                previous.is_none(),
                "tile {} drawn twice",
                descriptor.address
            );
            let in_grid = descriptor.address.is_in_grid();
            self.live.insert(
                descriptor.handle,
                LiveTile {
                    descriptor: descriptor.clone(),
                    load_state: TileLoadState::Pending,
                },
            );
            self.sink.create_tile_visual(
                descriptor,
                LoadCallback::new(descriptor.handle, self.load_tx.clone()),
            );
            if !in_grid {
                // Nothing to fetch outside the grid; settle on the placeholder.
                let _ = self.load_tx.send(LoadEvent {
                    handle: descriptor.handle,
                    outcome: LoadOutcome::Failed("row outside tile grid".to_string()),
                });
            }
        }
        descriptors
    }

    fn evict(&mut self, address: &TileAddress) {
        let Some(handle) = self.tiles.remove(address) else {
            return;
        };
        if let Some(tile) = self.live.remove(&handle) {
            for observer in &mut self.observers {
                observer.on_remove(&tile.descriptor);
            }
        }
        self.sink.remove_tile_visual(handle);
    }

    fn clear_tiles(&mut self) {
        let mut addresses: Vec<_> = self.tiles.keys().copied().collect();
        addresses.sort_by_key(|a| (a.y, a.x));
        for address in addresses {
            self.evict(&address);
        }
    }

    fn notify_draw(&mut self, drawn: &[TileDescriptor]) {
        if drawn.is_empty() {
            return;
        }
        for observer in &mut self.observers {
            observer.on_draw(drawn);
        }
    }
}

impl<S: RenderSink + std::fmt::Debug> std::fmt::Debug for TileGridEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileGridEngine")
            .field("options", &self.options)
            .field("projection", &self.projection.name())
            .field("state", &self.state)
            .field("window", &self.window)
            .field("tiles", &self.live.len())
            .field("sink", &self.sink)
            .finish()
    }
}
