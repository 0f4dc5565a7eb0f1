//! Notifications produced by the tile engine and the queue that feeds it.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::core::geo::{GeoPoint, GridSize, Point, TileAddress};

/// Engine-issued identifier of one tile visual. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileHandle(pub u64);

impl std::fmt::Display for TileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a collaborator needs to know about one drawn tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub handle: TileHandle,
    pub address: TileAddress,
    /// Top-left corner in layer-container pixels
    pub position: Point,
    /// Image source; the error placeholder for rows outside the grid
    pub url: String,
}

/// Result of loading one tile image
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
}

/// Posted by a sink when a tile image finishes loading
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent {
    pub handle: TileHandle,
    pub outcome: LoadOutcome,
}

/// Observer of tile draw/remove notifications.
///
/// Observers run inside engine operations and cannot call back into the
/// engine; use a [`CommandSender`] to queue further work.
pub trait TileEventObserver {
    /// Fired after a full redraw or an edge batch with every tile just created
    fn on_draw(&mut self, _tiles: &[TileDescriptor]) {}

    /// Fired for each evicted tile before its visual is removed
    fn on_remove(&mut self, _tile: &TileDescriptor) {}
}

/// Work queued for the engine while another operation is running
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    FullRedraw {
        center: GeoPoint,
        zoom: u8,
        grid: GridSize,
    },
    Redraw {
        center: GeoPoint,
        zoom: u8,
    },
    ShiftBy {
        dx: f64,
        dy: f64,
    },
    Detach,
}

/// Cloneable handle for queueing [`EngineCommand`]s
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<EngineCommand>,
}

impl CommandSender {
    pub(crate) fn new(tx: Sender<EngineCommand>) -> Self {
        Self { tx }
    }

    /// Queue a command; returns false once the engine has been dropped
    pub fn send(&self, command: EngineCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn shift_by(&self, dx: f64, dy: f64) -> bool {
        self.send(EngineCommand::ShiftBy { dx, dy })
    }

    pub fn redraw(&self, center: GeoPoint, zoom: u8) -> bool {
        self.send(EngineCommand::Redraw { center, zoom })
    }
}

/// Observer that records every notification, handy for tests and tooling
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub draws: Vec<Vec<TileDescriptor>>,
    pub removals: Vec<TileDescriptor>,
}

impl TileEventObserver for RecordingObserver {
    fn on_draw(&mut self, tiles: &[TileDescriptor]) {
        self.draws.push(tiles.to_vec());
    }

    fn on_remove(&mut self, tile: &TileDescriptor) {
        self.removals.push(tile.clone());
    }
}

impl<T: TileEventObserver + ?Sized> TileEventObserver for std::rc::Rc<std::cell::RefCell<T>> {
    fn on_draw(&mut self, tiles: &[TileDescriptor]) {
        self.borrow_mut().on_draw(tiles);
    }

    fn on_remove(&mut self, tile: &TileDescriptor) {
        self.borrow_mut().on_remove(tile);
    }
}
