//! Tile layer: binds a [`TileGridEngine`] to a map's lifecycle and events.

use super::{engine::TileGridEngine, sink::RenderSink};
use crate::{
    core::{
        config::TileLayerOptions,
        constants::MAX_ZOOM,
        geo::Point,
        projection::{global_size, Projection},
    },
    input::events::{EventHandled, MapEvent, MapView},
    MapError, Result,
};

#[cfg(feature = "debug")]
use log;

pub struct TileLayer<S: RenderSink> {
    id: String,
    engine: TileGridEngine<S>,
    view: Option<MapView>,
    /// Container offset when the current drag started
    drag_origin: Point,
    /// Pixel offset of the layer container since the last full redraw
    container_offset: Point,
}

impl<S: RenderSink> TileLayer<S> {
    /// Create a detached tile layer; invalid options fail here
    pub fn new(id: impl Into<String>, options: TileLayerOptions, sink: S) -> Result<Self> {
        Ok(Self {
            id: id.into(),
            engine: TileGridEngine::new(options, sink)?,
            view: None,
            drag_origin: Point::default(),
            container_offset: Point::default(),
        })
    }

    pub fn with_projection(mut self, projection: Box<dyn Projection>) -> Self {
        self.engine = self.engine.with_projection(projection);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn engine(&self) -> &TileGridEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TileGridEngine<S> {
        &mut self.engine
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn is_on_map(&self) -> bool {
        self.view.is_some()
    }

    pub fn container_offset(&self) -> Point {
        self.container_offset
    }

    /// Width and height of the whole projected map at the current zoom
    pub fn global_size(&self) -> Result<f64> {
        let view = self.view.as_ref().ok_or(MapError::NotAttached)?;
        Ok(global_size(self.engine.options().tile_size, view.zoom))
    }

    pub fn on_add_to_map(&mut self, view: MapView) -> Result<()> {
        #[cfg(feature = "debug")]
        log::info!(
            "tile layer '{}' added at {:?} z{} ({}x{} px)",
            self.id,
            view.center,
            view.zoom,
            view.size.width,
            view.size.height
        );

        self.view = Some(MapView {
            zoom: view.zoom.min(MAX_ZOOM),
            ..view
        });
        self.engine.set_viewport(view.size);
        self.redraw()
    }

    pub fn on_remove_from_map(&mut self) {
        #[cfg(feature = "debug")]
        log::info!("tile layer '{}' removed", self.id);

        self.engine.detach();
        self.view = None;
        self.drag_origin = Point::default();
        self.container_offset = Point::default();
    }

    /// Rebuild every tile for the current map view
    pub fn redraw(&mut self) -> Result<()> {
        let view = self.view.ok_or(MapError::NotAttached)?;
        self.drag_origin = Point::default();
        self.container_offset = Point::default();
        self.engine.redraw(view.center, view.zoom)
    }

    pub fn handle_event(&mut self, event: &MapEvent) -> Result<EventHandled> {
        let Some(view) = self.view.as_mut() else {
            return Ok(EventHandled::NotHandled);
        };

        match event {
            MapEvent::CenterChanged { center } => {
                view.center = *center;
                self.redraw()?;
            }
            MapEvent::ZoomChanged { zoom } => {
                view.zoom = (*zoom).min(MAX_ZOOM);
                self.redraw()?;
            }
            MapEvent::Resize { size } => {
                view.size = *size;
                self.engine.set_viewport(*size);
                self.redraw()?;
            }
            MapEvent::DragStart => {
                self.drag_origin = self.container_offset;
            }
            MapEvent::Drag {
                start_pixel,
                current_pixel,
            } => {
                let offset = self.drag_origin.add(&current_pixel.subtract(start_pixel));
                self.container_offset = offset;
                self.engine.sink_mut().move_container(offset);
                self.engine.shift_by(offset.x, offset.y)?;
            }
            MapEvent::DragEnd => {}
        }
        Ok(EventHandled::Handled)
    }
}
