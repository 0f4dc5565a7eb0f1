use std::{thread, time::Duration};

use anyhow::{Context, Result};
use tilegrid::{
    layers::tile::{FetchingSink, MemorySink, RenderSink},
    GeoPoint, MapEvent, MapView, Point, Size, TileLayer, TileLayerOptions,
};

/// Headless tile layer demo.
///
/// Usage: `tilegrid-app [options.json] [--fetch]`
///
/// Without `--fetch` every load is completed in memory; with it the tiles
/// are downloaded from the configured server.
fn main() -> Result<()> {
    env_logger::init();

    let mut config_path = None;
    let mut fetch = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--fetch" => fetch = true,
            path => config_path = Some(path.to_string()),
        }
    }

    let options = match config_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading tile layer options from {}", path))?;
            TileLayerOptions::from_json(&json)
                .with_context(|| format!("parsing tile layer options in {}", path))?
        }
        None => TileLayerOptions::openstreetmap(),
    };

    // San Francisco in a 1200x800 viewport
    let view = MapView::new(GeoPoint::new(37.7749, -122.4194), 12, Size::new(1200.0, 800.0));

    if fetch {
        let mut layer = TileLayer::new("osm", options, FetchingSink::new())?;
        run(&mut layer, view, |layer| {
            let fetched = layer.engine_mut().sink_mut().drain_fetched();
            if fetched == 0 {
                thread::sleep(Duration::from_millis(50));
            }
        })?;
        let shown = layer.engine().sink().len();
        log::info!("{} tiles on the fetching surface", shown);
    } else {
        let mut layer = TileLayer::new("osm", options, MemorySink::new())?;
        run(&mut layer, view, |layer| {
            layer.engine_mut().sink_mut().complete_all();
        })?;
    }

    Ok(())
}

/// Add the layer, drag it around and settle loads after every step
fn run<S, F>(layer: &mut TileLayer<S>, view: MapView, mut settle: F) -> Result<()>
where
    S: RenderSink,
    F: FnMut(&mut TileLayer<S>),
{
    layer.on_add_to_map(view)?;
    report(layer, "initial draw");

    layer.handle_event(&MapEvent::DragStart)?;
    let start = Point::new(600.0, 400.0);
    for step in 1..=10 {
        let current = start.add(&Point::new(-70.0 * step as f64, 45.0 * step as f64));
        layer.handle_event(&MapEvent::Drag {
            start_pixel: start,
            current_pixel: current,
        })?;
        settle(layer);
        layer.engine_mut().pump();
    }
    layer.handle_event(&MapEvent::DragEnd)?;
    report(layer, "after drag");

    for _ in 0..20 {
        settle(layer);
        layer.engine_mut().pump();
    }

    let descriptors = layer.engine().descriptors();
    let json = serde_json::to_string_pretty(&descriptors).context("serializing descriptors")?;
    println!("{}", json);
    Ok(())
}

fn report<S: RenderSink>(layer: &TileLayer<S>, stage: &str) {
    let engine = layer.engine();
    if let Some(window) = engine.window() {
        log::info!(
            "{}: {} tiles from {:?} to {:?}, container at {:?}",
            stage,
            engine.tile_count(),
            window.left_top(),
            window.right_bottom(),
            layer.container_offset()
        );
    }
}
