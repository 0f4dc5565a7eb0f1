use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tilegrid::layers::tile::{
    EngineState, GridPoint, MemorySink, RecordingObserver, TileGridEngine, TileLoadState,
};
use tilegrid::{GeoPoint, GridSize, Size, TileAddress, TileLayerOptions};

/// End-to-end checks of the viewport engine against an in-memory surface
#[cfg(test)]
mod engine_tests {
    use super::*;

    fn options() -> TileLayerOptions {
        TileLayerOptions::new(
            "tiles/{z}/{x}/{y}.png",
            vec!["t0".into(), "t1".into(), "t2".into(), "t3".into()],
            256,
            "http://placeholder.example/error.png",
        )
    }

    fn init_logging() {
        #[cfg(feature = "debug")]
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn engine() -> TileGridEngine<MemorySink> {
        init_logging();
        let mut engine = TileGridEngine::new(options(), MemorySink::new()).unwrap();
        engine.set_viewport(Size::new(1024.0, 768.0));
        engine
    }

    /// The sink shows exactly the window's addresses, once each
    fn assert_sink_matches_window(engine: &TileGridEngine<MemorySink>) {
        let window = engine.window().expect("engine has a window");
        let expected: HashSet<TileAddress> = window.addresses().collect();

        let shown: Vec<TileAddress> = engine.sink().visuals().map(|(_, v)| v.address).collect();
        let unique: HashSet<TileAddress> = shown.iter().copied().collect();

        assert_eq!(shown.len(), unique.len(), "duplicate tile visuals");
        assert_eq!(unique, expected, "visuals differ from window");
        assert_eq!(engine.tile_count() as u64, window.tile_count());
        assert_eq!(
            engine.sink().created_count() - engine.sink().removed_count(),
            engine.sink().len()
        );
    }

    /// Small deterministic generator so the sequences are reproducible
    fn deltas(seed: u64, count: usize) -> Vec<(f64, f64)> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let dx = ((state >> 33) % 301) as f64 - 150.0;
                let dy = ((state >> 17) % 301) as f64 - 150.0;
                (dx, dy)
            })
            .collect()
    }

    #[test]
    fn test_scenario_from_center_of_world() {
        let mut engine = engine();
        engine
            .full_redraw(GeoPoint::new(0.0, 0.0), 2, GridSize::new(3, 3))
            .unwrap();

        let window = engine.window().unwrap();
        assert_eq!(window.central_tile(), TileAddress::new(2, 2, 2));
        assert_eq!(window.left_top(), GridPoint::new(1, 1));
        assert_eq!(window.right_bottom(), GridPoint::new(3, 3));

        let handle = engine.handle_at(&TileAddress::new(1, 1, 2)).unwrap();
        assert_eq!(
            engine.descriptor(handle).unwrap().url,
            tilegrid::url_for(
                &TileAddress::new(1, 1, 2),
                "tiles/{z}/{x}/{y}.png",
                &options().subdomains
            )
        );
        assert_eq!(engine.descriptor(handle).unwrap().url, "http://t2.tiles/2/1/1.png");
        assert_sink_matches_window(&engine);
    }

    #[test]
    fn test_full_redraw_window_sizes() {
        let centers = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(51.5074, -0.1278),
            GeoPoint::new(-33.8688, 151.2093),
            GeoPoint::new(64.1466, -21.9426),
        ];
        for (i, center) in centers.into_iter().enumerate() {
            for (w, h) in [(1, 1), (2, 3), (5, 4), (6, 5)] {
                let mut engine = engine();
                let zoom = 3 + i as u8 * 3;
                engine.full_redraw(center, zoom, GridSize::new(w, h)).unwrap();

                let window = engine.window().unwrap();
                assert_eq!(window.tile_count(), (w * h) as u64);
                assert!(window.contains(&window.central_tile()));
                assert_eq!(window.central_tile(), tilegrid::address_for(center, zoom));
                assert_sink_matches_window(&engine);
            }
        }
    }

    #[test]
    fn test_central_tile_pixel_places_center_mid_viewport() {
        let mut engine = engine();
        let center = GeoPoint::new(48.8566, 2.3522);
        let zoom = 12;
        engine.full_redraw(center, zoom, GridSize::new(5, 5)).unwrap();

        let window = engine.window().unwrap();
        let global = engine.projection().to_global_pixel(center, 256, zoom);
        let central_origin = window.central_tile().origin_pixel(256);
        let center_on_screen = window
            .central_tile_pixel()
            .add(&global.subtract(&central_origin));

        // Truncation moves the tile by less than one pixel.
        assert!((center_on_screen.x - 512.0).abs() < 1.0);
        assert!((center_on_screen.y - 384.0).abs() < 1.0);
    }

    #[test]
    fn test_incremental_shifts_match_batched_shift() {
        for seed in 1..=8u64 {
            let center = GeoPoint::new(40.7128, -74.0060);
            let mut incremental = engine();
            incremental.full_redraw(center, 10, GridSize::new(6, 5)).unwrap();
            let mut batched = engine();
            batched.full_redraw(center, 10, GridSize::new(6, 5)).unwrap();

            let mut total = (0.0, 0.0);
            for (dx, dy) in deltas(seed, 40) {
                total.0 += dx;
                total.1 += dy;
                incremental.shift_by(total.0, total.1).unwrap();
                assert_sink_matches_window(&incremental);
            }
            batched.shift_by(total.0, total.1).unwrap();

            let a = incremental.window().unwrap();
            let b = batched.window().unwrap();
            assert_eq!(a.left_top(), b.left_top(), "seed {}", seed);
            assert_eq!(a.right_bottom(), b.right_bottom(), "seed {}", seed);
            assert_eq!(a.container_offset(), b.container_offset(), "seed {}", seed);
            assert_sink_matches_window(&batched);
        }
    }

    #[test]
    fn test_each_evicted_tile_removed_exactly_once() {
        let mut engine = engine();
        let recorder = Rc::new(RefCell::new(RecordingObserver::default()));
        engine.add_observer(Box::new(recorder.clone()));
        engine
            .full_redraw(GeoPoint::new(35.6762, 139.6503), 9, GridSize::new(4, 4))
            .unwrap();

        for step in 1..=6 {
            engine.shift_by(step as f64 * 256.0, -(step as f64) * 128.0).unwrap();
        }
        engine.shift_by(0.0, 0.0).unwrap();

        let recorder = recorder.borrow();
        let removed: Vec<_> = recorder.removals.iter().map(|d| d.handle).collect();
        let unique: HashSet<_> = removed.iter().collect();
        assert_eq!(removed.len(), unique.len(), "a tile was evicted twice");
        assert_eq!(removed.len(), engine.sink().removed_count());

        let drawn: usize = recorder.draws.iter().map(|batch| batch.len()).sum();
        assert_eq!(drawn, engine.sink().created_count());
        assert_sink_matches_window(&engine);
    }

    #[test]
    fn test_edge_batches_are_single_lines() {
        let mut engine = engine();
        engine
            .full_redraw(GeoPoint::new(0.0, 0.0), 6, GridSize::new(5, 3))
            .unwrap();
        let recorder = Rc::new(RefCell::new(RecordingObserver::default()));
        engine.add_observer(Box::new(recorder.clone()));

        // Three columns to the left in one call, then two rows up.
        engine.shift_by(3.0 * 256.0, 0.0).unwrap();
        engine.shift_by(3.0 * 256.0, -2.0 * 256.0).unwrap();

        let recorder = recorder.borrow();
        assert_eq!(recorder.draws.len(), 5);
        for batch in &recorder.draws[..3] {
            assert_eq!(batch.len(), 3);
            let x = batch[0].address.x;
            assert!(batch.iter().all(|d| d.address.x == x));
        }
        for batch in &recorder.draws[3..] {
            assert_eq!(batch.len(), 5);
            let y = batch[0].address.y;
            assert!(batch.iter().all(|d| d.address.y == y));
        }
    }

    #[test]
    fn test_slow_loads_do_not_block_panning() {
        let mut engine = engine();
        engine
            .full_redraw(GeoPoint::new(0.0, 0.0), 5, GridSize::new(4, 4))
            .unwrap();
        let initial = engine.sink().pending_handles();
        let callbacks: Vec<_> = initial
            .iter()
            .filter_map(|h| engine.sink_mut().take_callback(*h))
            .collect();
        assert_eq!(callbacks.len(), 16);

        // Pan far enough that every initial tile is evicted while still loading.
        engine.shift_by(-4.0 * 256.0, 0.0).unwrap();
        assert!(initial.iter().all(|h| engine.descriptor(*h).is_none()));
        assert!(initial.iter().all(|h| !engine.sink().pending_handles().contains(h)));

        for callback in callbacks {
            callback.loaded();
        }
        assert_eq!(engine.process_loads(), 0);

        assert_eq!(engine.sink_mut().complete_all(), 16);
        assert_eq!(engine.pump(), 16);
        for descriptor in engine.descriptors() {
            assert_eq!(engine.load_state(descriptor.handle), Some(TileLoadState::Loaded));
        }
    }

    #[test]
    fn test_detach_then_redraw() {
        let mut engine = engine();
        engine
            .full_redraw(GeoPoint::new(0.0, 0.0), 2, GridSize::new(3, 3))
            .unwrap();
        engine.detach();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(engine.shift_by(256.0, 0.0).is_err());

        engine.redraw(GeoPoint::new(0.0, 0.0), 2).unwrap();
        assert_eq!(engine.state(), EngineState::Ready);
        // 1024x768 viewport with one spare tile per side
        assert_eq!(engine.window().unwrap().width(), 6);
        assert_eq!(engine.window().unwrap().height(), 5);
        assert_sink_matches_window(&engine);
    }
}
