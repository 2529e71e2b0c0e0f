mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use vision_core::{CellState, EntityId, PlayerId, VisibilityService, VisionSettings};

/// Spawn/move/destroy notifications drive the registry through the typed
/// channel, with effects landing by the next pass.
#[test]
fn lifecycle_events_flow_through_channel() -> anyhow::Result<()> {
    let mut service = common::initialized_service()?;
    let sender = service.event_sender();
    let query = service.query();

    sender.spawned(EntityId(10), PlayerId(0), Vec2::new(25.0, 25.0), 14.0);
    service.run_sweep_now(Instant::now());
    assert!(query.is_visible(PlayerId(0), Vec2::new(25.0, 25.0)));

    sender.moved(EntityId(10), Vec2::new(75.0, 75.0));
    service.run_sweep_now(Instant::now());
    assert_eq!(
        query.state_at(PlayerId(0), Vec2::new(25.0, 25.0)),
        CellState::Explored
    );
    assert!(query.is_visible(PlayerId(0), Vec2::new(75.0, 75.0)));

    sender.destroyed(EntityId(10));
    service.run_sweep_now(Instant::now());
    assert_eq!(
        query.state_at(PlayerId(0), Vec2::new(75.0, 75.0)),
        CellState::Explored
    );
    assert_eq!(service.status().source_count, 0);
    Ok(())
}

/// A duplicated spawn notification must not double a vision ring or
/// orphan a second source when the entity despawns.
#[test]
fn duplicate_spawn_is_a_noop() -> anyhow::Result<()> {
    let mut service = common::initialized_service()?;
    let sender = service.event_sender();

    sender.spawned(EntityId(3), PlayerId(0), Vec2::new(45.0, 45.0), 12.0);
    sender.spawned(EntityId(3), PlayerId(0), Vec2::new(45.0, 45.0), 12.0);
    service.run_sweep_now(Instant::now());
    assert_eq!(service.status().source_count, 1);

    sender.destroyed(EntityId(3));
    service.run_sweep_now(Instant::now());
    assert_eq!(service.status().source_count, 0);
    let (_, _, visible) = service
        .query()
        .snapshot(PlayerId(0))
        .unwrap()
        .count_by_state();
    assert_eq!(visible, 0);
    Ok(())
}

/// Direct registration twice returns the same handle.
#[test]
fn direct_double_register_returns_same_handle() -> anyhow::Result<()> {
    let mut service = common::initialized_service()?;
    let first = service.register(EntityId(8), PlayerId(0), Vec2::new(10.0, 10.0), 9.0);
    let second = service.register(EntityId(8), PlayerId(0), Vec2::new(90.0, 90.0), 30.0);
    assert_eq!(first, second);
    assert_eq!(service.status().source_count, 1);

    assert!(service.unregister(EntityId(8)));
    assert!(!service.unregister(EntityId(8)));
    Ok(())
}

/// An unconfigured service defers passes instead of failing, then starts
/// cleanly once initialized.
#[test]
fn unconfigured_service_defers_until_initialized() -> anyhow::Result<()> {
    let mut service = VisibilityService::new(common::test_settings());

    service.register(EntityId(1), PlayerId(0), Vec2::new(50.0, 50.0), 15.0);
    service.update(Instant::now());
    service.update(Instant::now());
    assert!(!service.status().configured);
    assert_eq!(service.status().pass, 0);
    assert_eq!(
        service.query().state_at(PlayerId(0), Vec2::new(50.0, 50.0)),
        CellState::Unexplored
    );

    service.initialize()?;
    // Initialization takes the map-load path: stale registrations cleared.
    service.register(EntityId(1), PlayerId(0), Vec2::new(50.0, 50.0), 15.0);
    service.update(Instant::now());
    assert!(service.query().is_visible(PlayerId(0), Vec2::new(50.0, 50.0)));
    Ok(())
}

/// With a tiny cell cap the sweep spreads over many update calls but
/// converges to exactly the grid an uncapped sweep produces, and no
/// intermediate read ever exposes a half-updated grid.
#[test]
fn capped_sweep_converges_without_torn_state() -> anyhow::Result<()> {
    let capped_json = r#"{
        "bounds_min": [0.0, 0.0],
        "bounds_max": [100.0, 100.0],
        "cell_size": 10.0,
        "update_interval_secs": 0.05,
        "max_cells_per_pass": 6
    }"#;
    let capped: VisionSettings = serde_json::from_str(capped_json)?;

    let mut reference = common::initialized_service()?;
    reference.register(EntityId(1), PlayerId(0), Vec2::new(40.0, 40.0), 30.0);
    reference.register(EntityId(2), PlayerId(0), Vec2::new(80.0, 20.0), 15.0);
    reference.run_sweep_now(Instant::now());
    let expected = reference
        .query()
        .snapshot(PlayerId(0))
        .unwrap()
        .to_byte_raster();

    let mut service = VisibilityService::new(Arc::new(capped));
    service.initialize()?;
    service.register(EntityId(1), PlayerId(0), Vec2::new(40.0, 40.0), 30.0);
    service.register(EntityId(2), PlayerId(0), Vec2::new(80.0, 20.0), 15.0);

    let query = service.query();
    let t0 = Instant::now();
    let mut t = t0;
    for _ in 0..500 {
        service.update(t);
        t += Duration::from_millis(16);

        // Reads mid-sweep: either nothing published yet or a previously
        // committed full grid; never a partial mix for this owner.
        if let Some(snapshot) = query.snapshot(PlayerId(0)) {
            let (unexplored, explored, visible) = snapshot.count_by_state();
            assert_eq!(unexplored + explored + visible, 100);
        }
        if service.status().pass >= 1 && !service.status().sweep_in_flight {
            break;
        }
    }

    assert!(service.status().pass >= 1, "capped sweep never completed");
    let got = query.snapshot(PlayerId(0)).unwrap().to_byte_raster();
    assert_eq!(got, expected);
    Ok(())
}

/// Reset clears grids, sources and snapshots atomically; the service then
/// accepts a fresh map.
#[test]
fn reset_supports_map_reload() -> anyhow::Result<()> {
    let mut service = common::initialized_service()?;
    let sender = service.event_sender();
    sender.spawned(EntityId(1), PlayerId(0), Vec2::new(50.0, 50.0), 15.0);
    service.run_sweep_now(Instant::now());
    assert!(service.query().is_visible(PlayerId(0), Vec2::new(50.0, 50.0)));

    service.reset();
    let status = service.status();
    assert!(!status.configured);
    assert_eq!(status.source_count, 0);
    assert!(status.owners.is_empty());
    assert!(service.query().snapshot(PlayerId(0)).is_none());

    service.initialize()?;
    service.register(EntityId(2), PlayerId(1), Vec2::new(10.0, 90.0), 10.0);
    service.run_sweep_now(Instant::now());
    assert!(service.query().is_visible(PlayerId(1), Vec2::new(10.0, 90.0)));
    assert!(!service.query().is_visible(PlayerId(0), Vec2::new(50.0, 50.0)));
    Ok(())
}

/// The status surface reports sources, grid dimensions and pass timing.
#[test]
fn status_surface_for_diagnostics() -> anyhow::Result<()> {
    let mut service = common::initialized_service()?;
    service.register(EntityId(1), PlayerId(0), Vec2::new(50.0, 50.0), 15.0);
    service.register(EntityId(2), PlayerId(1), Vec2::new(20.0, 80.0), 10.0);
    service.run_sweep_now(Instant::now());

    let status = service.status();
    assert!(status.configured);
    assert_eq!(status.source_count, 2);
    assert_eq!((status.grid_width, status.grid_height), (10, 10));
    assert_eq!(status.pass, 1);
    assert!(status.last_sweep_duration.is_some());
    assert!(status.last_sweep_cells >= 100);
    assert_eq!(status.owners.len(), 2);
    Ok(())
}

/// A source flagged inactive stays registered but stops contributing.
#[test]
fn inactive_source_keeps_registration() -> anyhow::Result<()> {
    let mut service = common::initialized_service()?;
    service.register(EntityId(1), PlayerId(0), Vec2::new(50.0, 50.0), 15.0);
    service.run_sweep_now(Instant::now());
    assert!(service.query().is_visible(PlayerId(0), Vec2::new(50.0, 50.0)));

    service.set_active(EntityId(1), false);
    service.run_sweep_now(Instant::now());
    assert_eq!(
        service.query().state_at(PlayerId(0), Vec2::new(50.0, 50.0)),
        CellState::Explored
    );
    assert_eq!(service.status().source_count, 1);

    service.set_active(EntityId(1), true);
    service.run_sweep_now(Instant::now());
    assert!(service.query().is_visible(PlayerId(0), Vec2::new(50.0, 50.0)));
    Ok(())
}
