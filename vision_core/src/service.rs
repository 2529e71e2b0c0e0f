//! The visibility service.
//!
//! [`VisibilityService`] is the single owner of all mutable visibility
//! state: the working grids, the source registry and the in-flight sweep.
//! The host constructs one per match, injects its [`VisionQuery`] and
//! `Arc<WorldConfig>` into consumers, and calls [`VisibilityService::update`]
//! from a fixed-interval timer off the render thread. There is no global
//! instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use glam::Vec2;

use crate::aggregator::Sweep;
use crate::config::{VisionSettings, VisionSettingsHandle};
use crate::coords::{WorldConfig, WorldConfigError};
use crate::events::{event_channel, EntityEvent, EntityEventSender};
use crate::grid::{PlayerId, VisionLedger};
use crate::metrics::{OwnerStateCounts, VisionStatus};
use crate::query::{SharedView, VisionQuery};
use crate::sources::{EntityId, SourceId, SourceRegistry, VisionSource};

pub struct VisibilityService {
    settings: VisionSettingsHandle,
    world: Option<Arc<WorldConfig>>,
    ledger: VisionLedger,
    registry: SourceRegistry,
    shared: Arc<SharedView>,
    events_tx: EntityEventSender,
    events_rx: Receiver<EntityEvent>,
    sweep: Option<Sweep>,
    last_sweep_started: Option<Instant>,
    pass: u64,
    last_sweep_duration: Option<Duration>,
    last_sweep_cells: usize,
    warned_unconfigured: bool,
}

impl VisibilityService {
    /// Create an unconfigured service. Sweeps are deferred until
    /// [`initialize`](Self::initialize) installs the world mapping at map
    /// load; queries resolve to Unexplored in the meantime.
    pub fn new(settings: Arc<VisionSettings>) -> Self {
        let (events_tx, events_rx) = event_channel();
        Self {
            settings: VisionSettingsHandle::new(settings),
            world: None,
            ledger: VisionLedger::default(),
            registry: SourceRegistry::default(),
            shared: Arc::new(SharedView::default()),
            events_tx,
            events_rx,
            sweep: None,
            last_sweep_started: None,
            pass: 0,
            last_sweep_duration: None,
            last_sweep_cells: 0,
            warned_unconfigured: false,
        }
    }

    /// Build the world mapping from the current settings and start fresh:
    /// any previous grids, sources and snapshots are cleared atomically
    /// before the new mapping is installed (map load and map reload take
    /// the same path).
    pub fn initialize(&mut self) -> Result<(), WorldConfigError> {
        let world = Arc::new(self.settings.get().world_config()?);
        self.clear_state();
        tracing::info!(
            target: "ashfield::visibility",
            grid_width = world.grid_width(),
            grid_height = world.grid_height(),
            cell_size = world.cell_size() as f64,
            "visibility.initialized"
        );
        self.shared.set_world(Some(Arc::clone(&world)));
        self.world = Some(world);
        self.warned_unconfigured = false;
        Ok(())
    }

    /// Tear down for map unload: clears every per-owner grid, the registry
    /// and all published snapshots, and uninstalls the world mapping.
    pub fn reset(&mut self) {
        self.clear_state();
        self.shared.set_world(None);
        self.world = None;
        tracing::info!(target: "ashfield::visibility", "visibility.reset");
    }

    /// Swap in new settings (new map bounds, tuning) and reinitialize.
    pub fn reconfigure(&mut self, settings: Arc<VisionSettings>) -> Result<(), WorldConfigError> {
        self.settings.replace(settings);
        self.initialize()
    }

    fn clear_state(&mut self) {
        self.ledger.clear();
        self.registry.clear();
        self.sweep = None;
        self.last_sweep_started = None;
        self.pass = 0;
        self.last_sweep_duration = None;
        self.last_sweep_cells = 0;
        self.shared.clear();
        // Notifications queued against the old map are meaningless now.
        for _ in self.events_rx.try_iter() {}
    }

    /// Fire-and-forget sender for entity lifecycle code.
    pub fn event_sender(&self) -> EntityEventSender {
        self.events_tx.clone()
    }

    /// Read facade for consumers. Cheap to clone per consumer.
    pub fn query(&self) -> VisionQuery {
        VisionQuery::new(Arc::clone(&self.shared))
    }

    /// The canonical world mapping. Every consumer that maps coordinates
    /// must use this instance rather than deriving its own bounds.
    pub fn world_config(&self) -> Option<Arc<WorldConfig>> {
        self.world.clone()
    }

    pub fn settings(&self) -> Arc<VisionSettings> {
        self.settings.get()
    }

    /// Register a vision source for an entity. Registering an entity twice
    /// returns the existing handle.
    pub fn register(
        &mut self,
        entity: EntityId,
        owner: PlayerId,
        position: Vec2,
        radius: f32,
    ) -> SourceId {
        tracing::trace!(
            target: "ashfield::visibility",
            entity = entity.0,
            owner = owner.0,
            radius = radius as f64,
            "visibility.source_registered"
        );
        self.registry
            .register(entity, VisionSource::new(owner, position, radius))
    }

    /// Remove an entity's source. Idempotent; the source is excluded from
    /// the next sweep onward even if one is already in flight.
    pub fn unregister(&mut self, entity: EntityId) -> bool {
        match self.registry.handle_of(entity) {
            Some(id) => self.registry.unregister(id),
            None => false,
        }
    }

    pub fn update_position(&mut self, entity: EntityId, position: Vec2) -> bool {
        match self.registry.handle_of(entity) {
            Some(id) => self.registry.update_position(id, position),
            None => false,
        }
    }

    pub fn set_active(&mut self, entity: EntityId, active: bool) -> bool {
        match self.registry.handle_of(entity) {
            Some(id) => self.registry.set_active(id, active),
            None => false,
        }
    }

    /// Periodic entry point. Drains lifecycle notifications, then runs at
    /// most one budgeted slice of sweep work: a new sweep begins only when
    /// the update interval has elapsed since the previous sweep started,
    /// and an oversized sweep resumes where it left off. Never blocks.
    pub fn update(&mut self, now: Instant) {
        self.drain_events();

        if self.world.is_none() {
            if !self.warned_unconfigured {
                tracing::warn!(
                    target: "ashfield::visibility",
                    "visibility.update_skipped: world mapping not initialized"
                );
                self.warned_unconfigured = true;
            }
            return;
        }

        if self.sweep.is_none() && self.sweep_due(now) {
            self.begin_sweep(now);
        }
        if self.sweep.is_some() {
            self.step_sweep(now);
        }
    }

    /// Run a full sweep immediately, ignoring the interval and the cell
    /// cap. Intended for map-load warmup and tests; regular operation goes
    /// through [`update`](Self::update).
    pub fn run_sweep_now(&mut self, now: Instant) {
        self.drain_events();
        if self.world.is_none() {
            return;
        }
        if self.sweep.is_none() {
            self.begin_sweep(now);
        }
        while let Some(sweep) = self.sweep.as_mut() {
            let world = self.world.as_ref().expect("world checked above");
            let outcome = sweep.step(usize::MAX, world, &self.registry, &mut self.ledger);
            for snapshot in outcome.committed {
                self.shared.publish(snapshot);
            }
            if outcome.finished {
                self.complete_sweep(now);
            }
        }
    }

    fn sweep_due(&self, now: Instant) -> bool {
        match self.last_sweep_started {
            Some(started) => {
                now.saturating_duration_since(started) >= self.settings.get().update_interval()
            }
            None => true,
        }
    }

    fn begin_sweep(&mut self, now: Instant) {
        let world = self.world.as_ref().expect("sweep requires a world mapping");
        self.sweep = Some(Sweep::plan(
            self.pass + 1,
            now,
            world,
            &self.registry,
            &self.ledger,
        ));
        self.last_sweep_started = Some(now);
    }

    fn step_sweep(&mut self, now: Instant) {
        let budget = self.settings.get().max_cells_per_pass.max(1);
        let Some(sweep) = self.sweep.as_mut() else {
            return;
        };
        let world = self.world.as_ref().expect("sweep requires a world mapping");
        let outcome = sweep.step(budget, world, &self.registry, &mut self.ledger);
        for snapshot in outcome.committed {
            self.shared.publish(snapshot);
        }
        if outcome.finished {
            self.complete_sweep(now);
        }
    }

    fn complete_sweep(&mut self, now: Instant) {
        let Some(sweep) = self.sweep.take() else {
            return;
        };
        self.pass = sweep.pass;
        self.last_sweep_duration = Some(now.saturating_duration_since(sweep.started));
        self.last_sweep_cells = sweep.cells_touched_total;
        tracing::debug!(
            target: "ashfield::visibility",
            pass = self.pass,
            cells = self.last_sweep_cells,
            source_count = self.registry.len(),
            "visibility.sweep_complete"
        );
    }

    fn drain_events(&mut self) {
        let events: Vec<EntityEvent> = self.events_rx.try_iter().collect();
        for event in events {
            match event {
                EntityEvent::Spawned {
                    entity,
                    owner,
                    position,
                    vision_radius,
                } => {
                    self.register(entity, owner, position, vision_radius);
                }
                EntityEvent::Destroyed { entity } => {
                    self.unregister(entity);
                }
                EntityEvent::Moved { entity, position } => {
                    self.update_position(entity, position);
                }
            }
        }
    }

    /// Status surface for diagnostics and tuning.
    pub fn status(&self) -> VisionStatus {
        let (grid_width, grid_height) = self
            .world
            .as_ref()
            .map(|w| (w.grid_width(), w.grid_height()))
            .unwrap_or((0, 0));

        let mut owners: Vec<OwnerStateCounts> = self
            .ledger
            .owners()
            .filter_map(|owner| self.ledger.get(owner))
            .map(|grid| {
                let (unexplored, explored, visible) = grid.count_by_state();
                OwnerStateCounts {
                    owner: grid.owner,
                    unexplored,
                    explored,
                    visible,
                }
            })
            .collect();
        owners.sort_by_key(|c| c.owner.0);

        VisionStatus {
            configured: self.world.is_some(),
            source_count: self.registry.len(),
            grid_width,
            grid_height,
            pass: self.pass,
            last_sweep_duration: self.last_sweep_duration,
            last_sweep_cells: self.last_sweep_cells,
            sweep_in_flight: self.sweep.is_some(),
            owners,
        }
    }
}
