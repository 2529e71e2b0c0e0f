//! The aggregation sweep.
//!
//! One sweep recomputes every owner's grid from the live source registry:
//! each active source's disc is rasterized into a per-owner coverage mask
//! (bounding-box prefilter, then an exact distance test against cell
//! centers, boundary inclusive), and the mask is committed per owner:
//! covered cells become Visible, cells that lost coverage demote to
//! Explored.
//!
//! A sweep is budgeted: each `step` call tests at most roughly
//! `max_cells_per_pass` cells and then yields, carrying its cursor over to
//! the next call. Grids only change at owner commit, so a sweep spread over
//! several calls never exposes torn state to readers.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use glam::{UVec2, Vec2};

use crate::coords::WorldConfig;
use crate::grid::{PlayerId, SharedSnapshot, VisionLedger};
use crate::sources::{SourceId, SourceRegistry};

/// Rasterization work for one source disc, resumable row by row.
#[derive(Debug)]
struct RasterJob {
    owner: PlayerId,
    source: SourceId,
    center: Vec2,
    radius: f32,
    min_cell: UVec2,
    max_cell: UVec2,
    next_row: u32,
}

/// Progress report from one budgeted step.
#[derive(Debug, Default)]
pub(crate) struct StepOutcome {
    /// Snapshots committed during this step, ready to publish.
    pub committed: Vec<SharedSnapshot>,
    /// Cells tested or rewritten during this step.
    pub cells_touched: usize,
    /// Whether the whole sweep has completed.
    pub finished: bool,
}

/// In-flight recomputation state.
#[derive(Debug)]
pub(crate) struct Sweep {
    pub started: Instant,
    pub pass: u64,
    jobs: VecDeque<RasterJob>,
    covered: HashMap<PlayerId, Vec<bool>>,
    remaining_jobs: HashMap<PlayerId, usize>,
    ready_to_commit: VecDeque<PlayerId>,
    pub cells_touched_total: usize,
}

impl Sweep {
    /// Plan a sweep from the live registry. Owners are drawn from both the
    /// registry and the ledger so a grid whose last source just unregistered
    /// still gets its demotion commit.
    pub fn plan(
        pass: u64,
        started: Instant,
        world: &WorldConfig,
        registry: &SourceRegistry,
        ledger: &VisionLedger,
    ) -> Self {
        let mut owners = registry.owners();
        for owner in ledger.owners() {
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }

        let cell_count = world.cell_count();
        let mut covered = HashMap::new();
        let mut remaining_jobs = HashMap::new();
        for &owner in &owners {
            covered.insert(owner, vec![false; cell_count]);
            remaining_jobs.insert(owner, 0usize);
        }

        let mut jobs = VecDeque::new();
        for (id, source) in registry.iter() {
            if !source.active {
                continue;
            }
            let reach = Vec2::splat(source.radius);
            let min_cell = world.world_to_cell(source.position - reach);
            let max_cell = world.world_to_cell(source.position + reach);
            jobs.push_back(RasterJob {
                owner: source.owner,
                source: id,
                center: source.position,
                radius: source.radius,
                min_cell,
                max_cell,
                next_row: min_cell.y,
            });
            *remaining_jobs.entry(source.owner).or_insert(0) += 1;
        }

        // Owners with no active sources are ready immediately; their commit
        // demotes whatever was Visible.
        let ready_to_commit = owners
            .iter()
            .copied()
            .filter(|owner| remaining_jobs.get(owner).copied().unwrap_or(0) == 0)
            .collect();

        tracing::debug!(
            target: "ashfield::visibility",
            pass,
            owner_count = owners.len(),
            job_count = jobs.len(),
            "visibility.sweep_plan"
        );

        Self {
            started,
            pass,
            jobs,
            covered,
            remaining_jobs,
            ready_to_commit,
            cells_touched_total: 0,
        }
    }

    /// Run sweep work until the cell budget is spent or the sweep finishes.
    /// Sources unregistered or deactivated since the plan are skipped here,
    /// so a despawn between plan and step never contributes coverage.
    pub fn step(
        &mut self,
        budget: usize,
        world: &WorldConfig,
        registry: &SourceRegistry,
        ledger: &mut VisionLedger,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let mut spent = 0usize;

        loop {
            // Commits first: they unblock readers waiting on this pass.
            while spent < budget.max(1) {
                let Some(owner) = self.ready_to_commit.pop_front() else {
                    break;
                };
                spent += self.commit_owner(owner, world, ledger, &mut outcome);
            }

            if spent >= budget && !self.jobs.is_empty() {
                break;
            }

            let Some(mut job) = self.jobs.pop_front() else {
                break;
            };

            // A source removed or deactivated mid-sweep drops its remaining
            // rows on the floor.
            let still_live = registry
                .get(job.source)
                .map(|s| s.active)
                .unwrap_or(false);
            if !still_live {
                self.finish_job(job.owner);
                continue;
            }

            let (cells, done) = self.rasterize(&mut job, world, budget.saturating_sub(spent));
            spent += cells;
            if done {
                self.finish_job(job.owner);
            } else {
                self.jobs.push_front(job);
                break;
            }
        }

        // Drain any owners that became ready on the final job of the loop.
        while let Some(owner) = self.ready_to_commit.pop_front() {
            if spent >= budget {
                self.ready_to_commit.push_front(owner);
                break;
            }
            spent += self.commit_owner(owner, world, ledger, &mut outcome);
        }

        self.cells_touched_total += spent;
        outcome.cells_touched = spent;
        outcome.finished = self.jobs.is_empty() && self.ready_to_commit.is_empty();
        outcome
    }

    fn finish_job(&mut self, owner: PlayerId) {
        let remaining = self.remaining_jobs.entry(owner).or_insert(1);
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.ready_to_commit.push_back(owner);
        }
    }

    /// Rasterize rows of one disc until the row budget runs out. Returns
    /// `(cells tested, job finished)`. Budget granularity is one row; the
    /// overshoot per call is bounded by the disc's bounding-box width.
    fn rasterize(&mut self, job: &mut RasterJob, world: &WorldConfig, budget: usize) -> (usize, bool) {
        let covered = self
            .covered
            .get_mut(&job.owner)
            .expect("coverage mask exists for every planned owner");

        let radius_sq = job.radius * job.radius;
        let mut tested = 0usize;

        while job.next_row <= job.max_cell.y {
            if tested >= budget {
                return (tested, false);
            }
            let z = job.next_row;
            for x in job.min_cell.x..=job.max_cell.x {
                let center = world.cell_to_world(x, z);
                if (center - job.center).length_squared() <= radius_sq {
                    if let Some(idx) = world.cell_index(x, z) {
                        covered[idx] = true;
                    }
                }
            }
            tested += (job.max_cell.x - job.min_cell.x + 1) as usize;
            job.next_row += 1;
        }

        (tested, true)
    }

    /// Promote/demote one owner's grid from its finished coverage mask and
    /// capture the snapshot. Counts the full grid against the budget since
    /// every cell is rewritten.
    fn commit_owner(
        &mut self,
        owner: PlayerId,
        world: &WorldConfig,
        ledger: &mut VisionLedger,
        outcome: &mut StepOutcome,
    ) -> usize {
        let mask = self
            .covered
            .remove(&owner)
            .unwrap_or_else(|| vec![false; world.cell_count()]);

        let grid = ledger.ensure_owner(owner, world.grid_width(), world.grid_height());
        let (promoted, demoted) = grid.apply_coverage(&mask);
        let snapshot = SharedSnapshot::new(grid.snapshot(self.pass));

        tracing::debug!(
            target: "ashfield::visibility",
            pass = self.pass,
            owner = owner.0,
            promoted,
            demoted,
            "visibility.sweep_commit"
        );

        outcome.committed.push(snapshot);
        mask.len()
    }
}
