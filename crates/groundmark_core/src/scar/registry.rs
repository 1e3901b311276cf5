use super::explosion::ScarPlan;
use super::record::{AtlasVariant, Scar};
use crate::arena::{SlotArena, SlotId};
use crate::error::DecalError;
use crate::map::MapDims;
use crate::spatial::ScarGrid;
use tracing::debug;

/// Handle of a scar in the registry.
pub type ScarId = SlotId;

/// Outcome of resolving one batch of queued scars.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub registered: usize,
    pub evicted: usize,
}

/// Fixed-capacity store of explosion scars plus their spatial index.
///
/// A scar moves through three states:
/// - pending: allocated and filled in, waiting for the next resolve pass
/// - used: registered in the grid and drawn each frame
/// - free: recycled, id back on the free list
///
/// A slot is claimed when its scar is queued, so every slot is in exactly one
/// state: `free_count() + pending_ids().len() + len() == capacity()`.
///
/// Every used scar is registered in exactly the grid cells its bounds touch;
/// pending and free scars are registered nowhere.
pub struct ScarRegistry {
    pub(super) arena: SlotArena<Scar>,
    pub(super) used: Vec<ScarId>,
    pub(super) pending: Vec<ScarId>,
    pub(super) grid: ScarGrid,
    pub(super) overlap_pass: u32,
    pub(super) threshold: f32,
    pub(super) scratch: Vec<ScarId>,
    map: MapDims,
}

impl ScarRegistry {
    /// Create a registry with every slot allocated up front.
    pub fn new(capacity: usize, map: MapDims, overlap_threshold: f32) -> Self {
        Self {
            arena: SlotArena::preallocated(capacity),
            used: Vec::with_capacity(capacity),
            pending: Vec::new(),
            grid: ScarGrid::new(map),
            overlap_pass: 0,
            threshold: overlap_threshold,
            scratch: Vec::new(),
            map,
        }
    }

    #[inline]
    pub fn map(&self) -> MapDims {
        self.map
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    #[inline]
    pub fn overlap_threshold(&self) -> f32 {
        self.threshold
    }

    /// Number of registered (drawn) scars.
    #[inline]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.arena.free_count()
    }

    pub fn used_ids(&self) -> &[ScarId] {
        &self.used
    }

    pub fn pending_ids(&self) -> &[ScarId] {
        &self.pending
    }

    pub fn grid(&self) -> &ScarGrid {
        &self.grid
    }

    pub fn get(&self, id: ScarId) -> Option<&Scar> {
        self.arena.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ScarId) -> Option<&mut Scar> {
        self.arena.get_mut(id)
    }

    pub fn contains(&self, id: ScarId) -> bool {
        self.arena.contains(id)
    }

    /// Claim a free slot.
    pub fn allocate(&mut self) -> Result<ScarId, DecalError> {
        self.arena.alloc()
    }

    /// Reset a slot and put its id back on the free list.
    ///
    /// The caller must have deregistered the scar already; use
    /// [`ScarRegistry::remove`] for used scars.
    pub fn recycle(&mut self, id: ScarId) -> bool {
        debug_assert!(
            !self.used.contains(&id),
            "recycling a registered scar leaves stale grid entries"
        );
        self.arena.recycle(id)
    }

    /// Claim a slot for `plan` and queue it for the next resolve pass.
    ///
    /// Returns `None` when the registry is full; the scar is simply dropped.
    pub fn queue(&mut self, plan: &ScarPlan, frame: u64, variant: AtlasVariant) -> Option<ScarId> {
        let id = match self.allocate() {
            Ok(id) => id,
            Err(err) => {
                debug!(%err, "scar dropped");
                return None;
            }
        };

        let scar = self.arena.get_mut(id)?;
        scar.pos = plan.pos;
        scar.radius = plan.radius;
        scar.creation_frame = frame;
        scar.life_time = frame + plan.ttl;
        scar.start_alpha = plan.start_alpha;
        scar.alpha_decay = plan.alpha_decay();
        scar.bounds = plan.bounds;
        scar.base_area = plan.bounds.area();
        scar.overdrawn = 0.0;
        scar.last_test = 0;
        scar.variant = variant;

        self.pending.push(id);
        Some(id)
    }

    /// Resolve overlaps of every queued scar against the registered ones,
    /// then register the whole batch.
    ///
    /// Scars of the same batch are not resolved against each other.
    pub fn resolve_pending(&mut self) -> ResolveOutcome {
        if self.pending.is_empty() {
            return ResolveOutcome::default();
        }

        let pending = std::mem::take(&mut self.pending);
        let mut outcome = ResolveOutcome::default();

        for &id in &pending {
            outcome.evicted += self.resolve_overlaps(id);
        }

        for &id in &pending {
            let Some(scar) = self.arena.get(id) else {
                continue;
            };
            let bounds = scar.bounds;
            self.grid.insert(id, &bounds);
            self.used.push(id);
            outcome.registered += 1;
        }

        // hand the (now empty) buffer back to keep its allocation
        self.pending = pending;
        self.pending.clear();
        outcome
    }

    /// Remove every used scar whose lifetime ended before `frame`.
    pub fn expire(&mut self, frame: u64) -> usize {
        let mut expired = 0;
        let mut i = 0;
        while i < self.used.len() {
            let id = self.used[i];
            let alive = self.arena.get(id).map_or(false, |s| s.life_time >= frame);
            if alive {
                i += 1;
                continue;
            }
            self.remove_used_at(i);
            expired += 1;
        }
        expired
    }

    /// Deregister and recycle a used scar. Returns `false` if `id` is not used.
    pub fn remove(&mut self, id: ScarId) -> bool {
        match self.used.iter().position(|&u| u == id) {
            Some(i) => {
                self.remove_used_at(i);
                true
            }
            None => false,
        }
    }

    fn remove_used_at(&mut self, i: usize) {
        let id = self.used.swap_remove(i);
        if let Some(scar) = self.arena.get(id) {
            let bounds = scar.bounds;
            self.grid.remove(id, &bounds);
        }
        self.arena.recycle(id);
    }

    /// Force every scar to rebuild its geometry on its next draw.
    pub fn invalidate_geometry(&mut self) {
        for scar in self.arena.values_mut() {
            scar.geometry.invalidate();
            scar.last_draw = None;
        }
    }

    /// Drop every scar, pending or used.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.used.clear();
        self.pending.clear();
        self.arena.clear();
    }
}
