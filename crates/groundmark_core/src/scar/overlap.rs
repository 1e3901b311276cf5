//! Eviction of scars buried under newer ones.

use super::registry::{ScarId, ScarRegistry};
use tracing::trace;

impl ScarRegistry {
    /// Charge the overdraw of queued scar `id` to every registered scar it
    /// covers, evicting those whose accumulated overdraw exceeds the
    /// threshold. Returns the number of evicted scars.
    ///
    /// Each registered scar is tested at most once per call even when it sits
    /// in several of the cells `id` touches. Registered scars outliving the
    /// newcomer are left alone.
    pub(super) fn resolve_overlaps(&mut self, id: ScarId) -> usize {
        let Some(scar) = self.arena.get(id) else {
            return 0;
        };
        let bounds = scar.bounds;
        let life_time = scar.life_time;

        self.overlap_pass = self.overlap_pass.wrapping_add(1).max(1);
        let pass = self.overlap_pass;
        let mut evicted = 0;

        let cells = self.grid.cell_rect(&bounds);
        let mut candidates = std::mem::take(&mut self.scratch);

        for (cx, cy) in cells.iter() {
            candidates.clear();
            candidates.extend_from_slice(self.grid.cell(cx, cy));

            for &other in &candidates {
                if other == id {
                    continue;
                }
                // evicted earlier in this pass
                let Some(tested) = self.arena.get_mut(other) else {
                    continue;
                };
                if tested.last_test == pass || life_time < tested.life_time {
                    continue;
                }
                tested.last_test = pass;

                let overdraw = bounds.overdraw_on(&tested.bounds);
                if overdraw <= 0 || tested.base_area <= 0 {
                    continue;
                }
                tested.overdrawn += overdraw as f32 / tested.base_area as f32;
                if tested.overdrawn <= self.threshold {
                    continue;
                }

                trace!(scar = ?other, overdrawn = tested.overdrawn, "scar evicted");
                self.remove(other);
                evicted += 1;
            }
        }

        candidates.clear();
        self.scratch = candidates;
        evicted
    }
}

#[cfg(test)]
mod tests {
    use crate::map::MapDims;
    use crate::scar::explosion::ScarPlan;
    use crate::scar::record::AtlasVariant;
    use crate::scar::registry::ScarRegistry;
    use crate::spatial::TexelRect;
    use glam::Vec3;

    fn plan(bounds: TexelRect, ttl: u64) -> ScarPlan {
        ScarPlan {
            pos: Vec3::ZERO,
            radius: 10.0,
            bounds,
            start_alpha: 100.0,
            ttl,
        }
    }

    fn registry(threshold: f32) -> ScarRegistry {
        ScarRegistry::new(16, MapDims::new(128, 128), threshold)
    }

    #[test]
    fn buried_scar_is_evicted() {
        let mut scars = registry(4.0);
        let small = scars
            .queue(&plan(TexelRect::new(10, 10, 12, 12), 100), 0, AtlasVariant::TopLeft)
            .unwrap();
        scars.resolve_pending();

        // overdraw 20*20 / 4 = 100 > 4
        let big = scars
            .queue(&plan(TexelRect::new(0, 0, 30, 30), 200), 1, AtlasVariant::TopLeft)
            .unwrap();
        let outcome = scars.resolve_pending();

        assert_eq!(outcome.evicted, 1);
        assert_eq!(outcome.registered, 1);
        assert!(!scars.contains(small));
        assert!(scars.grid().cells_holding(small).is_empty());
        assert_eq!(scars.used_ids(), &[big]);
    }

    #[test]
    fn overdraw_accumulates_until_threshold() {
        let mut scars = registry(1.0);
        let base = scars
            .queue(&plan(TexelRect::new(0, 0, 10, 10), 100), 0, AtlasVariant::TopLeft)
            .unwrap();
        scars.resolve_pending();

        // each newcomer covers a quarter of the base
        for frame in 1..=4 {
            scars
                .queue(&plan(TexelRect::new(5, 5, 15, 15), 200), frame, AtlasVariant::TopLeft)
                .unwrap();
            scars.resolve_pending();
        }
        assert!(scars.contains(base));
        assert!((scars.get(base).unwrap().overdrawn() - 1.0).abs() < 1e-6);

        scars
            .queue(&plan(TexelRect::new(5, 5, 15, 15), 200), 5, AtlasVariant::TopLeft)
            .unwrap();
        scars.resolve_pending();
        assert!(!scars.contains(base));
    }

    #[test]
    fn scar_spanning_cells_is_charged_once() {
        let mut scars = registry(100.0);
        // spans four grid cells
        let older = scars
            .queue(&plan(TexelRect::new(12, 12, 20, 20), 100), 0, AtlasVariant::TopLeft)
            .unwrap();
        scars.resolve_pending();
        assert_eq!(scars.grid().cells_holding(older).len(), 4);

        scars
            .queue(&plan(TexelRect::new(12, 12, 20, 20), 100), 1, AtlasVariant::TopLeft)
            .unwrap();
        scars.resolve_pending();
        assert!((scars.get(older).unwrap().overdrawn() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn longer_lived_scars_are_not_charged() {
        let mut scars = registry(0.5);
        let lasting = scars
            .queue(&plan(TexelRect::new(0, 0, 10, 10), 1000), 0, AtlasVariant::TopLeft)
            .unwrap();
        scars.resolve_pending();

        scars
            .queue(&plan(TexelRect::new(0, 0, 10, 10), 10), 1, AtlasVariant::TopLeft)
            .unwrap();
        let outcome = scars.resolve_pending();
        assert_eq!(outcome.evicted, 0);
        assert_eq!(scars.get(lasting).unwrap().overdrawn(), 0.0);
    }

    #[test]
    fn same_batch_scars_do_not_evict_each_other() {
        let mut scars = registry(0.5);
        let rect = TexelRect::new(0, 0, 10, 10);
        let a = scars.queue(&plan(rect, 100), 0, AtlasVariant::TopLeft).unwrap();
        let b = scars.queue(&plan(rect, 100), 0, AtlasVariant::TopLeft).unwrap();
        let outcome = scars.resolve_pending();
        assert_eq!(outcome.registered, 2);
        assert!(scars.contains(a) && scars.contains(b));
        assert_eq!(scars.free_count() + scars.len(), scars.capacity());
    }
}
