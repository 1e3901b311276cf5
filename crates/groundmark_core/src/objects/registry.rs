//! Pool of footprint decals grouped by decal type.
//!
//! Decals refer to their owner by id only. The registry keeps the reverse
//! direction in two tables (live object -> decal, ghost -> decal); an entry
//! exists exactly while the decal's owner tag names that object or ghost.

use super::decal::{
    DecalId, DecalOwner, DecalTypeId, ObjectGroundDecal, SolidObjectDecalType, SolidObjectInfo,
};
use crate::arena::SlotArena;
use crate::error::DecalError;
use crate::interfaces::{DecalTextureLoader, FrameContext, GhostId, ObjectId, OwnerState};
use crate::map::MapDims;
use glam::Vec3;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Features fainter than this are not drawn.
const MIN_FEATURE_ALPHA: f32 = 0.01;

/// Result of one lifecycle pass over a decal type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GatherOutcome {
    pub gathered: usize,
    pub destroyed: usize,
}

enum Verdict {
    Draw,
    Skip,
    Destroy,
}

pub struct ObjectDecalRegistry {
    arena: SlotArena<ObjectGroundDecal>,
    types: Vec<SolidObjectDecalType>,
    /// Lowercase name -> type; `None` caches a failed texture load.
    type_lookup: HashMap<String, Option<DecalTypeId>>,
    by_object: HashMap<ObjectId, DecalId>,
    by_ghost: HashMap<GhostId, DecalId>,
    min_falloff: f32,
    map: MapDims,
}

impl ObjectDecalRegistry {
    pub fn new(capacity: usize, map: MapDims, min_falloff: f32) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            types: Vec::new(),
            type_lookup: HashMap::new(),
            by_object: HashMap::new(),
            by_ghost: HashMap::new(),
            min_falloff,
            map,
        }
    }

    #[inline]
    pub fn map(&self) -> MapDims {
        self.map
    }

    /// Live decals across all types.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    pub fn types(&self) -> &[SolidObjectDecalType] {
        &self.types
    }

    pub fn decal_type_info(&self, id: DecalTypeId) -> Option<&SolidObjectDecalType> {
        self.types.get(id.index())
    }

    pub fn get(&self, id: DecalId) -> Option<&ObjectGroundDecal> {
        self.arena.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: DecalId) -> Option<&mut ObjectGroundDecal> {
        self.arena.get_mut(id)
    }

    pub fn decal_of_object(&self, object: ObjectId) -> Option<DecalId> {
        self.by_object.get(&object).copied()
    }

    pub fn decal_of_ghost(&self, ghost: GhostId) -> Option<DecalId> {
        self.by_ghost.get(&ghost).copied()
    }

    /// Number of owner back-references held (objects plus ghosts).
    pub fn back_references(&self) -> usize {
        self.by_object.len() + self.by_ghost.len()
    }

    /// Look up or create the decal type for texture `name`.
    ///
    /// Names are case-insensitive. A texture that fails to load is logged
    /// once and the failure cached, so later objects of that type get no
    /// decal without retrying.
    pub fn decal_type(
        &mut self,
        name: &str,
        loader: &mut dyn DecalTextureLoader,
    ) -> Option<DecalTypeId> {
        let lower = name.to_lowercase();
        if let Some(cached) = self.type_lookup.get(&lower) {
            return *cached;
        }

        let resolved = match loader.load_object_decal_texture(&lower) {
            Ok(texture) => {
                let id = DecalTypeId(self.types.len() as u32);
                self.types.push(SolidObjectDecalType {
                    name: lower.clone(),
                    texture,
                    decals: Vec::new(),
                });
                debug!(name = %lower, "decal type created");
                Some(id)
            }
            Err(err) => {
                warn!(%err, "object decal type disabled");
                None
            }
        };

        self.type_lookup.insert(lower, resolved);
        resolved
    }

    /// Give `object` a fresh decal at its current position.
    pub fn add(
        &mut self,
        object: &SolidObjectInfo,
        loader: &mut dyn DecalTextureLoader,
    ) -> Option<DecalId> {
        self.place(object, object.pos, loader)
    }

    /// Give `object` a fresh decal at `pos`. Its previous decal, if any, is
    /// orphaned and fades out; the new one starts invisible.
    pub fn place(
        &mut self,
        object: &SolidObjectInfo,
        pos: Vec3,
        loader: &mut dyn DecalTextureLoader,
    ) -> Option<DecalId> {
        let def = &object.decal;
        if !def.use_ground_decal {
            return None;
        }
        let type_id = self.decal_type(&def.type_name, loader)?;

        if let Some(old) = self.by_object.remove(&object.id) {
            if let Some(decal) = self.arena.get_mut(old) {
                decal.owner = DecalOwner::Orphaned;
            }
        }

        let id = match self.arena.alloc() {
            Ok(id) => id,
            Err(err) => {
                debug!(%err, object = object.id.0, "object decal dropped");
                return None;
            }
        };

        let list = &mut self.types[type_id.index()].decals;
        let decal = self.arena.get_mut(id)?;
        decal.owner = DecalOwner::Live(object.id);
        decal.pos = pos;
        decal.footprint = object.footprint_at(pos);
        decal.decal_type = Some(type_id);
        decal.alpha = 0.0;
        decal.alpha_falloff = def.decay_speed.max(self.min_falloff);
        decal.radius = object.cull_radius();
        decal.list_index = list.len();
        list.push(id);

        self.by_object.insert(object.id, id);
        Some(id)
    }

    /// Detach `object` from its decal. With a ghost the decal stays visible
    /// as long as the ghost is drawn; without one it fades out.
    pub fn remove(&mut self, object: ObjectId, ghost: Option<GhostId>) -> bool {
        let Some(id) = self.by_object.remove(&object) else {
            return false;
        };
        let Some(decal) = self.arena.get_mut(id) else {
            return false;
        };
        match ghost {
            Some(ghost) => {
                decal.owner = DecalOwner::Ghost(ghost);
                self.by_ghost.insert(ghost, id);
            }
            None => decal.owner = DecalOwner::Orphaned,
        }
        true
    }

    /// Destroy `object`'s decal immediately, without fading.
    pub fn force_remove(&mut self, object: ObjectId) -> bool {
        match self.by_object.get(&object).copied() {
            Some(id) => self.destroy(id).is_ok(),
            None => false,
        }
    }

    /// Orphan the decal a destroyed ghost held. When the ghost was not drawn
    /// last frame its decal is dropped on the next pass instead of fading.
    pub fn ghost_destroyed(&mut self, ghost: GhostId, drawn_recently: bool) -> bool {
        let Some(id) = self.by_ghost.remove(&ghost) else {
            return false;
        };
        let Some(decal) = self.arena.get_mut(id) else {
            return false;
        };
        decal.owner = DecalOwner::Orphaned;
        if !drawn_recently {
            decal.alpha = 0.0;
        }
        true
    }

    /// Release a decal: drop its back-reference, swap it out of its type list
    /// and recycle the slot.
    pub fn destroy(&mut self, id: DecalId) -> Result<(), DecalError> {
        let Some(decal) = self.arena.get(id) else {
            return Err(DecalError::StaleHandle(id));
        };
        let owner = decal.owner;
        let list_index = decal.list_index;
        let decal_type = decal.decal_type;

        match owner {
            DecalOwner::Live(object) => {
                if self.by_object.get(&object) == Some(&id) {
                    self.by_object.remove(&object);
                }
            }
            DecalOwner::Ghost(ghost) => {
                if self.by_ghost.get(&ghost) == Some(&id) {
                    self.by_ghost.remove(&ghost);
                }
            }
            DecalOwner::Orphaned => {}
        }

        if let Some(type_id) = decal_type {
            debug_assert_eq!(
                self.types
                    .get(type_id.index())
                    .and_then(|t| t.decals.get(list_index)),
                Some(&id)
            );
            self.unlink(type_id, list_index);
        }

        if self.arena.recycle(id) {
            Ok(())
        } else {
            Err(DecalError::StaleHandle(id))
        }
    }

    /// Swap-remove entry `index` of a type list and repoint the decal that
    /// moved into its place.
    fn unlink(&mut self, type_id: DecalTypeId, index: usize) {
        let Some(decal_type) = self.types.get_mut(type_id.index()) else {
            return;
        };
        if index >= decal_type.decals.len() {
            return;
        }
        decal_type.decals.swap_remove(index);
        if let Some(&moved) = decal_type.decals.get(index) {
            if let Some(moved) = self.arena.get_mut(moved) {
                moved.list_index = index;
            }
        }
    }

    /// Lifecycle pass over one decal type: update alphas from owners, fade and
    /// destroy orphans, and collect the decals to draw this frame into `out`.
    pub fn gather(
        &mut self,
        type_id: DecalTypeId,
        ctx: &FrameContext<'_>,
        ghosted_buildings: bool,
        out: &mut Vec<DecalId>,
    ) -> GatherOutcome {
        out.clear();
        let mut outcome = GatherOutcome::default();
        let t = type_id.index();
        if t >= self.types.len() {
            return outcome;
        }

        let fade = ctx.clock.frame_seconds();
        let full_view = ctx.los.full_view();

        let mut i = 0;
        while i < self.types[t].decals.len() {
            let id = self.types[t].decals[i];
            let Some(decal) = self.arena.get_mut(id) else {
                // recycled behind the list's back
                self.unlink(type_id, i);
                continue;
            };

            let verdict = match decal.owner {
                DecalOwner::Orphaned => fade_out(decal, fade, true),
                DecalOwner::Ghost(ghost) => {
                    let drawn = ctx
                        .objects
                        .ghost_last_draw_frame(ghost)
                        .map_or(false, |frame| ctx.clock.drawn_recently(frame));
                    if drawn {
                        Verdict::Draw
                    } else {
                        fade_out(decal, fade, false)
                    }
                }
                DecalOwner::Live(object) => match ctx.objects.owner_state(object) {
                    None => {
                        decal.owner = DecalOwner::Orphaned;
                        if self.by_object.get(&object) == Some(&id) {
                            self.by_object.remove(&object);
                        }
                        fade_out(decal, fade, true)
                    }
                    Some(OwnerState::Unit {
                        build_progress,
                        is_icon,
                    }) => {
                        let los = ctx.los.unit_los(object);
                        let hidden = !full_view
                            && !los.in_los()
                            && (!ghosted_buildings || !los.prev_los());
                        if is_icon || hidden {
                            Verdict::Skip
                        } else {
                            decal.alpha = build_progress.max(0.0);
                            Verdict::Draw
                        }
                    }
                    Some(OwnerState::Feature { draw_alpha }) => {
                        if !ctx.los.feature_in_los(object) || draw_alpha < MIN_FEATURE_ALPHA {
                            Verdict::Skip
                        } else {
                            decal.alpha = draw_alpha;
                            Verdict::Draw
                        }
                    }
                },
            };

            match verdict {
                Verdict::Destroy => match self.destroy(id) {
                    Ok(()) => outcome.destroyed += 1,
                    Err(err) => {
                        debug!(%err, "decal already released");
                        i += 1;
                    }
                },
                Verdict::Skip => i += 1,
                Verdict::Draw => {
                    if let Some(decal) = self.arena.get(id) {
                        if ctx.culler.in_view(decal.pos, decal.radius) {
                            out.push(id);
                        }
                    }
                    i += 1;
                }
            }
        }

        outcome.gathered = out.len();
        outcome
    }

    /// Force every decal to rebuild its geometry on its next draw.
    pub fn invalidate_geometry(&mut self) {
        for decal in self.arena.values_mut() {
            decal.geometry.invalidate();
        }
    }

    /// Release every decal and back-reference. Decal types (and their
    /// textures) are kept.
    pub fn clear(&mut self) {
        for decal_type in &mut self.types {
            decal_type.decals.clear();
        }
        self.by_object.clear();
        self.by_ghost.clear();
        self.arena.clear();
    }
}

/// Linear fade; destroys once alpha drops below zero.
fn fade_out(decal: &mut ObjectGroundDecal, seconds: f32, visible: bool) -> Verdict {
    decal.alpha -= decal.alpha_falloff * seconds;
    if decal.alpha < 0.0 {
        Verdict::Destroy
    } else if visible {
        Verdict::Draw
    } else {
        Verdict::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResourceKind;
    use crate::geometry::Facing;
    use crate::interfaces::{LosQuery, LosStatus, ObjectStates, TextureHandle};
    use crate::objects::decal::GroundDecalDef;
    use crate::render::SharedBindings;
    use crate::time::FrameClock;
    use std::sync::Arc;
    use std::time::Duration;

    struct Textures {
        loads: usize,
    }

    impl DecalTextureLoader for Textures {
        fn load_object_decal_texture(&mut self, name: &str) -> Result<TextureHandle, DecalError> {
            self.loads += 1;
            if name == "missing" {
                Err(DecalError::resource(ResourceKind::ObjectDecalTexture, name, "not found"))
            } else {
                Ok(TextureHandle(self.loads as u64))
            }
        }

        fn load_scar_atlas(&mut self) -> Result<TextureHandle, DecalError> {
            Ok(TextureHandle(0))
        }
    }

    #[derive(Default)]
    struct World {
        units: HashMap<ObjectId, (f32, LosStatus)>,
        ghost_frames: HashMap<GhostId, u64>,
    }

    impl ObjectStates for World {
        fn owner_state(&self, object: ObjectId) -> Option<OwnerState> {
            self.units.get(&object).map(|&(build_progress, _)| OwnerState::Unit {
                build_progress,
                is_icon: false,
            })
        }

        fn ghost_last_draw_frame(&self, ghost: GhostId) -> Option<u64> {
            self.ghost_frames.get(&ghost).copied()
        }
    }

    impl LosQuery for World {
        fn unit_los(&self, unit: ObjectId) -> LosStatus {
            self.units.get(&unit).map_or(LosStatus::NONE, |u| u.1)
        }

        fn feature_in_los(&self, _feature: ObjectId) -> bool {
            true
        }
    }

    fn object(id: u64, type_name: &str) -> SolidObjectInfo {
        SolidObjectInfo {
            id: ObjectId(id),
            pos: Vec3::new(256.0, 0.0, 256.0),
            facing: Facing::South,
            decal: Arc::new(GroundDecalDef {
                use_ground_decal: true,
                type_name: type_name.into(),
                size_x: 2,
                size_y: 2,
                decay_speed: 1.0,
            }),
        }
    }

    fn pass(
        registry: &mut ObjectDecalRegistry,
        world: &World,
        clock: &FrameClock,
        type_id: DecalTypeId,
    ) -> (GatherOutcome, Vec<DecalId>) {
        let bindings = SharedBindings::default();
        let flat = |_: f32, _: f32| 0.0;
        let everywhere = |_: Vec3, _: f32| true;
        let ctx = FrameContext {
            clock,
            heights: &flat,
            culler: &everywhere,
            los: world,
            objects: world,
            bindings: &bindings,
        };
        let mut out = Vec::new();
        let outcome = registry.gather(type_id, &ctx, true, &mut out);
        (outcome, out)
    }

    fn clock_with_step(millis: u64) -> FrameClock {
        let mut clock = FrameClock::new();
        clock.begin_draw_frame(Duration::from_millis(millis));
        clock
    }

    #[test]
    fn type_lookup_is_case_insensitive_and_caches_failures() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };

        let a = registry.decal_type("Factory", &mut textures);
        let b = registry.decal_type("FACTORY", &mut textures);
        assert_eq!(a, b);
        assert_eq!(registry.types().len(), 1);
        assert_eq!(registry.types()[0].name(), "factory");

        assert!(registry.decal_type("Missing", &mut textures).is_none());
        assert!(registry.decal_type("missing", &mut textures).is_none());
        assert_eq!(textures.loads, 2);
    }

    #[test]
    fn move_orphans_previous_decal() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        let unit = object(1, "pad");

        let first = registry.add(&unit, &mut textures).unwrap();
        let second = registry
            .place(&unit, Vec3::new(300.0, 0.0, 300.0), &mut textures)
            .unwrap();

        assert_eq!(registry.get(first).unwrap().owner(), DecalOwner::Orphaned);
        assert_eq!(registry.get(second).unwrap().owner(), DecalOwner::Live(ObjectId(1)));
        assert_eq!(registry.get(second).unwrap().alpha(), 0.0);
        assert_eq!(registry.decal_of_object(ObjectId(1)), Some(second));
        assert_eq!(registry.types()[0].decals().len(), 2);
    }

    #[test]
    fn force_remove_restores_list_size() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        registry.add(&object(1, "pad"), &mut textures).unwrap();
        registry.add(&object(2, "pad"), &mut textures).unwrap();
        let before = registry.types()[0].decals().len();

        registry.add(&object(3, "pad"), &mut textures).unwrap();
        assert!(registry.force_remove(ObjectId(3)));
        assert_eq!(registry.types()[0].decals().len(), before);
        assert_eq!(registry.decal_of_object(ObjectId(3)), None);
        assert!(!registry.force_remove(ObjectId(3)));

        // list indices stay consistent after swap-removal
        for (i, id) in registry.types()[0].decals().iter().enumerate() {
            assert_eq!(registry.get(*id).unwrap().list_index, i);
        }
    }

    #[test]
    fn orphan_fades_then_is_destroyed_once() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        let mut world = World::default();
        world.units.insert(ObjectId(1), (1.0, LosStatus::IN_LOS));

        let id = registry.add(&object(1, "pad"), &mut textures).unwrap();
        let type_id = registry.get(id).unwrap().decal_type().unwrap();

        let clock = clock_with_step(250);
        let (_, drawn) = pass(&mut registry, &world, &clock, type_id);
        assert_eq!(drawn, vec![id]);
        assert_eq!(registry.get(id).unwrap().alpha(), 1.0);

        assert!(registry.remove(ObjectId(1), None));
        world.units.clear();

        let mut last = registry.get(id).unwrap().alpha();
        let mut destroyed = 0;
        for _ in 0..10 {
            let (outcome, _) = pass(&mut registry, &world, &clock, type_id);
            destroyed += outcome.destroyed;
            match registry.get(id) {
                Some(decal) => {
                    assert!(decal.alpha() < last);
                    last = decal.alpha();
                }
                None => break,
            }
        }

        // 1.0 alpha at 0.25 per frame: 0.75, 0.5, 0.25, 0.0, then gone
        assert_eq!(destroyed, 1);
        assert!(registry.get(id).is_none());
        assert!(registry.types()[0].decals().is_empty());
        assert_eq!(registry.back_references(), 0);
    }

    #[test]
    fn ghost_keeps_decal_while_drawn() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        let mut world = World::default();
        world.units.insert(ObjectId(1), (1.0, LosStatus::IN_LOS));
        let id = registry.add(&object(1, "pad"), &mut textures).unwrap();
        let type_id = registry.get(id).unwrap().decal_type().unwrap();

        let clock = clock_with_step(500);
        pass(&mut registry, &world, &clock, type_id);

        registry.remove(ObjectId(1), Some(GhostId(9)));
        world.units.clear();
        world.ghost_frames.insert(GhostId(9), clock.draw_frame());

        let (_, drawn) = pass(&mut registry, &world, &clock, type_id);
        assert_eq!(drawn, vec![id]);
        assert_eq!(registry.get(id).unwrap().alpha(), 1.0);

        // ghost went unseen: the decal decays and is hidden
        world.ghost_frames.insert(GhostId(9), 0);
        let mut later = clock.clone();
        later.begin_draw_frame(Duration::from_millis(500));
        later.begin_draw_frame(Duration::from_millis(500));
        let (_, drawn) = pass(&mut registry, &world, &later, type_id);
        assert!(drawn.is_empty());
        assert_eq!(registry.get(id).unwrap().alpha(), 0.5);
    }

    #[test]
    fn destroyed_unseen_ghost_drops_decal_next_pass() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        let world = World::default();
        let id = registry.add(&object(1, "pad"), &mut textures).unwrap();
        let type_id = registry.get(id).unwrap().decal_type().unwrap();
        registry.get_mut(id).unwrap().alpha = 1.0;

        registry.remove(ObjectId(1), Some(GhostId(4)));
        assert!(registry.ghost_destroyed(GhostId(4), false));
        assert_eq!(registry.decal_of_ghost(GhostId(4)), None);

        let (outcome, _) = pass(&mut registry, &world, &clock_with_step(16), type_id);
        assert_eq!(outcome.destroyed, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn units_outside_los_are_hidden_unless_previously_seen() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        let mut world = World::default();
        world.units.insert(ObjectId(1), (0.5, LosStatus::NONE));
        world.units.insert(ObjectId(2), (0.5, LosStatus::PREV_LOS));
        let hidden = registry.add(&object(1, "pad"), &mut textures).unwrap();
        let remembered = registry.add(&object(2, "pad"), &mut textures).unwrap();
        let type_id = registry.get(hidden).unwrap().decal_type().unwrap();

        let (outcome, drawn) = pass(&mut registry, &world, &clock_with_step(16), type_id);
        assert_eq!(drawn, vec![remembered]);
        assert_eq!(outcome.gathered, 1);
        assert_eq!(registry.get(hidden).unwrap().alpha(), 0.0);
    }

    #[test]
    fn full_pool_drops_new_decals() {
        let mut registry = ObjectDecalRegistry::new(1, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        assert!(registry.add(&object(1, "pad"), &mut textures).is_some());
        assert!(registry.add(&object(2, "pad"), &mut textures).is_none());
        assert_eq!(registry.decal_of_object(ObjectId(2)), None);
    }

    #[test]
    fn released_slot_in_type_list_keeps_indices_consistent() {
        let mut registry = ObjectDecalRegistry::new(16, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        let mut world = World::default();
        for id in 1..=3 {
            registry.add(&object(id, "pad"), &mut textures).unwrap();
            world.units.insert(ObjectId(id), (1.0, LosStatus::IN_LOS));
        }
        let first = registry.types()[0].decals()[0];
        assert!(registry.arena.recycle(first));

        let (outcome, _) = pass(&mut registry, &world, &clock_with_step(16), DecalTypeId(0));
        assert_eq!(outcome.gathered, 2);
        assert_eq!(registry.types()[0].decals().len(), 2);
        for (i, id) in registry.types()[0].decals().iter().enumerate() {
            assert_eq!(registry.get(*id).unwrap().list_index, i);
        }

        let moved = registry.types()[0].decals()[0];
        assert!(registry.destroy(moved).is_ok());
        assert_eq!(registry.types()[0].decals().len(), 1);
    }

    #[test]
    fn destroying_twice_reports_stale_handle() {
        let mut registry = ObjectDecalRegistry::new(4, MapDims::new(64, 64), 0.01);
        let mut textures = Textures { loads: 0 };
        let id = registry.add(&object(1, "pad"), &mut textures).unwrap();

        assert!(registry.destroy(id).is_ok());
        assert!(matches!(registry.destroy(id), Err(DecalError::StaleHandle(stale)) if stale == id));
        assert!(registry.types()[0].decals().is_empty());
    }
}
