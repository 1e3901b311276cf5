//! The ground decal handler: one instance per session, owning every scar and
//! object decal and driving the per-frame passes.

use crate::config::DecalConfig;
use crate::error::{DecalError, ResourceKind};
use crate::events::{DecalEventListener, EventContext, ExplosionEvent};
use crate::geometry::alpha_color;
use crate::interfaces::{
    DecalTextureLoader, FrameContext, GhostId, HeightField, ObjectId, ObjectStates, TextureHandle,
};
use crate::map::{MapDims, SCAR_TEXEL_SIZE};
use crate::math::DecalRng;
use crate::objects::{DecalId, DecalTypeId, ObjectDecalRegistry, SolidObjectInfo};
use crate::render::{DecalDrawBackend, DecalPass, SunLighting};
use crate::scar::{plan_scar, AtlasVariant, Explosion, ScarId, ScarRegistry};
use crate::time::FrameClock;
use glam::Vec3;
use groundmark_metrics::{time_pass, ChurnCounters, ChurnEvent, FramePass, PassTimer};
use tracing::{debug, error, info, trace, warn};

/// Samples kept per pass by the frame timer.
const PASS_TIMER_WINDOW: usize = 120;

/// What one call to [`GroundDecalHandler::draw`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    pub scars_registered: usize,
    pub scars_evicted: usize,
    pub scars_expired: usize,
    pub decals_destroyed: usize,
    pub decals_drawn: usize,
    pub scars_drawn: usize,
    /// False when drawing was skipped (no program); lifecycle passes still ran.
    pub submitted: bool,
}

pub struct GroundDecalHandler {
    config: DecalConfig,
    map: MapDims,
    scars: ScarRegistry,
    objects: ObjectDecalRegistry,
    rng: DecalRng,
    scar_atlas: Option<TextureHandle>,
    /// Visible decals per decal type, rebuilt every frame.
    batches: Vec<Vec<DecalId>>,
    visible_scars: Vec<ScarId>,
    /// Set while the backend has no usable program; logged once per outage.
    program_error: Option<DecalError>,
    churn: ChurnCounters,
    timer: PassTimer,
}

impl GroundDecalHandler {
    /// Create the handler and load the scar atlas.
    ///
    /// A missing atlas is logged and only disables scar drawing.
    pub fn new(
        config: DecalConfig,
        map: MapDims,
        textures: &mut dyn DecalTextureLoader,
    ) -> Result<Self, DecalError> {
        config.validate()?;

        let scar_atlas = if config.draw_decals() {
            match textures.load_scar_atlas() {
                Ok(texture) => Some(texture),
                Err(err) => {
                    error!(%err, "scars will not be drawn");
                    None
                }
            }
        } else {
            None
        };

        info!(
            level = config.decal_level,
            max_scars = config.max_scars,
            max_object_decals = config.max_object_decals,
            mapx = map.mapx,
            mapy = map.mapy,
            "ground decal handler initialized"
        );

        Ok(Self {
            scars: ScarRegistry::new(config.max_scars, map, config.overlap_threshold()),
            objects: ObjectDecalRegistry::new(
                config.max_object_decals,
                map,
                config.min_decal_falloff,
            ),
            rng: DecalRng::default(),
            scar_atlas,
            batches: Vec::new(),
            visible_scars: Vec::new(),
            program_error: None,
            churn: ChurnCounters::new(),
            timer: PassTimer::new(PASS_TIMER_WINDOW),
            config,
            map,
        })
    }

    /// Reseed the generator picking scar atlas variants.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = DecalRng::new(seed);
        self
    }

    pub fn config(&self) -> &DecalConfig {
        &self.config
    }

    pub fn map(&self) -> MapDims {
        self.map
    }

    pub fn scars(&self) -> &ScarRegistry {
        &self.scars
    }

    pub fn objects(&self) -> &ObjectDecalRegistry {
        &self.objects
    }

    pub fn scar_atlas(&self) -> Option<TextureHandle> {
        self.scar_atlas
    }

    /// Why the last frame was not drawn, if the backend had no program.
    pub fn program_error(&self) -> Option<&DecalError> {
        self.program_error.as_ref()
    }

    pub fn churn(&self) -> &ChurnCounters {
        &self.churn
    }

    pub fn pass_timer(&self) -> &PassTimer {
        &self.timer
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.config.draw_decals()
    }

    /// Queue a scar for `explosion`. It is registered at the start of the
    /// next draw. Returns `None` when the blast leaves no mark or the scar
    /// pool is full.
    pub fn add_explosion(
        &mut self,
        explosion: &Explosion,
        heights: &dyn HeightField,
        clock: &FrameClock,
    ) -> Option<ScarId> {
        if !self.enabled() {
            return None;
        }

        let ground = heights.height_at(explosion.pos.x, explosion.pos.z);
        let plan = plan_scar(
            explosion,
            ground,
            self.config.decal_level,
            self.config.damage_limits_radius,
            self.map,
        )?;

        let variant = AtlasVariant::pick(&mut self.rng);
        match self.scars.queue(&plan, clock.sim_frame(), variant) {
            Some(id) => {
                self.churn.record(ChurnEvent::ScarCreated);
                Some(id)
            }
            None => {
                self.churn.record(ChurnEvent::ScarDropped);
                None
            }
        }
    }

    pub fn add_solid_object_decal(
        &mut self,
        object: &SolidObjectInfo,
        textures: &mut dyn DecalTextureLoader,
    ) -> Option<DecalId> {
        self.move_solid_object_decal(object, object.pos, textures)
    }

    /// Re-place `object`'s decal at `pos`; the old one fades out.
    pub fn move_solid_object_decal(
        &mut self,
        object: &SolidObjectInfo,
        pos: Vec3,
        textures: &mut dyn DecalTextureLoader,
    ) -> Option<DecalId> {
        if !self.enabled() {
            return None;
        }
        let id = self.objects.place(object, pos, textures)?;
        self.churn.record(ChurnEvent::DecalCreated);
        Some(id)
    }

    /// Detach `object` from its decal, handing it to `ghost` if one remembers
    /// the object.
    pub fn remove_solid_object_decal(&mut self, object: ObjectId, ghost: Option<GhostId>) -> bool {
        self.enabled() && self.objects.remove(object, ghost)
    }

    /// Destroy `object`'s decal without fading.
    pub fn force_remove_solid_object_decal(&mut self, object: ObjectId) -> bool {
        if !self.enabled() || !self.objects.force_remove(object) {
            return false;
        }
        self.churn.record(ChurnEvent::DecalDestroyed);
        true
    }

    pub fn ghost_destroyed(
        &mut self,
        ghost: GhostId,
        clock: &FrameClock,
        objects: &dyn ObjectStates,
    ) -> bool {
        if !self.enabled() {
            return false;
        }
        let drawn = objects
            .ghost_last_draw_frame(ghost)
            .map_or(false, |frame| clock.drawn_recently(frame));
        self.objects.ghost_destroyed(ghost, drawn)
    }

    /// Forward new sun parameters to the backend.
    pub fn sun_changed(&self, sun: &SunLighting, backend: &mut dyn DecalDrawBackend) {
        if self.enabled() {
            backend.set_sun(sun);
        }
    }

    /// Drop all cached geometry, e.g. after the heightmap was reloaded.
    pub fn invalidate_geometry(&mut self) {
        self.scars.invalidate_geometry();
        self.objects.invalidate_geometry();
    }

    /// Release every scar and decal and all owner back-references.
    pub fn shutdown(&mut self) {
        info!(
            scars = self.scars.len(),
            decals = self.objects.len(),
            "ground decal handler shut down"
        );
        self.scars.clear();
        self.objects.clear();
        self.batches.clear();
        self.visible_scars.clear();
    }

    /// Run one decal frame.
    ///
    /// Order: register queued scars (evicting buried ones), expire old scars,
    /// update and gather visible object decals and scars, then draw object
    /// decals batched by type followed by scars.
    pub fn draw(
        &mut self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn DecalDrawBackend,
    ) -> FrameSummary {
        let mut summary = FrameSummary::default();
        if !self.enabled() {
            return summary;
        }

        let resolved = time_pass!(self.timer, FramePass::Resolve, {
            self.scars.resolve_pending()
        });
        summary.scars_registered = resolved.registered;
        summary.scars_evicted = resolved.evicted;
        self.churn
            .record_n(ChurnEvent::ScarEvicted, resolved.evicted as u64);

        let frame = ctx.clock.sim_frame();
        summary.scars_expired = time_pass!(self.timer, FramePass::Expire, {
            self.scars.expire(frame)
        });
        self.churn
            .record_n(ChurnEvent::ScarExpired, summary.scars_expired as u64);

        let ghosted = self.config.ghosted_buildings;
        let (destroyed, drawn) = time_pass!(self.timer, FramePass::Gather, {
            let type_count = self.objects.types().len();
            self.batches.resize_with(type_count, Vec::new);

            let mut destroyed = 0;
            let mut drawn = 0;
            for (t, batch) in self.batches.iter_mut().enumerate() {
                if self.objects.types()[t].decals().is_empty() {
                    batch.clear();
                    continue;
                }
                let outcome = self.objects.gather(DecalTypeId(t as u32), ctx, ghosted, batch);
                destroyed += outcome.destroyed;
                drawn += outcome.gathered;
            }

            self.visible_scars.clear();
            for &id in self.scars.used_ids() {
                if let Some(scar) = self.scars.get(id) {
                    if ctx.culler.in_view(scar.pos(), scar.radius() + SCAR_TEXEL_SIZE as f32) {
                        self.visible_scars.push(id);
                    }
                }
            }
            (destroyed, drawn)
        });
        summary.decals_destroyed = destroyed;
        summary.decals_drawn = drawn;
        self.churn
            .record_n(ChurnEvent::DecalDestroyed, destroyed as u64);

        if !backend.program_ready() {
            if self.program_error.is_none() {
                let err = DecalError::resource(
                    ResourceKind::Program,
                    "ground decal",
                    "shader program unavailable",
                );
                warn!(%err, "decals not drawn");
                self.program_error = Some(err);
            }
            return summary;
        }
        self.program_error = None;

        let fade = self.config.scar_alpha_fade;
        let map = self.map;
        let draw_frame = ctx.clock.draw_frame();
        summary.scars_drawn = time_pass!(self.timer, FramePass::Draw, {
            backend.bind_shared(ctx.bindings);

            backend.begin_pass(DecalPass::ObjectDecals);
            for (t, batch) in self.batches.iter().enumerate() {
                if batch.is_empty() {
                    continue;
                }
                backend.bind_texture(self.objects.types()[t].texture());
                for &id in batch {
                    let Some(decal) = self.objects.get_mut(id) else {
                        continue;
                    };
                    let color = alpha_color(decal.alpha);
                    if decal.geometry.is_built() {
                        decal.geometry.refresh(ctx.heights, color);
                        self.churn.record(ChurnEvent::GeometryRefreshed);
                    } else {
                        decal
                            .geometry
                            .build_footprint(&decal.footprint, ctx.heights, map, color);
                        self.churn.record(ChurnEvent::GeometryBuilt);
                    }
                    backend.draw_quads(decal.geometry.vertices(), decal.draw_offset());
                }
            }

            let mut scars_drawn = 0;
            if let Some(atlas) = self.scar_atlas {
                backend.begin_pass(DecalPass::Scars);
                backend.bind_texture(atlas);
                for &id in &self.visible_scars {
                    let Some(scar) = self.scars.get_mut(id) else {
                        continue;
                    };
                    let color = [255, 255, 255, scar.alpha_at(frame, fade)];
                    if scar.geometry.is_built() {
                        scar.geometry.refresh(ctx.heights, color);
                        self.churn.record(ChurnEvent::GeometryRefreshed);
                    } else {
                        scar.geometry.build_scar(
                            scar.pos,
                            scar.radius,
                            scar.variant.offset(),
                            ctx.heights,
                            map,
                            color,
                        );
                        self.churn.record(ChurnEvent::GeometryBuilt);
                    }
                    scar.last_draw = Some(draw_frame);
                    backend.draw_quads(scar.geometry.vertices(), Vec3::ZERO);
                    scars_drawn += 1;
                }
            }

            backend.unbind();
            scars_drawn
        });
        summary.submitted = true;

        trace!(?summary, "decal frame");
        summary
    }
}

impl DecalEventListener for GroundDecalHandler {
    fn on_object_created(&mut self, object: &SolidObjectInfo, ctx: &mut EventContext<'_>) {
        self.add_solid_object_decal(object, ctx.textures);
    }

    fn on_object_moved(&mut self, object: &SolidObjectInfo, pos: Vec3, ctx: &mut EventContext<'_>) {
        self.move_solid_object_decal(object, pos, ctx.textures);
    }

    fn on_object_destroyed(&mut self, object: ObjectId, _ctx: &mut EventContext<'_>) {
        self.remove_solid_object_decal(object, None);
    }

    fn on_ghost_created(&mut self, object: ObjectId, ghost: GhostId, _ctx: &mut EventContext<'_>) {
        self.remove_solid_object_decal(object, Some(ghost));
    }

    fn on_ghost_destroyed(&mut self, ghost: GhostId, ctx: &mut EventContext<'_>) {
        self.ghost_destroyed(ghost, ctx.clock, ctx.objects);
    }

    fn on_explosion(&mut self, explosion: &ExplosionEvent, ctx: &mut EventContext<'_>) {
        if !explosion.leaves_scar() {
            debug!("explosion without scar");
            return;
        }
        let blast = Explosion {
            pos: explosion.pos,
            damage: explosion.damage,
            radius: explosion.radius,
        };
        self.add_explosion(&blast, ctx.heights, ctx.clock);
    }

    fn on_unit_loaded(&mut self, unit: ObjectId, _ctx: &mut EventContext<'_>) {
        self.force_remove_solid_object_decal(unit);
    }

    fn on_unit_unloaded(&mut self, unit: &SolidObjectInfo, ctx: &mut EventContext<'_>) {
        self.add_solid_object_decal(unit, ctx.textures);
    }
}
