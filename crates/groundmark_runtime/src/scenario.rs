//! Scripted skirmish feeding the decal event queue

use crate::assets::{FACTORY_DECAL, TANK_DECAL};
use crate::world::{ground, Terrain, World};
use groundmark_core::events::{DecalEvent, DecalEventQueue, ExplosionEvent};
use groundmark_core::geometry::Facing;
use groundmark_core::glam::Vec3;
use groundmark_core::interfaces::{GhostId, ObjectId};
use groundmark_core::math::DecalRng;
use groundmark_core::objects::{GroundDecalDef, SolidObjectInfo};
use groundmark_core::render::SunLighting;
use std::sync::Arc;
use tracing::debug;

const FACTORIES: u64 = 12;
const TANK: ObjectId = ObjectId(100);
const SCOUTED: ObjectId = ObjectId(3);
const RAZED: ObjectId = ObjectId(5);

pub struct Scenario {
    terrain: Terrain,
    rng: DecalRng,
    factory: Arc<GroundDecalDef>,
    tank: Arc<GroundDecalDef>,
    tank_pos: Vec3,
    explosions: u64,
}

impl Scenario {
    pub fn new(terrain: Terrain, seed: u64) -> Self {
        Self {
            terrain,
            rng: DecalRng::new(seed),
            factory: Arc::new(GroundDecalDef {
                use_ground_decal: true,
                type_name: FACTORY_DECAL.into(),
                size_x: 6,
                size_y: 4,
                decay_speed: 0.5,
            }),
            tank: Arc::new(GroundDecalDef {
                use_ground_decal: true,
                type_name: TANK_DECAL.into(),
                size_x: 2,
                size_y: 2,
                decay_speed: 2.0,
            }),
            tank_pos: ground(&terrain, 256.0, 256.0),
            explosions: 0,
        }
    }

    fn factory_at(&self, id: u64) -> SolidObjectInfo {
        let col = (id % 4) as f32;
        let row = (id / 4) as f32;
        SolidObjectInfo {
            id: ObjectId(id),
            pos: ground(&self.terrain, 192.0 + col * 160.0, 192.0 + row * 192.0),
            facing: if id % 2 == 0 { Facing::South } else { Facing::East },
            decal: Arc::clone(&self.factory),
        }
    }

    fn tank_info(&self) -> SolidObjectInfo {
        SolidObjectInfo {
            id: TANK,
            pos: self.tank_pos,
            facing: Facing::North,
            decal: Arc::clone(&self.tank),
        }
    }

    fn random_explosion(&mut self) -> ExplosionEvent {
        self.explosions += 1;
        let width = self.terrain.map.world_width();
        let depth = self.terrain.map.world_depth();
        let x = (self.rng.next_u32() % 1000) as f32 / 1000.0 * width;
        let z = (self.rng.next_u32() % 1000) as f32 / 1000.0 * depth;
        let radius = 16.0 + (self.rng.next_u32() % 48) as f32;
        let damage = 50.0 + (self.rng.next_u32() % 400) as f32;

        let mut pos = ground(&self.terrain, x, z);
        if self.explosions % 11 == 0 {
            pos.y += radius * 2.0;
        }
        ExplosionEvent {
            pos,
            damage,
            radius,
            explosion_scar: (self.explosions % 13 == 0).then_some(false),
        }
    }

    /// Advance the script to sim frame `frame`. Returns new sun parameters
    /// when the lighting changes this frame.
    pub fn step(
        &mut self,
        frame: u64,
        draw_frame: u64,
        world: &mut World,
        queue: &mut DecalEventQueue,
    ) -> Option<SunLighting> {
        if frame == 0 {
            for id in 0..FACTORIES {
                world.spawn(ObjectId(id));
                queue.push(DecalEvent::ObjectCreated(self.factory_at(id)));
            }
        }

        if frame % 5 == 0 {
            let explosion = self.random_explosion();
            queue.push(DecalEvent::Explosion(explosion));
        }

        match frame {
            120 => {
                world.spawn(TANK);
                queue.push(DecalEvent::ObjectCreated(self.tank_info()));
            }
            f if f > 120 && f < 400 && f % 30 == 0 => {
                self.tank_pos = ground(&self.terrain, self.tank_pos.x + 48.0, self.tank_pos.z + 24.0);
                queue.push(DecalEvent::ObjectMoved {
                    object: self.tank_info(),
                    pos: self.tank_pos,
                });
            }
            200 => {
                world.lose_sight(SCOUTED, GhostId(SCOUTED.0), draw_frame);
                queue.push(DecalEvent::GhostCreated {
                    object: SCOUTED,
                    ghost: GhostId(SCOUTED.0),
                });
            }
            260 => {
                world.kill(SCOUTED);
                queue.push(DecalEvent::ObjectDestroyed(SCOUTED));
            }
            320 => {
                world.forget_ghost(GhostId(SCOUTED.0));
                queue.push(DecalEvent::GhostDestroyed(GhostId(SCOUTED.0)));
            }
            380 => {
                world.kill(RAZED);
                queue.push(DecalEvent::ObjectDestroyed(RAZED));
            }
            400 => queue.push(DecalEvent::UnitLoaded(TANK)),
            430 => {
                self.tank_pos = ground(&self.terrain, 640.0, 320.0);
                queue.push(DecalEvent::UnitUnloaded(self.tank_info()));
            }
            450 => {
                debug!(frame, "sun moved");
                return Some(SunLighting {
                    ambient: Vec3::new(0.35, 0.3, 0.4),
                    shadow_density: 0.6,
                });
            }
            _ => {}
        }

        None
    }
}
