//! Tile collision: a box falls onto a Tiled map and is pushed back out.
//!
//! Decodes a small map from JSON, drops a player onto it one tick at a time,
//! and resolves each contact by moving the player up by the overlap.
//!
//! Run with: `RUST_LOG=debug cargo run -p reitr --example tile_collision`

use std::rc::Rc;

use reitr::prelude::*;

const MAP: &str = r#"{
    "tilesets": [{
        "image": "terrain.png",
        "tilewidth": 16, "tileheight": 16,
        "imagewidth": 64, "imageheight": 16,
        "firstgid": 1,
        "tiles": [
            { "id": 0, "objectgroup": { "objects": [{ "x": 0, "y": 0, "width": 16, "height": 16 }] } },
            { "id": 1, "objectgroup": { "objects": [{ "x": 0, "y": 8, "width": 16, "height": 8 }] } }
        ]
    }],
    "layers": [{
        "type": "tilelayer", "name": "ground", "width": 8, "height": 6,
        "data": [
            0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 2, 2, 0, 0,
            0, 0, 0, 0, 0, 0, 0, 0,
            1, 1, 1, 1, 1, 1, 1, 1
        ]
    }]
}"#;

const GRAVITY: f32 = 400.0;
const DT: f32 = 1.0 / 60.0;

struct Player {
    slot: HandleSlot,
}

impl Entity for Player {
    fn handle_slot(&self) -> &HandleSlot {
        &self.slot
    }
}

fn main() -> reitr::Result<()> {
    env_logger::init();

    let map = MapDescription::from_json(MAP)?;
    let grid = TileGridIndex::from_description(&map, Mat4::from_scale(Vec3::new(16.0, 16.0, 1.0)))?;

    let mut scene: Scene<Player> = Scene::default();
    let player = Rc::new(Player {
        slot: HandleSlot::new(),
    });
    let handle = scene.spawn(&player)?;
    scene
        .transforms
        .set_local_transform(handle, Transform::from_xy(68.0, 0.0).matrix())?;
    scene
        .colliders
        .create(handle, CompositeCollider::from_rects([BoundingBox::new(0.0, 0.0, 12.0, 14.0)]))?;
    scene.velocities.create(handle, Velocity::ZERO)?;

    for tick in 0..90 {
        scene.velocities.get_mut(handle)?.0.y += GRAVITY * DT;
        scene.step(DT)?;

        let Some(bounds) = scene.world_collider(handle).and_then(|c| c.bounds()) else {
            break;
        };
        let hits = grid.query().intersections(&bounds);
        if hits.is_empty() {
            continue;
        }

        // Push out by the deepest overlap and stop falling.
        let depth = hits.iter().map(|hit| hit.h).fold(0.0, f32::max);
        scene.transforms.multiply_transform(
            handle,
            Mat4::from_translation(Vec3::new(0.0, -depth, 0.0)),
            Space::World,
        )?;
        scene.velocities.get_mut(handle)?.0 = Vec2::ZERO;
        log::info!("tick {tick}: landed on {} tile(s), pushed up {depth:.2}", hits.len());
    }

    let position = scene.transforms.world_transform(handle).w_axis;
    println!("player came to rest at ({:.1}, {:.1})", position.x, position.y);
    Ok(())
}
