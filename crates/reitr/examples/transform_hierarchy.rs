//! Transform hierarchy: a tiny solar system without a renderer.
//!
//! The sun spins, planets orbit it because they are its children, and moons
//! orbit their planets the same way. An observer counts world-transform
//! updates; despawning a planet takes its moon with it.
//!
//! Run with: `RUST_LOG=trace cargo run -p reitr --example transform_hierarchy`

use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;

use reitr::prelude::*;

struct Body {
    slot: HandleSlot,
    name: String,
}

impl Body {
    fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            slot: HandleSlot::new(),
            name: name.into(),
        })
    }
}

impl Entity for Body {
    fn handle_slot(&self) -> &HandleSlot {
        &self.slot
    }
}

fn main() -> reitr::Result<()> {
    env_logger::init();

    let mut scene: Scene<Body> = Scene::default();
    // The scene only holds weak references; keep the bodies alive here.
    let mut bodies = Vec::new();

    let sun = Body::new("sun");
    let sun_handle = scene.spawn(&sun)?;
    bodies.push(sun);

    let mut planets = Vec::new();
    for (i, distance) in [120.0, 200.0, 300.0].into_iter().enumerate() {
        let planet = Body::new(format!("planet-{i}"));
        let moon = Body::new(format!("moon-{i}"));
        let (p, m) = (scene.spawn(&planet)?, scene.spawn(&moon)?);

        scene
            .transforms
            .set_local_transform(p, Transform::from_xy(distance, 0.0).matrix())?;
        scene.transforms.set_parent(p, sun_handle)?;
        scene
            .transforms
            .set_local_transform(m, Transform::from_xy(30.0, 0.0).with_scale(0.5).matrix())?;
        scene.transforms.set_parent(m, p)?;

        planets.push(p);
        bodies.extend([planet, moon]);
    }

    let updates = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&updates);
    scene.transforms.add_observer(move |_| counter.set(counter.get() + 1));

    // A quarter turn of the sun, in ten steps.
    let step = Transform::IDENTITY.with_rotation_z(TAU / 40.0).matrix();
    for _ in 0..10 {
        scene.transforms.multiply_transform(sun_handle, step, Space::Local)?;
    }
    println!("{} world transforms recomputed", updates.get());

    for handle in scene.entities.handles() {
        let body = scene.entities.lookup(handle)?;
        let position = scene.transforms.world_transform(handle).w_axis;
        println!("{:>9} at ({:7.1}, {:7.1})", body.name, position.x, position.y);
    }

    let despawned = scene.despawn_recursive(planets[1])?;
    log::info!("despawned {despawned} bodies with planet-1");
    println!("{} bodies left", scene.entities.len());
    Ok(())
}
