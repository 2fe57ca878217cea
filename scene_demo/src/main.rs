//! Headless scene demo
//!
//! Builds a small fleet of cubes orbiting a hub, a star field of points, a
//! sun light, a sky dome and an X-ray outline, then steps a few frames and
//! reports what would be drawn and what the centre pixel picks.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use scene_engine::foundation::collections::NodeKey;
use scene_engine::prelude::*;
use scene_engine::render::{technique_names, LightKind};
use std::collections::BTreeMap;
use std::rc::Rc;

const FRAMES: u32 = 8;
const FLEET_SIZE: usize = 5;
const ORBIT_RADIUS: f32 = 3.0;
const WIDTH: f32 = 1280.0;
const HEIGHT: f32 = 720.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("=== Scene Demo ===");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene configuration from {}", path);
            SceneConfig::load_from_file(&path)?
        }
        None => SceneConfig::default(),
    };

    let host: Rc<dyn RenderHost> = Rc::new(DefaultRenderHost::with_default_effects());
    let mut graph = SceneGraph::new(config);
    graph.attach(host);

    let hub = build_scene(&mut graph)?;
    let eye = Vec3::new(0.0, 4.0, 12.0);
    let mut context = RenderContext::look_at(eye, Vec3::zeros(), WIDTH, HEIGHT);

    for frame in 0..FRAMES {
        let angle = (frame as f32) * 15.0_f32.to_radians();
        graph.set_transform(hub, Mat4::rotation_y(angle))?;

        context.begin_frame();
        let stats = graph.update(&mut context);
        let draws = graph.render(&mut context);
        graph.render_shadows(&mut context);

        log::info!(
            "Frame {}: {} renderable, {} culled, {} transforms, {} events, {} draws",
            frame,
            stats.renderable,
            stats.culled,
            stats.transforms_changed,
            stats.events,
            draws
        );
        report_passes(context.commands());
    }

    report_pick(&graph, &context);

    println!("=== Demo finished ===");
    Ok(())
}

/// Populate the graph and return the hub the fleet orbits
fn build_scene(graph: &mut SceneGraph) -> SceneResult<NodeKey> {
    let mut sun = SceneNode::new(NodeType::Light)?.named("sun");
    sun.set_light(LightParams {
        kind: LightKind::Directional,
        direction: Vec3::new(-1.0, -1.0, -1.0).normalize(),
        ..LightParams::default()
    });
    graph.insert(sun);

    let mut sky = SceneNode::new(NodeType::EnvironmentMap)?.named("sky");
    sky.set_sky_dome(true);
    graph.insert(sky);

    let mut xray = SceneNode::new(NodeType::PostEffectXRay)?.named("outline");
    xray.set_xray_settings(XRaySettings {
        double_pass: true,
        ..XRaySettings::default()
    });
    graph.insert(xray);

    let mut stars = SceneNode::new(NodeType::Point)?.named("stars");
    let positions = (0..64)
        .map(|i| {
            let t = i as f32;
            Vec3::new((t * 1.7).sin() * 20.0, (t * 0.9).cos() * 10.0, -15.0 - (t % 7.0))
        })
        .collect();
    stars.set_geometry(Some(Rc::new(Geometry3D::points(positions))));
    stars.set_color(Color4::new(1.0, 1.0, 0.8, 1.0));
    graph.insert(stars);

    let hub = graph.insert(SceneNode::new(NodeType::Group)?.named("hub"));

    let hull = Rc::new(Geometry3D::unit_cube());
    let material = Material::default();
    for i in 0..FLEET_SIZE {
        let mut ship = SceneNode::new(NodeType::Mesh)?.named(format!("ship-{}", i));
        ship.set_geometry(Some(Rc::clone(&hull)));
        ship.set_material(Some(material.clone()));
        ship.set_throw_shadow(true);
        ship.set_wrapper(Some(Rc::new(format!("ship-{}", i))));
        if i == 0 {
            ship.set_post_effects_text("xray[color:#00FF00]")?;
        }
        if i == FLEET_SIZE - 1 {
            ship.set_transparent(true);
        }

        let angle = (i as f32) * std::f32::consts::TAU / FLEET_SIZE as f32;
        let ship = graph.insert(ship);
        graph.set_transform(
            ship,
            Mat4::translation(angle.cos() * ORBIT_RADIUS, 0.0, angle.sin() * ORBIT_RADIUS),
        )?;
        graph.add_child(hub, ship)?;
    }

    let mut flagship = SceneNode::new(NodeType::Mesh)?.named("flagship");
    flagship.set_geometry(Some(hull));
    flagship.set_material(Some(material));
    flagship.set_render_wireframe(true);
    flagship.set_wrapper(Some(Rc::new(String::from("flagship"))));
    graph.insert(flagship);

    log::info!("Scene built with {} nodes", graph.len());
    Ok(hub)
}

fn report_passes(commands: &[DrawCommand]) {
    let mut passes: BTreeMap<&str, usize> = BTreeMap::new();
    for command in commands {
        *passes.entry(command.pass.as_str()).or_default() += 1;
    }
    for (pass, count) in passes {
        log::debug!("  pass {:<16} x{}", pass, count);
    }
    let meshes = commands
        .iter()
        .filter(|c| c.technique == technique_names::MESH)
        .count();
    log::debug!("  {} mesh draws", meshes);
}

fn report_pick(graph: &SceneGraph, context: &RenderContext) {
    let hits = graph.hit_test_pixel(context, WIDTH / 2.0, HEIGHT / 2.0);
    if hits.is_empty() {
        log::info!("Centre pick: nothing");
        return;
    }
    for hit in &hits {
        let label = hit
            .model_hit
            .as_ref()
            .and_then(|w| w.downcast_ref::<String>())
            .map_or("<unnamed>", String::as_str);
        log::info!("Centre pick: {} at distance {:.3}", label, hit.distance);
    }
}
