use super::{cube, Fixture};
use crate::foundation::math::{utils, Color4, Mat4, Mat4Ext, Vec3};
use crate::geometry::Geometry3D;
use crate::render::{pass_names, DrawKind, EffectAttributes, Material, RenderType};
use crate::scene::{NodeEvent, NodeType, SceneNode};
use approx::assert_relative_eq;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_child_inherits_parent_translation() {
    let mut fx = Fixture::new();
    let parent = fx.add(SceneNode::new(NodeType::Group).unwrap(), Mat4::translation(1.0, 0.0, 0.0));
    let child = fx.add_cube(Mat4::translation(0.0, 2.0, 0.0));
    fx.graph.add_child(parent, child).unwrap();
    fx.frame();

    let total = fx.node(child).total_transform();
    assert_relative_eq!(utils::transform_point(total, &Vec3::zeros()), Vec3::new(1.0, 2.0, 0.0));
    assert_relative_eq!(fx.node(child).transform_bound().center(), Vec3::new(1.0, 2.0, 0.0));

    fx.graph.set_transform(parent, Mat4::translation(-1.0, 0.0, 0.0)).unwrap();
    fx.frame();
    let total = fx.node(child).total_transform();
    assert_relative_eq!(utils::transform_point(total, &Vec3::zeros()), Vec3::new(-1.0, 2.0, 0.0));
}

#[test]
fn test_sentinel_then_unit_cube_bounds() {
    let mut fx = Fixture::new();
    let key = fx.add(SceneNode::new(NodeType::Mesh).unwrap(), Mat4::translation(3.0, 0.0, 0.0));
    fx.frame();
    assert!(fx.node(key).bound().is_zero());
    assert!(fx.node(key).bound_sphere().is_zero());
    assert!(fx.node(key).transform_bound().is_zero());

    fx.node_mut(key).set_geometry(Some(Rc::new(Geometry3D::unit_cube())));
    fx.frame();
    let node = fx.node(key);
    assert_eq!(node.bound().min, Vec3::repeat(-0.5));
    assert_eq!(node.bound().max, Vec3::repeat(0.5));
    assert_relative_eq!(node.transform_bound().min, Vec3::new(2.5, -0.5, -0.5));
    assert_relative_eq!(node.transform_bound().max, Vec3::new(3.5, 0.5, 0.5));
}

#[test]
fn test_order_keys_follow_material_and_render_order() {
    let mut fx = Fixture::new();
    let material = Material::default();
    let a = fx.add_cube(Mat4::identity());
    let b = fx.add_cube(Mat4::translation(2.0, 0.0, 0.0));
    fx.node_mut(a).set_material(Some(material.clone()));
    fx.node_mut(b).set_material(Some(material));
    fx.frame();
    assert_eq!(fx.node(a).order_key(), fx.node(b).order_key());

    let before = fx.node(b).order_key();
    fx.node_mut(a).set_render_order(5);
    fx.frame();
    assert!(fx.node(a).order_key() > fx.node(b).order_key());
    assert_eq!(fx.node(b).order_key(), before);
}

#[test]
fn test_buckets_submit_in_order() {
    let mut fx = Fixture::new();
    let opaque = fx.add_cube(Mat4::identity());
    fx.add(SceneNode::new(NodeType::EnvironmentMap).unwrap(), Mat4::identity());
    fx.add(SceneNode::new(NodeType::Light).unwrap(), Mat4::identity());
    fx.add(SceneNode::new(NodeType::DepthPrepass).unwrap(), Mat4::identity());
    fx.add(SceneNode::new(NodeType::PostEffectXRay).unwrap(), Mat4::identity());
    let transparent = fx.add_cube(Mat4::translation(0.0, 0.0, -3.0));
    fx.node_mut(transparent).set_transparent(true);
    fx.node_mut(transparent)
        .add_post_effect(EffectAttributes::new("xray").with("color", "#FF0000"));

    fx.frame();
    assert_eq!(fx.node(transparent).render_type(), RenderType::Transparent);
    fx.graph.render(&mut fx.context);

    let passes: Vec<&str> = fx.context.commands().iter().map(|c| c.pass.as_str()).collect();
    assert_eq!(
        passes,
        vec![
            pass_names::LIGHT,
            pass_names::DEPTH_PREPASS,
            pass_names::MESH_DEFAULT,
            pass_names::SKYBOX,
            pass_names::MESH_DEFAULT,
            pass_names::XRAY,
        ]
    );
    let commands = fx.context.commands();
    assert_eq!(commands[2].node, fx.node(opaque).id());
    assert_eq!(commands[4].node, fx.node(transparent).id());
    assert_eq!(commands[5].node, fx.node(transparent).id());
    assert_eq!(commands[5].kind, DrawKind::PostEffect);
    assert_eq!(commands[5].color, Some(Color4::new(1.0, 0.0, 0.0, 1.0)));
}

#[test]
fn test_opaque_sorted_by_order_key() {
    let mut fx = Fixture::new();
    let late = fx.add_cube(Mat4::identity());
    let early = fx.add_cube(Mat4::translation(1.0, 0.0, 0.0));
    fx.node_mut(late).set_render_order(2);
    fx.node_mut(early).set_render_order(1);
    fx.frame();
    assert_eq!(fx.graph.render(&mut fx.context), 2);
    let nodes: Vec<_> = fx.context.commands().iter().map(|c| c.node).collect();
    assert_eq!(nodes, vec![fx.node(early).id(), fx.node(late).id()]);
}

#[test]
fn test_transparent_sorted_back_to_front() {
    let mut fx = Fixture::new();
    let near = fx.add_cube(Mat4::identity());
    let far = fx.add_cube(Mat4::translation(0.0, 0.0, -5.0));
    for key in [near, far] {
        fx.node_mut(key).set_transparent(true);
    }
    fx.frame();
    fx.graph.render(&mut fx.context);
    let nodes: Vec<_> = fx.context.commands().iter().map(|c| c.node).collect();
    assert_eq!(nodes, vec![fx.node(far).id(), fx.node(near).id()]);
}

#[test]
fn test_wireframe_shadow_and_custom_passes() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::identity());
    fx.node_mut(key).set_render_wireframe(true);
    fx.node_mut(key).set_throw_shadow(true);
    fx.frame();

    fx.graph.render(&mut fx.context);
    fx.graph.render_shadows(&mut fx.context);
    fx.graph.render_custom(&mut fx.context, pass_names::DEPTH_PREPASS);
    let passes: Vec<&str> = fx.context.commands().iter().map(|c| c.pass.as_str()).collect();
    assert_eq!(
        passes,
        vec![
            pass_names::MESH_DEFAULT,
            pass_names::WIREFRAME,
            pass_names::SHADOW,
            pass_names::DEPTH_PREPASS,
        ]
    );
    assert!(fx.context.custom_pass().is_none());
}

#[test]
fn test_frustum_culling() {
    let mut fx = Fixture::new();
    let behind = fx.add_cube(Mat4::translation(0.0, 0.0, 50.0));
    fx.add_cube(Mat4::identity());
    let stats = fx.frame();
    assert_eq!(stats.renderable, 2);
    assert_eq!(stats.culled, 1);
    assert!(!fx.graph.renderables().contains(&behind));

    fx.node_mut(behind).set_frustum_check(false);
    let stats = fx.frame();
    assert_eq!(stats.culled, 0);
    assert!(fx.graph.renderables().contains(&behind));
}

#[test]
fn test_deferred_lighting_hides_points() {
    let mut fx = Fixture::new();
    let mut points = SceneNode::new(NodeType::Point).unwrap();
    points.set_geometry(Some(Rc::new(Geometry3D::points(vec![Vec3::zeros()]))));
    let key = fx.add(points, Mat4::identity());
    fx.frame();
    assert!(fx.node(key).is_renderable());

    fx.host.set_deferred_lighting(true);
    fx.frame();
    assert!(!fx.node(key).is_renderable());
}

#[test]
fn test_events_delivered_transform_first() {
    let mut fx = Fixture::new();
    let seen: Rc<RefCell<Vec<NodeEvent>>> = Rc::default();
    let sink = Rc::clone(&seen);
    fx.graph.subscribe(Box::new(move |e| sink.borrow_mut().push(e.event.clone())));

    let key = fx.add_cube(Mat4::translation(0.0, 1.0, 0.0));
    let per_node: Rc<RefCell<usize>> = Rc::default();
    let counter = Rc::clone(&per_node);
    fx.node_mut(key).subscribe(Box::new(move |_| *counter.borrow_mut() += 1));
    let stats = fx.frame();

    let events = seen.borrow();
    assert_eq!(stats.events, events.len());
    assert_eq!(*per_node.borrow(), events.len());
    assert!(events.windows(2).all(|w| w[0].priority() <= w[1].priority()));
    let transform = events.iter().position(|e| matches!(e, NodeEvent::TransformChanged(_)));
    let bound = events.iter().position(NodeEvent::is_transformed_bound);
    assert!(transform.unwrap() < bound.unwrap());
    assert!(matches!(events[0], NodeEvent::Attached));

    drop(events);
    seen.borrow_mut().clear();
    assert_eq!(fx.frame().events, 0);
}

#[test]
fn test_primitive_style_reaches_core() {
    let mut fx = Fixture::new();
    let mut lines = SceneNode::new(NodeType::Line).unwrap();
    lines.set_geometry(Some(Rc::new(Geometry3D::lines(
        vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
        vec![0, 1],
    ))));
    let key = fx.add(lines, Mat4::identity());
    let red = Color4::new(1.0, 0.0, 0.0, 1.0);
    fx.node_mut(key).set_color(red);
    fx.frame();
    fx.graph.render(&mut fx.context);
    let command = &fx.context.commands()[0];
    assert_eq!(command.pass, pass_names::LINES);
    assert_eq!(command.color, Some(red));
}

#[test]
fn test_cube_without_effects_host_never_renders() {
    let mut node = cube();
    assert!(!node.update());
}
