use super::{cube, Fixture};
use crate::error::SceneError;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::geometry::Geometry3D;
use crate::render::core::PrimitiveCore;
use crate::render::{CoreFactory, Material, RenderHost};
use crate::scene::{NodeEvent, NodeType, SceneNode};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_attach_detach_attach_restores_renderable() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::identity());
    fx.frame();
    assert!(fx.node(key).is_renderable());

    fx.graph.detach();
    fx.frame();
    assert!(!fx.node(key).is_attached());
    assert!(!fx.node(key).is_renderable());

    let host: Rc<dyn RenderHost> = fx.host.clone();
    fx.graph.attach(host);
    fx.frame();
    assert!(fx.node(key).is_renderable());
    assert_eq!(fx.graph.renderables(), &[key]);
}

#[test]
fn test_attach_twice_is_observably_once() {
    let fx = Fixture::new();
    let host: Rc<dyn RenderHost> = fx.host.clone();
    let mut node = cube();
    assert!(node.attach(&host));
    let buffers = fx.live_buffers();
    assert!(node.attach(&host));
    assert_eq!(fx.live_buffers(), buffers);

    let attached = node
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, NodeEvent::Attached))
        .count();
    assert_eq!(attached, 1);
}

#[test]
fn test_detach_never_attached_is_noop() {
    let mut node = cube();
    node.take_events();
    node.detach();
    assert!(!node.is_attached());
    assert!(node.take_events().is_empty());
}

#[test]
fn test_detach_releases_gpu_handles() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::identity());
    fx.node_mut(key).set_material(Some(Material::default()));
    assert_eq!(fx.live_buffers(), 1);
    assert_eq!(fx.live_material_variables(), 1);
    assert_ne!(fx.node(key).kind().order_secondary(), 0);

    fx.graph.detach();
    assert_eq!(fx.live_buffers(), 0);
    assert_eq!(fx.live_material_variables(), 0);
    assert_eq!(fx.node(key).kind().order_secondary(), 0);
}

#[test]
fn test_shared_geometry_shares_one_buffer() {
    let mut fx = Fixture::new();
    let geometry = Rc::new(Geometry3D::unit_cube());
    let a = fx.add(SceneNode::new(NodeType::Mesh).unwrap(), Mat4::identity());
    let b = fx.add(SceneNode::new(NodeType::Mesh).unwrap(), Mat4::identity());
    fx.node_mut(a).set_geometry(Some(Rc::clone(&geometry)));
    fx.node_mut(b).set_geometry(Some(geometry));
    assert_eq!(fx.live_buffers(), 1);

    fx.graph.remove(a);
    assert_eq!(fx.live_buffers(), 1);
    fx.graph.remove(b);
    assert_eq!(fx.live_buffers(), 0);
}

#[test]
fn test_missing_capability_rejected_at_construction() {
    let points =
        CoreFactory::new(PrimitiveCore::CAPABILITIES, |id| Box::new(PrimitiveCore::points(id)));
    let err = SceneNode::with_core(NodeType::Mesh, points).unwrap_err();
    assert!(matches!(err, SceneError::MissingCapability { .. }));

    let err = SceneNode::with_core(NodeType::Point, NodeType::Mesh.default_factory()).unwrap_err();
    assert!(matches!(
        err,
        SceneError::MissingCapability { capability: "primitive style", .. }
    ));
}

#[test]
fn test_invalid_geometry_neither_renders_nor_binds() {
    let mut fx = Fixture::new();
    let lines = Geometry3D::lines(vec![Vec3::zeros(), Vec3::x()], vec![0, 1]);
    let key = fx.add(SceneNode::new(NodeType::Mesh).unwrap(), Mat4::identity());
    fx.node_mut(key).set_geometry(Some(Rc::new(lines)));
    fx.frame();

    let node = fx.node(key);
    assert!(!node.has_valid_geometry());
    assert!(node.bound().is_zero());
    assert!(node.transform_bound().is_zero());
    assert!(!node.is_renderable());
    assert_eq!(fx.live_buffers(), 0);
}

#[test]
fn test_replacing_geometry_rebinds() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::identity());
    fx.node_mut(key).set_geometry(Some(Rc::new(Geometry3D::unit_cube())));
    assert_eq!(fx.live_buffers(), 1);
    fx.node_mut(key).set_geometry(None);
    assert_eq!(fx.live_buffers(), 0);
    fx.frame();
    assert!(!fx.node(key).is_renderable());
}

#[test]
fn test_node_inserted_after_attach_is_attached() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::translation(0.0, 1.0, 0.0));
    assert!(fx.node(key).is_attached());
    assert!(fx.node(key).core().is_some());
}

#[test]
fn test_remove_promotes_items_to_roots() {
    let mut fx = Fixture::new();
    let group = fx.add(SceneNode::new(NodeType::Group).unwrap(), Mat4::identity());
    let child = fx.add_cube(Mat4::identity());
    fx.graph.add_child(group, child).unwrap();
    assert_eq!(fx.graph.roots(), &[group]);

    let removed = fx.graph.remove(group).unwrap();
    assert!(!removed.is_attached());
    assert_eq!(fx.graph.roots(), &[child]);
    assert_eq!(fx.graph.parent(child), None);
}

#[test]
fn test_reparenting_is_rejected() {
    let mut fx = Fixture::new();
    let a = fx.add(SceneNode::new(NodeType::Group).unwrap(), Mat4::identity());
    let b = fx.add(SceneNode::new(NodeType::Group).unwrap(), Mat4::identity());
    let child = fx.add_cube(Mat4::identity());
    fx.graph.add_child(a, child).unwrap();
    fx.graph.add_child(a, child).unwrap();
    assert!(matches!(
        fx.graph.add_child(b, child),
        Err(SceneError::TransformAlreadyParented)
    ));
    assert!(fx.graph.remove_child(a, child));
    fx.graph.add_child(b, child).unwrap();
    assert_eq!(fx.graph.parent(child), Some(b));
}

#[test]
fn test_cycle_keeps_graph_reachable() {
    let mut fx = Fixture::new();
    let a = fx.add(SceneNode::new(NodeType::Group).unwrap(), Mat4::identity());
    let b = fx.add_cube(Mat4::identity());
    fx.graph.add_child(a, b).unwrap();
    assert!(matches!(fx.graph.add_child(b, a), Err(SceneError::CyclicParent)));
    assert_eq!(fx.graph.roots(), &[a]);
    assert_eq!(fx.graph.parent(a), None);

    fx.graph.set_transform(a, Mat4::translation(5.0, 0.0, 0.0)).unwrap();
    fx.frame();
    let origin = utils::transform_point(fx.node(b).total_transform(), &Vec3::zeros());
    assert_eq!(origin, Vec3::new(5.0, 0.0, 0.0));
}

#[test]
fn test_removed_node_reports_detached() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::identity());
    fx.frame();

    let seen: Rc<RefCell<Vec<NodeEvent>>> = Rc::default();
    let sink = Rc::clone(&seen);
    fx.graph.subscribe(Box::new(move |e| sink.borrow_mut().push(e.event.clone())));
    let own: Rc<RefCell<Vec<NodeEvent>>> = Rc::default();
    let own_sink = Rc::clone(&own);
    fx.node_mut(key).subscribe(Box::new(move |e| own_sink.borrow_mut().push(e.clone())));

    let removed = fx.graph.remove(key).unwrap();
    assert!(!removed.has_pending_events());
    assert_eq!(*seen.borrow(), vec![NodeEvent::Detached]);
    assert_eq!(*own.borrow(), vec![NodeEvent::Detached]);

    fx.frame();
    fx.frame();
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_clear_reports_detached_for_every_node() {
    let mut fx = Fixture::new();
    let a = fx.add_cube(Mat4::identity());
    let b = fx.add_cube(Mat4::translation(2.0, 0.0, 0.0));
    fx.frame();

    let seen: Rc<RefCell<Vec<_>>> = Rc::default();
    let sink = Rc::clone(&seen);
    fx.graph.subscribe(Box::new(move |e| sink.borrow_mut().push((e.id, e.event.clone()))));
    let ids = [fx.node(a).id(), fx.node(b).id()];

    fx.graph.clear();
    assert!(fx.graph.is_empty());
    let detached: Vec<_> = seen
        .borrow()
        .iter()
        .filter(|(_, e)| matches!(e, NodeEvent::Detached))
        .map(|(id, _)| *id)
        .collect();
    assert_eq!(detached.len(), 2);
    assert!(ids.iter().all(|id| detached.contains(id)));
}
