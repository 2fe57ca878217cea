use super::{cube, Fixture};
use crate::config::SceneConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::geometry::{BatchedMeshGeometryConfig, Geometry3D};
use crate::render::Material;
use crate::scene::{NodeType, SceneNode};
use approx::assert_relative_eq;
use std::rc::Rc;

const CENTER: (f32, f32) = (400.0, 300.0);

#[test]
fn test_point_nearest_wins() {
    let mut fx = Fixture::new();
    let mut points = SceneNode::new(NodeType::Point).unwrap();
    points.set_geometry(Some(Rc::new(Geometry3D::points(vec![
        Vec3::new(0.0, 0.0, -4.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -2.0),
    ]))));
    let key = fx.add(points, Mat4::identity());
    fx.frame();

    let hits = fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tag, Some(1));
    assert_eq!(hits[0].node, Some(fx.node(key).id()));
    assert_relative_eq!(hits[0].distance, 10.0, epsilon = 1e-3);
}

#[test]
fn test_point_outside_thickness_misses() {
    let mut fx = Fixture::new();
    let mut points = SceneNode::new(NodeType::Point).unwrap();
    points.set_geometry(Some(Rc::new(Geometry3D::points(vec![Vec3::new(2.0, 0.0, 0.0)]))));
    let key = fx.add(points, Mat4::identity());
    fx.frame();
    assert!(fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1).is_empty());

    // A huge tolerance reaches the off-centre point
    fx.node_mut(key).set_hit_test_thickness(Some(500.0));
    assert_eq!(fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1).len(), 1);
}

#[test]
fn test_hidden_or_untestable_nodes_never_hit() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::identity());
    fx.frame();
    assert_eq!(fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1).len(), 1);

    fx.node_mut(key).set_visible(false);
    fx.frame();
    assert!(fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1).is_empty());

    fx.node_mut(key).set_visible(true);
    fx.node_mut(key).set_hit_test_visible(false);
    fx.frame();
    assert!(fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1).is_empty());
}

#[test]
fn test_hits_sorted_nearest_first() {
    let mut fx = Fixture::new();
    let far = fx.add_cube(Mat4::translation(0.0, 0.0, -5.0));
    let near = fx.add_cube(Mat4::identity());
    fx.frame();

    let hits = fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].node, Some(fx.node(near).id()));
    assert_eq!(hits[1].node, Some(fx.node(far).id()));
    assert_relative_eq!(hits[0].distance, 9.5, epsilon = 1e-3);
    assert_relative_eq!(hits[0].point, Vec3::new(0.0, 0.0, 0.5), epsilon = 1e-3);
}

#[test]
fn test_instanced_mesh_hits_nearest_instance() {
    let mut fx = Fixture::new();
    let key = fx.add_cube(Mat4::identity());
    fx.node_mut(key).set_instances(vec![
        Mat4::translation(0.0, 0.0, -4.0),
        Mat4::translation(0.0, 0.0, 2.0),
    ]);
    fx.frame();

    let hits = fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1);
    assert_eq!(hits.len(), 1);
    assert_relative_eq!(hits[0].point, Vec3::new(0.0, 0.0, 2.5), epsilon = 1e-3);
}

#[test]
fn test_line_hit_reports_segment() {
    let mut fx = Fixture::new();
    let mut lines = SceneNode::new(NodeType::Line).unwrap();
    lines.set_geometry(Some(Rc::new(Geometry3D::lines(
        vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
        vec![0, 1],
    ))));
    fx.add(lines, Mat4::identity());
    fx.frame();

    let hits = fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tag, Some(0));
    assert_relative_eq!(hits[0].point, Vec3::zeros(), epsilon = 1e-3);
}

#[test]
fn test_batched_mesh_needs_material_and_reports_sub_geometry() {
    let mut fx = Fixture::new();
    let geometry = Rc::new(Geometry3D::unit_cube());
    let mut batch = SceneNode::new(NodeType::BatchedMesh).unwrap();
    batch.set_batched_geometries(vec![
        BatchedMeshGeometryConfig::new(Rc::clone(&geometry), Mat4::translation(-3.0, 0.0, 0.0)),
        BatchedMeshGeometryConfig::new(geometry, Mat4::translation(0.0, 0.0, 0.0)),
    ]);
    let key = fx.add(batch, Mat4::identity());
    fx.frame();
    assert!(fx.node(key).is_renderable());
    assert!(fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1).is_empty());

    fx.node_mut(key).set_material(Some(Material::default()));
    fx.frame();
    let hits = fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sub_geometry, Some(1));
}

#[test]
fn test_scene_index_keeps_results() {
    let mut config = SceneConfig::default();
    config.spatial.scene_index = true;
    let mut fx = Fixture::with_config(config);
    let left = fx.add_cube(Mat4::translation(-3.0, 0.0, 0.0));
    let middle = fx.add_cube(Mat4::identity());
    fx.add_cube(Mat4::translation(3.0, 0.0, 0.0));
    let mut points = SceneNode::new(NodeType::Point).unwrap();
    points.set_geometry(Some(Rc::new(Geometry3D::points(vec![Vec3::new(0.0, 0.0, 2.0)]))));
    let point = fx.add(points, Mat4::identity());
    fx.frame();

    let hits = fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1);
    let nodes: Vec<_> = hits.iter().filter_map(|h| h.node).collect();
    assert_eq!(nodes, vec![fx.node(point).id(), fx.node(middle).id()]);
    assert!(!nodes.contains(&fx.node(left).id()));
}

#[test]
fn test_wrapper_reported_in_hit() {
    let mut fx = Fixture::new();
    let mut node = cube();
    node.set_wrapper(Some(Rc::new(String::from("front-end cube"))));
    fx.add(node, Mat4::identity());
    fx.frame();

    let hits = fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1);
    let wrapper = hits[0].model_hit.as_ref().unwrap();
    assert_eq!(wrapper.downcast_ref::<String>().unwrap(), "front-end cube");
}

#[test]
fn test_groups_and_lights_are_never_hit() {
    let mut fx = Fixture::new();
    fx.add(SceneNode::new(NodeType::Group).unwrap(), Mat4::identity());
    fx.add(SceneNode::new(NodeType::Light).unwrap(), Mat4::identity());
    fx.frame();
    assert!(fx.graph.hit_test_pixel(&fx.context, CENTER.0, CENTER.1).is_empty());
}
