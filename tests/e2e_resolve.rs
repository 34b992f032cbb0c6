//! End-to-end tests for transform resolution.
//!
//! Each test builds a scene in a MemoryGraph, resolves transforms through a
//! subscribed TransformResolver and checks them against direct chain
//! multiplication of the edge matrices.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{DMat4, DVec3};
use proptest::prelude::*;
use rt_graph::math::rt_matrix;
use rt_graph::{Error, MemoryGraph, NodeId, TransformResolver};

const EPS: f64 = 1e-9;

// ============================================================================
// Helper: the reference scene
//
//   root ─┬─(M1)─ A ─(M2)─ B
//         └─(M3)─ C
// ============================================================================

struct Scene {
    graph: Arc<MemoryGraph>,
    b: NodeId,
    c: NodeId,
}

const M1: (DVec3, DVec3) = (DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 0.0, FRAC_PI_2));
const M2: (DVec3, DVec3) = (DVec3::new(0.0, 2.0, 0.5), DVec3::new(0.3, 0.0, 0.0));
const M3: (DVec3, DVec3) = (DVec3::new(-1.0, 0.0, 3.0), DVec3::new(0.0, -0.4, 0.2));

fn mat((t, r): (DVec3, DVec3)) -> DMat4 {
    rt_matrix(t, r)
}

fn scene_with(m1: (DVec3, DVec3), m2: (DVec3, DVec3), m3: (DVec3, DVec3)) -> Scene {
    let graph = Arc::new(MemoryGraph::new());
    let root = graph.insert_root("root", "world").unwrap();
    let a = graph.insert_node("A", "transform").unwrap();
    let b = graph.insert_node("B", "transform").unwrap();
    let c = graph.insert_node("C", "transform").unwrap();
    graph.insert_or_assign_rt_edge(root, a, m1.0, m1.1).unwrap();
    graph.insert_or_assign_rt_edge(a, b, m2.0, m2.1).unwrap();
    graph.insert_or_assign_rt_edge(root, c, m3.0, m3.1).unwrap();
    Scene { graph, b, c }
}

fn scene() -> Scene {
    scene_with(M1, M2, M3)
}

// ============================================================================
// 1. Cross-branch resolution
// ============================================================================

#[test]
fn test_resolve_c_from_b() {
    let s = scene();
    let resolver = TransformResolver::new(s.graph.clone());

    let got = resolver.resolve("C", "B").unwrap();
    let expected = mat(M3).inverse() * mat(M1) * mat(M2);
    assert!(got.abs_diff_eq(expected, EPS), "got {got:?}\nexpected {expected:?}");
}

// ============================================================================
// 2. Ancestor / descendant pairs
// ============================================================================

#[test]
fn test_resolve_down_and_up_a_single_branch() {
    let s = scene();
    let resolver = TransformResolver::new(s.graph.clone());

    let root_from_b = resolver.resolve("root", "B").unwrap();
    assert!(root_from_b.abs_diff_eq(mat(M1) * mat(M2), EPS));

    let b_from_root = resolver.resolve("B", "root").unwrap();
    assert!(b_from_root.abs_diff_eq((mat(M1) * mat(M2)).inverse(), EPS));

    let a_from_b = resolver.resolve("A", "B").unwrap();
    assert!(a_from_b.abs_diff_eq(mat(M2), EPS));
}

// ============================================================================
// 3. Identity
// ============================================================================

#[test]
fn test_identity_for_every_frame() {
    let s = scene();
    let resolver = TransformResolver::new(s.graph.clone());
    for frame in ["root", "A", "B", "C"] {
        assert_eq!(resolver.resolve(frame, frame).unwrap(), DMat4::IDENTITY, "frame {frame}");
    }
}

// ============================================================================
// 4. Errors
// ============================================================================

#[test]
fn test_unknown_frame_is_not_found() {
    let s = scene();
    let resolver = TransformResolver::new(s.graph.clone());

    assert!(matches!(resolver.resolve("ghost", "root"), Err(Error::NotFound(_))));
    assert!(matches!(resolver.resolve("root", "ghost"), Err(Error::NotFound(_))));
}

#[test]
fn test_detached_frame_is_not_found() {
    let s = scene();
    s.graph.insert_node("loose", "mesh").unwrap();
    let resolver = TransformResolver::new(s.graph.clone());

    assert!(matches!(resolver.resolve("loose", "B"), Err(Error::NotFound(_))));
}

#[test]
fn test_frames_of_two_trees_have_no_common_ancestor() {
    let s = scene();
    let other = s.graph.insert_root("other", "world").unwrap();
    let d = s.graph.insert_node("D", "transform").unwrap();
    s.graph.insert_or_assign_rt_edge(other, d, DVec3::ONE, DVec3::ZERO).unwrap();
    let resolver = TransformResolver::new(s.graph.clone());

    let err = resolver.resolve("D", "B").unwrap_err();
    assert!(matches!(err, Error::NoCommonAncestor { ref dest, ref orig } if dest == "D" && orig == "B"));
}

// ============================================================================
// 5. Path independence after reparenting
// ============================================================================

#[test]
fn test_reparented_frame_follows_new_path() {
    let s = scene();
    let resolver = TransformResolver::new(s.graph.clone());
    resolver.resolve("root", "B").unwrap();

    let m4 = (DVec3::new(0.0, 0.0, -2.0), DVec3::new(0.1, 0.1, 0.1));
    s.graph.insert_or_assign_rt_edge(s.c, s.b, m4.0, m4.1).unwrap();

    let got = resolver.resolve("root", "B").unwrap();
    assert!(got.abs_diff_eq(mat(M3) * mat(m4), EPS));

    let a_from_b = resolver.resolve("A", "B").unwrap();
    assert!(a_from_b.abs_diff_eq(mat(M1).inverse() * mat(M3) * mat(m4), EPS));
}

// ============================================================================
// 6. Deep chains with uneven depths
// ============================================================================

#[test]
fn test_deep_chain_against_direct_product() {
    let graph = Arc::new(MemoryGraph::new());
    let root = graph.insert_root("world", "world").unwrap();

    let mut parent = root;
    let mut product = DMat4::IDENTITY;
    for i in 0..6 {
        let id = graph.insert_node(&format!("link{i}"), "transform").unwrap();
        let t = DVec3::new(0.1 * i as f64, 0.5, -0.2);
        let r = DVec3::new(0.05 * i as f64, -0.1, 0.2);
        graph.insert_or_assign_rt_edge(parent, id, t, r).unwrap();
        product = product * rt_matrix(t, r);
        parent = id;
    }
    let sensor = graph.insert_node("lidar", "laser").unwrap();
    let mount = (DVec3::new(0.0, 0.3, 1.2), DVec3::new(0.0, 0.0, -0.7));
    graph.insert_or_assign_rt_edge(root, sensor, mount.0, mount.1).unwrap();

    let resolver = TransformResolver::new(graph.clone());
    let got = resolver.resolve("lidar", "link5").unwrap();
    let expected = mat(mount).inverse() * product;
    assert!(got.abs_diff_eq(expected, 1e-8));
}

#[test]
fn test_equal_depth_branches_meet_at_root() {
    // root ─┬─ a1 ── a2 ── a3
    //       └─ c1 ── c2 ── c3
    let graph = Arc::new(MemoryGraph::new());
    let root = graph.insert_root("root", "world").unwrap();

    let branch = |prefix: &str, edges: [(DVec3, DVec3); 3]| {
        let mut parent = root;
        let mut product = DMat4::IDENTITY;
        for (i, (t, r)) in edges.into_iter().enumerate() {
            let id = graph.insert_node(&format!("{prefix}{}", i + 1), "transform").unwrap();
            graph.insert_or_assign_rt_edge(parent, id, t, r).unwrap();
            product = product * rt_matrix(t, r);
            parent = id;
        }
        product
    };
    let prod_a = branch("a", [
        (DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 0.4)),
        (DVec3::new(0.0, 2.0, 0.0), DVec3::new(0.1, 0.0, 0.0)),
        (DVec3::new(0.5, 0.5, 0.5), DVec3::new(0.0, -0.3, 0.2)),
    ]);
    let prod_c = branch("c", [
        (DVec3::new(-1.0, 0.0, 1.0), DVec3::new(0.0, 0.6, 0.0)),
        (DVec3::new(0.0, 0.0, 3.0), DVec3::new(0.0, 0.0, -1.1)),
        (DVec3::new(2.0, -0.5, 0.0), DVec3::new(0.7, 0.0, 0.3)),
    ]);

    let resolver = TransformResolver::new(graph.clone());
    let got = resolver.resolve("c3", "a3").unwrap();
    assert!(got.abs_diff_eq(prod_c.inverse() * prod_a, 1e-8));

    let back = resolver.resolve("a3", "c3").unwrap();
    assert!(back.abs_diff_eq(prod_a.inverse() * prod_c, 1e-8));
}

// ============================================================================
// 7. Cached and fresh answers agree
// ============================================================================

#[test]
fn test_cached_equals_uncached() {
    let s = scene();
    let resolver = TransformResolver::new(s.graph.clone());

    for (dest, orig) in [("C", "B"), ("B", "C"), ("A", "C"), ("root", "B")] {
        let cached = resolver.resolve(dest, orig).unwrap();
        let cached_again = resolver.resolve(dest, orig).unwrap();
        let fresh = resolver.resolve_uncached(dest, orig).unwrap();
        assert_eq!(cached, cached_again);
        assert!(cached.abs_diff_eq(fresh, EPS));
    }
    assert_eq!(resolver.stats().hits, 4);
}

// ============================================================================
// 8. Inverse consistency
// ============================================================================

fn edge() -> impl Strategy<Value = (DVec3, DVec3)> {
    (
        (-10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0),
        (-3.0f64..3.0, -1.5f64..1.5, -3.0f64..3.0),
    )
        .prop_map(|((x, y, z), (rx, ry, rz))| (DVec3::new(x, y, z), DVec3::new(rx, ry, rz)))
}

proptest! {
    #[test]
    fn prop_opposite_directions_are_inverses(m1 in edge(), m2 in edge(), m3 in edge()) {
        let s = scene_with(m1, m2, m3);
        let resolver = TransformResolver::new(s.graph.clone());

        let c_from_b = resolver.resolve("C", "B").unwrap();
        let b_from_c = resolver.resolve_uncached("B", "C").unwrap();
        prop_assert!((b_from_c * c_from_b).abs_diff_eq(DMat4::IDENTITY, 1e-8));
        prop_assert!(b_from_c.abs_diff_eq(c_from_b.inverse(), 1e-8));
    }
}
