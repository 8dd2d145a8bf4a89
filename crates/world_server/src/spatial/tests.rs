use super::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn tree() -> Octree<u32> {
    Octree::new(Bounds::symmetric(100.0))
}

fn sorted(mut v: Vec<u32>) -> Vec<u32> {
    v.sort_unstable();
    v
}

#[test]
fn test_elements_at_returns_colocated_elements() {
    let mut octree = tree();
    octree.add(1, [1.0, 2.0, 3.0]).unwrap();
    octree.add(2, [1.0, 2.0, 3.0]).unwrap();
    octree.add(3, [-4.0, 2.0, 3.0]).unwrap();

    assert_eq!(sorted(octree.elements_at([1.0, 2.0, 3.0])), vec![1, 2]);
    assert_eq!(octree.elements_at([-4.0, 2.0, 3.0]), vec![3]);
    assert!(octree.elements_at([0.0, 0.0, 0.0]).is_empty());
    assert_eq!(octree.len(), 3);
}

#[test]
fn test_elements_at_matches_every_insertion() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut octree = tree();
    let mut points = Vec::new();

    for id in 0..300u32 {
        // Reuse earlier points now and then so leaves hold several elements
        let point = if id % 5 == 0 && !points.is_empty() {
            points[rng.gen_range(0..points.len())]
        } else {
            [
                rng.gen_range(-100.0..=100.0),
                rng.gen_range(-100.0..=100.0),
                rng.gen_range(-100.0..=100.0),
            ]
        };
        octree.add(id, point).unwrap();
        points.push(point);
    }

    for point in &points {
        let expected: Vec<u32> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| *p == point)
            .map(|(id, _)| id as u32)
            .collect();
        assert_eq!(sorted(octree.elements_at(*point)), expected);
    }
}

#[test]
fn test_out_of_bounds_insert_fails() {
    let mut octree = tree();
    let err = octree.add(1, [101.0, 0.0, 0.0]).unwrap_err();
    assert_eq!(err, OctreeError::OutOfBounds(101.0, 0.0, 0.0));
    assert!(octree.is_empty());

    // The boundary itself is inside
    assert!(octree.add(2, [100.0, -100.0, 100.0]).is_ok());
}

#[test]
fn test_remove_via_handle() {
    let mut octree = tree();
    let handle = octree.add(1, [5.0, 5.0, 5.0]).unwrap();
    octree.add(2, [5.0, 5.0, 5.0]).unwrap();

    assert!(octree.remove(&1, Some(handle)));
    assert_eq!(octree.elements_at([5.0, 5.0, 5.0]), vec![2]);
    assert!(!octree.remove(&1, Some(handle)));
    assert_eq!(octree.len(), 1);
}

#[test]
fn test_remove_with_stale_handle_after_subdivision() {
    let mut octree = tree();
    octree.add(9, [-50.0, -50.0, -50.0]).unwrap();
    let handle = octree.add(1, [10.0, 10.0, 10.0]).unwrap();
    assert_ne!(handle, octree.add(8, [-50.0, -50.0, -50.0]).unwrap());

    // Forces the leaf behind `handle` to split, pushing element 1 into a descendant
    octree.add(2, [10.5, 10.0, 10.0]).unwrap();
    octree.add(3, [11.0, 10.0, 10.0]).unwrap();

    assert!(octree.remove(&1, Some(handle)));
    assert!(octree.elements_at([10.0, 10.0, 10.0]).is_empty());
    assert_eq!(
        sorted(octree.elements_in(&Bounds::symmetric(100.0))),
        vec![2, 3, 8, 9]
    );
}

#[test]
fn test_remove_without_handle_searches_from_root() {
    let mut octree = tree();
    octree.add(1, [-50.0, 0.0, 0.0]).unwrap();
    octree.add(2, [50.0, 0.0, 0.0]).unwrap();

    assert!(octree.remove(&2, None));
    assert!(!octree.remove(&2, None));
    assert_eq!(octree.elements_in(&Bounds::symmetric(100.0)), vec![1]);
}

#[test]
fn test_elements_in_is_insertion_order_independent() {
    let points: Vec<[f64; 3]> = (0..40)
        .map(|i| {
            let f = i as f64;
            [f * 2.0 - 40.0, (f * 7.0) % 30.0 - 15.0, 20.0 - f]
        })
        .collect();

    let mut ascending = tree();
    for (id, p) in points.iter().enumerate() {
        ascending.add(id as u32, *p).unwrap();
    }
    let mut descending = tree();
    for (id, p) in points.iter().enumerate().rev() {
        descending.add(id as u32, *p).unwrap();
    }

    for query in [
        Bounds::new([-10.0, -10.0, -10.0], [10.0, 10.0, 10.0]),
        Bounds::new([-40.0, -15.0, -20.0], [0.0, 15.0, 20.0]),
        Bounds::symmetric(100.0),
        Bounds::new([30.0, 30.0, 30.0], [40.0, 40.0, 40.0]),
    ] {
        assert_eq!(
            sorted(ascending.elements_in(&query)),
            sorted(descending.elements_in(&query))
        );
    }
}

#[test]
fn test_elements_in_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut octree = tree();
    let mut points = Vec::new();
    for id in 0..500u32 {
        let p = [
            rng.gen_range(-100.0..=100.0),
            rng.gen_range(-100.0..=100.0),
            rng.gen_range(-100.0..=100.0),
        ];
        octree.add(id, p).unwrap();
        points.push(p);
    }

    for _ in 0..25 {
        let center = meridian_event_system::Vector3::new(
            rng.gen_range(-100.0..=100.0),
            rng.gen_range(-100.0..=100.0),
            rng.gen_range(-100.0..=100.0),
        );
        let query = Bounds::around(center, rng.gen_range(1.0..60.0));
        let expected: Vec<u32> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| query.contains_point(p))
            .map(|(id, _)| id as u32)
            .collect();
        assert_eq!(sorted(octree.elements_in(&query)), expected);
    }
}

#[test]
fn test_node_count_only_grows_until_clear() {
    let mut octree = tree();
    let a = octree.add(1, [1.0, 1.0, 1.0]).unwrap();
    octree.add(2, [-1.0, -1.0, -1.0]).unwrap();
    let nodes = octree.stats().nodes;
    assert_eq!(nodes, 9);

    octree.remove(&1, Some(a));
    assert_eq!(octree.stats().nodes, nodes);
    assert_eq!(octree.stats().elements, 1);

    octree.clear();
    let stats = octree.stats();
    assert_eq!(stats.nodes, 1);
    assert_eq!(stats.elements, 0);
    assert_eq!(octree.bounds(), Bounds::symmetric(100.0));
}

#[test]
fn test_nearly_identical_points_stop_at_depth_limit() {
    let mut octree = tree();
    octree.add(1, [1.0, 1.0, 1.0]).unwrap();
    octree.add(2, [1.0 + f64::EPSILON, 1.0, 1.0]).unwrap();

    assert_eq!(octree.elements_at([1.0, 1.0, 1.0]), vec![1]);
    assert_eq!(octree.elements_at([1.0 + f64::EPSILON, 1.0, 1.0]), vec![2]);
    assert!(octree.stats().max_depth <= MAX_DEPTH);
}
