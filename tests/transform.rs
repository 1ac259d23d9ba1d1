mod common;

use rand::seq::IndexedRandom;
use rand::Rng;
use test_log::test;

use common::{equivalent, rng, Formula};
use sdd_rs::handler::{ComputationEvent, EventLimitHandler, NopHandler};
use sdd_rs::restructure::VtreeOperation;
use sdd_rs::sdd::{Sdd, SddConfig};
use sdd_rs::vtree::{VtreeId, VtreeRoot};

const NUM_VARS: u32 = 6;

/// Directions from the root down to `v`, `true` meaning left.
fn path_of(vtree: &VtreeRoot, v: VtreeId) -> Vec<bool> {
    let mut path = Vec::new();
    let mut node = v;
    while let Some(parent) = vtree.parent(node) {
        path.push(vtree.left(parent) == node);
        node = parent;
    }
    path.reverse();
    path
}

fn locate(vtree: &VtreeRoot, path: &[bool]) -> VtreeId {
    path.iter()
        .fold(vtree.root(), |v, &left| if left { vtree.left(v) } else { vtree.right(v) })
}

fn internal_nodes(vtree: &VtreeRoot, pred: impl Fn(VtreeId) -> bool) -> Vec<VtreeId> {
    vtree.internal_post_order().into_iter().filter(|&v| pred(v)).collect()
}

// ─── Three variables ───

#[test]
fn test_three_variable_rotation() {
    let sdd = Sdd::parse_vtree("(1 (2 3))").unwrap();
    let (x, y, z) = (sdd.variable(1), sdd.variable(2), sdd.variable(3));
    let f = sdd.or(sdd.and(x, y), sdd.and(sdd.negate(y), z));
    let root = sdd.vtree().root();

    let (g, left) = sdd.rotate_left(f, root, &mut NopHandler).unwrap();
    assert_eq!(sdd.vtree().to_shape_string(), "((x1 x2) x3)");
    assert!(sdd.is_canonical(g));
    assert!(equivalent(&sdd, f, g, 3));
    assert_eq!(sdd.model_count(g), sdd.model_count(f));

    let (h, right) = sdd.rotate_right(g, sdd.vtree().root(), &mut NopHandler).unwrap();
    assert_eq!(sdd.vtree().to_shape_string(), "(x1 (x2 x3))");
    assert_eq!(h, f);
    drop(right);
    drop(left);
    assert_eq!(sdd.vtree_depth(), 1);
    assert_eq!(sdd.vtree().root(), root);
}

// ─── Random round trips ───

#[test]
fn test_random_rotations_round_trip() {
    let mut rng = rng(5);
    let sdd = Sdd::new(NUM_VARS);
    for _ in 0..30 {
        let f = Formula::random(&mut rng, NUM_VARS, 6).build(&sdd);
        let vtree = sdd.vtree();
        let candidates = internal_nodes(&vtree, |v| vtree.is_left_fragment(v));
        let Some(&v) = candidates.choose(&mut rng) else {
            continue;
        };
        let path = path_of(&vtree, v);

        let (g, forward) = sdd.rotate_right(f, v, &mut NopHandler).unwrap();
        assert!(sdd.is_canonical(g));
        assert!(equivalent(&sdd, f, g, NUM_VARS));

        let turned = sdd.vtree();
        let w = locate(&turned, &path);
        assert!(turned.is_right_fragment(w));
        let (h, back) = sdd.rotate_left(g, w, &mut NopHandler).unwrap();
        assert_eq!(sdd.vtree().root(), vtree.root());
        assert_eq!(h, f);
        assert_eq!(sdd.size_of(h), sdd.size_of(f));
        drop(back);
        drop(forward);
    }
    assert_eq!(sdd.vtree_depth(), 1);
}

#[test]
fn test_swap_is_an_involution() {
    let mut rng = rng(9);
    let sdd = Sdd::new(NUM_VARS);
    for _ in 0..30 {
        let formula = Formula::random(&mut rng, NUM_VARS, 6);
        let f = formula.build(&sdd);
        let vtree = sdd.vtree();
        let candidates = internal_nodes(&vtree, |_| true);
        let &v = candidates.choose(&mut rng).unwrap();
        let path = path_of(&vtree, v);
        let shape = vtree.to_shape_string();

        let (g, first) = sdd.swap(f, v, &mut NopHandler).unwrap();
        assert!(sdd.is_canonical(g));
        assert!(common::denotes(&sdd, g, &formula, NUM_VARS));

        let w = locate(&sdd.vtree(), &path);
        let (h, second) = sdd.swap(g, w, &mut NopHandler).unwrap();
        assert_eq!(sdd.vtree().to_shape_string(), shape);
        assert_eq!(h, f);
        drop(second);
        drop(first);
    }
    assert_eq!(sdd.vtree_depth(), 1);
}

// ─── Cartesian products without compression ───

#[test]
fn test_uncompressed_products_give_canonical_nodes() {
    let mut rng = rng(17);
    let config = SddConfig {
        cartesian_compression: false,
        ..SddConfig::default()
    };
    let plain = Sdd::with_config(NUM_VARS, config);
    let compressed = Sdd::new(NUM_VARS);
    for _ in 0..30 {
        let formula = Formula::random(&mut rng, NUM_VARS, 6);
        let vtree = plain.vtree();
        let candidates = internal_nodes(&vtree, |_| true);
        let &v = candidates.choose(&mut rng).unwrap();
        let path = path_of(&vtree, v);
        let operation = if vtree.is_left_fragment(v) && rng.random_bool(0.5) {
            VtreeOperation::RotateRight(v)
        } else {
            VtreeOperation::Swap(v)
        };

        let mut sizes = Vec::new();
        for sdd in [&plain, &compressed] {
            let f = formula.build(sdd);
            let w = locate(&sdd.vtree(), &path);
            let (g, shadow) = match operation {
                VtreeOperation::RotateRight(_) => sdd.rotate_right(f, w, &mut NopHandler),
                _ => sdd.swap(f, w, &mut NopHandler),
            }
            .unwrap();
            assert!(sdd.is_canonical(g), "{}", operation);
            // Built from scratch under the new vtree, the formula is the same node.
            assert_eq!(formula.build(sdd), g, "{}", operation);
            sizes.push(sdd.size_of(g));
            drop(shadow);
        }
        assert_eq!(sizes[0], sizes[1], "{}", operation);
        assert_eq!(plain.vtree().to_shape_string(), compressed.vtree().to_shape_string());
    }
}

// ─── Batch translation ───

#[test]
fn test_batch_agrees_with_single_node_translation() {
    let mut rng = rng(13);
    let sdd = Sdd::new(NUM_VARS);
    let roots: Vec<_> = (0..12)
        .map(|_| Formula::random(&mut rng, NUM_VARS, 6).build(&sdd))
        .collect();
    let vtree = sdd.vtree();
    let operations: Vec<VtreeOperation> = vtree
        .internal_post_order()
        .into_iter()
        .flat_map(|v| {
            let mut ops = vec![VtreeOperation::Swap(v)];
            if vtree.is_left_fragment(v) {
                ops.push(VtreeOperation::RotateRight(v));
            }
            if vtree.is_right_fragment(v) {
                ops.push(VtreeOperation::RotateLeft(v));
            }
            ops
        })
        .collect();

    for operation in operations {
        let (batch, shadow) = sdd.transform(&roots, operation, &mut NopHandler).unwrap();
        let shape = sdd.vtree().to_shape_string();
        drop(shadow);

        for &f in &roots {
            let (g, shadow) = match operation {
                VtreeOperation::RotateRight(v) => sdd.rotate_right(f, v, &mut NopHandler),
                VtreeOperation::RotateLeft(v) => sdd.rotate_left(f, v, &mut NopHandler),
                VtreeOperation::Swap(v) => sdd.swap(f, v, &mut NopHandler),
            }
            .unwrap();
            assert_eq!(sdd.vtree().to_shape_string(), shape);
            assert_eq!(batch.translate(f), g, "{}", operation);
            assert!(equivalent(&sdd, f, g, NUM_VARS));
            drop(shadow);
        }
    }
    assert_eq!(sdd.vtree_depth(), 1);
}

// ─── Cancellation ───

#[test]
fn test_canceled_transformation_keeps_the_stack() {
    let sdd = Sdd::parse_vtree("((1 2) 3)").unwrap();
    // the split prime x1∧x2 carries the sub x3, so x2∧x3 must be built
    let f = sdd.or(sdd.cube([1, 2, 3]), sdd.cube([-1, -3]));
    let root = sdd.vtree().root();
    let shape = sdd.vtree().to_shape_string();

    let mut limit = EventLimitHandler::apply_calls(0);
    let outcome = sdd.transform(&[f], VtreeOperation::RotateRight(root), &mut limit);
    let canceled = outcome.err().expect("the first apply is refused");
    assert_eq!(canceled.event, ComputationEvent::SddApply);
    assert_eq!(sdd.vtree_depth(), 1);
    assert_eq!(sdd.vtree().to_shape_string(), shape);

    let mut refuse = |e: &ComputationEvent| !matches!(e, ComputationEvent::SddTransformation);
    let outcome = sdd.rotate_right(f, root, &mut refuse);
    assert!(outcome.is_err());
    assert_eq!(sdd.vtree_depth(), 1);

    // The manager is still usable afterwards
    let (g, shadow) = sdd.rotate_right(f, root, &mut NopHandler).unwrap();
    assert!(equivalent(&sdd, f, g, 3));
    shadow.commit();
    assert_eq!(sdd.vtree_depth(), 2);
}
