mod common;

use std::time::Duration;

use test_log::test;

use common::{equivalent, rng, Formula};
use sdd_rs::handler::{
    Computation, ComputationEvent, ComputationHandler, EventLimitHandler, NopHandler, TimeoutHandler, UnboundedSearch,
};
use sdd_rs::minimize::MinimizationConfig;
use sdd_rs::reference::Ref;
use sdd_rs::sdd::Sdd;
use sdd_rs::strategy::{BottomUpStrategy, DecreasingThresholdStrategy, SddMinimizationStrategy, WindowStrategy};

const NUM_VARS: u32 = 7;

fn strategies() -> Vec<(&'static str, Box<dyn SddMinimizationStrategy>)> {
    vec![
        ("bottom-up", Box::new(BottomUpStrategy)),
        ("decreasing-threshold", Box::new(DecreasingThresholdStrategy::default())),
        ("window", Box::new(WindowStrategy::default())),
    ]
}

fn random_roots(sdd: &Sdd, seed: u64, count: usize) -> Vec<Ref> {
    let mut rng = rng(seed);
    (0..count)
        .map(|_| Formula::random(&mut rng, NUM_VARS, 6).build(sdd))
        .collect()
}

// ─── Monotonicity ───

#[test]
fn test_every_strategy_preserves_functions_and_never_grows() {
    for (name, mut strategy) in strategies() {
        let sdd = Sdd::parse_vtree("(1 (2 (3 (4 (5 (6 7))))))").unwrap();
        let roots = random_roots(&sdd, 17, 4);
        let initial = sdd.size(&roots);

        let outcome = sdd.minimize_with(
            &roots,
            strategy.as_mut(),
            &MinimizationConfig::default(),
            &UnboundedSearch,
            &mut NopHandler,
        );
        assert!(outcome.is_done(), "{}", name);
        let (result, stats) = outcome.result().unwrap();

        let minimized = result.translate_all(&roots);
        assert_eq!(stats.initial_size, initial, "{}", name);
        assert_eq!(stats.final_size, sdd.size(&minimized), "{}", name);
        assert!(stats.final_size <= initial, "{}: {} > {}", name, stats.final_size, initial);
        assert_eq!(result.vtree().to_shape_string(), sdd.vtree().to_shape_string(), "{}", name);
        for (&f, &g) in roots.iter().zip(&minimized) {
            assert!(sdd.is_canonical(g), "{}", name);
            assert!(equivalent(&sdd, f, g, NUM_VARS), "{}", name);
        }
    }
}

#[test]
fn test_interleaved_pairs_shrink() {
    // x1 ↔ x5, x2 ↔ x6, ... is exponential in the right-linear order 1..8
    let sdd = Sdd::parse_vtree("(1 (2 (3 (4 (5 (6 (7 8)))))))").unwrap();
    let f = sdd.and_all((1..=4).map(|i| sdd.equiv(sdd.variable(i), sdd.variable(i + 4))));
    let before = sdd.size_of(f);
    let models = sdd.model_count(f);

    let result = sdd.minimize(&[f], &UnboundedSearch, &mut NopHandler).result().unwrap();
    let g = result.translate(f);
    assert!(sdd.size_of(g) < before, "{} ≥ {}", sdd.size_of(g), before);
    assert_eq!(sdd.model_count(g), models);
}

#[test]
fn test_pass_limit() {
    let sdd = Sdd::parse_vtree("(1 (2 (3 (4 (5 (6 7))))))").unwrap();
    let roots = random_roots(&sdd, 29, 3);
    let config = MinimizationConfig { max_passes: 1 };
    let (_, stats) = sdd
        .minimize_with(&roots, &mut BottomUpStrategy, &config, &UnboundedSearch, &mut NopHandler)
        .result()
        .unwrap();
    assert_eq!(stats.passes, 1);
}

// ─── Cancellation ───

#[test]
fn test_expired_timeout_cancels_at_start() {
    let sdd = Sdd::parse_vtree("(1 (2 (3 (4 (5 (6 7))))))").unwrap();
    let roots = random_roots(&sdd, 31, 2);
    let mut handler = TimeoutHandler::new(Duration::ZERO);
    let outcome = sdd.minimize(&roots, &UnboundedSearch, &mut handler);
    assert!(matches!(outcome, Computation::Canceled(ComputationEvent::ComputationStarted)));
    assert_eq!(sdd.vtree_depth(), 1);
}

#[test]
fn test_step_limit_returns_consistent_partial_result() {
    let sdd = Sdd::parse_vtree("(1 (2 (3 (4 (5 (6 7))))))").unwrap();
    let roots = random_roots(&sdd, 37, 3);
    let initial = sdd.size(&roots);
    let mut handler = EventLimitHandler::minimization_steps(20);

    let outcome = sdd.minimize(&roots, &UnboundedSearch, &mut handler);
    let event = match &outcome {
        Computation::Partial(_, event) => *event,
        _ => panic!("twenty steps do not finish a pass"),
    };
    assert!(matches!(event, ComputationEvent::MinimizationStep { .. }));
    let result = outcome.result().unwrap();
    assert_eq!(result.vtree().to_shape_string(), sdd.vtree().to_shape_string());
    let minimized = result.translate_all(&roots);
    assert!(sdd.size(&minimized) <= initial);
    for (&f, &g) in roots.iter().zip(&minimized) {
        assert!(equivalent(&sdd, f, g, NUM_VARS));
    }
}

#[test]
fn test_local_search_budget_keeps_minimizing() {
    let sdd = Sdd::parse_vtree("(1 (2 (3 (4 (5 (6 7))))))").unwrap();
    let roots = random_roots(&sdd, 41, 3);
    let search = || Box::new(EventLimitHandler::minimization_steps(2)) as Box<dyn ComputationHandler>;

    let outcome = sdd.minimize_with(
        &roots,
        &mut BottomUpStrategy,
        &MinimizationConfig::default(),
        &search,
        &mut NopHandler,
    );
    assert!(outcome.is_done());
    let (result, stats) = outcome.result().unwrap();
    assert!(stats.fragments_searched > 1);
    assert!(stats.final_size <= stats.initial_size);
    for (&f, &g) in roots.iter().zip(&result.translate_all(&roots)) {
        assert!(equivalent(&sdd, f, g, NUM_VARS));
    }
}
