//! Dynamic vtree minimization by local search over fragments.
//!
//! A pass walks the vtree bottom-up. At every internal node inside the
//! pass's [`SearchRegion`] that roots a fragment, all twelve fragment states
//! are measured and the smallest one is kept. Both fragment kinds are tried
//! when both are legal. The total size of the pinned roots never grows: the
//! initial state is always a candidate, and ties keep the earlier state.

use log::{debug, info};

use crate::fragment::{FragmentKind, VtreeFragment};
use crate::handler::{
    check, Canceled, Computation, ComputationEvent, ComputationHandler, CompositeHandler, NopHandler,
    SearchHandlerFactory,
};
use crate::reference::Ref;
use crate::sdd::Sdd;
use crate::strategy::{BottomUpStrategy, SddMinimizationStrategy, SearchRegion};
use crate::transform::TransformationResult;
use crate::vtree::VtreeId;

#[derive(Debug, Clone)]
pub struct MinimizationConfig {
    /// Upper bound on the number of passes.
    pub max_passes: usize,
}

impl Default for MinimizationConfig {
    fn default() -> Self {
        Self { max_passes: 64 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimizationStats {
    pub passes: usize,
    pub fragments_searched: usize,
    pub states_measured: usize,
    pub initial_size: usize,
    pub final_size: usize,
}

/// Roots and their translation so far.
struct SearchState {
    roots: Vec<Ref>,
    result: TransformationResult,
    stats: MinimizationStats,
}

impl SearchState {
    fn commit(&mut self, fragment: &VtreeFragment<'_>) {
        self.result = self.result.collapse(fragment.result());
        self.roots = fragment.roots().to_vec();
    }
}

/// Best state found by exploring one fragment.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    kind: FragmentKind,
    index: usize,
    size: usize,
}

impl Sdd {
    /// Minimizes the total size of `roots` with [`BottomUpStrategy`].
    pub fn minimize(
        &self,
        roots: &[Ref],
        search: &dyn SearchHandlerFactory,
        handler: &mut dyn ComputationHandler,
    ) -> Computation<TransformationResult> {
        self.minimize_with(
            roots,
            &mut BottomUpStrategy,
            &MinimizationConfig::default(),
            search,
            handler,
        )
        .map(|(result, _)| result)
    }

    /// Minimizes the total size of `roots` by restructuring the vtree.
    ///
    /// Every local search gets a fresh handler from `search`. When one of
    /// them refuses, only that local search ends, keeping its best state.
    /// When `handler` refuses, minimization ends with the best result so far
    /// as [`Computation::Partial`].
    ///
    /// The final vtree is left on top of the stack, one frame above the
    /// vtree current at the call.
    pub fn minimize_with(
        &self,
        roots: &[Ref],
        strategy: &mut dyn SddMinimizationStrategy,
        config: &MinimizationConfig,
        search: &dyn SearchHandlerFactory,
        handler: &mut dyn ComputationHandler,
    ) -> Computation<(TransformationResult, MinimizationStats)> {
        for event in [ComputationEvent::ComputationStarted, ComputationEvent::MinimizationStarted] {
            if let Err(Canceled { event }) = check(handler, event) {
                return Computation::Canceled(event);
            }
        }

        let checkpoint = self.vtree_depth();
        let initial_size = self.size(roots);
        let mut state = SearchState {
            roots: roots.to_vec(),
            result: TransformationResult::identity(self.vtree()),
            stats: MinimizationStats {
                initial_size,
                final_size: initial_size,
                ..Default::default()
            },
        };
        info!("Minimizing {} root(s) of total size {}", roots.len(), initial_size);

        let mut region = strategy.first_region(self.vtree().num_vars());
        let mut canceled = None;
        while let Some(r) = region {
            if state.stats.passes >= config.max_passes {
                break;
            }
            let before = self.size(&state.roots);
            let outcome = self.local_search_pass(r, &mut state, search, handler);
            self.squash_vtree_stack(checkpoint);
            state.stats.passes += 1;

            let after = self.size(&state.roots);
            info!(
                "Pass {} over {:?}: size {} → {}, vtree {}",
                state.stats.passes,
                r,
                before,
                after,
                self.vtree()
            );
            if let Err(Canceled { event }) = outcome {
                canceled = Some(event);
                break;
            }
            if let Err(Canceled { event }) = check(handler, ComputationEvent::MinimizationPass { size: after }) {
                canceled = Some(event);
                break;
            }
            region = strategy.next_region(before, after);
        }

        state.stats.final_size = self.size(&state.roots);
        let result = (state.result, state.stats);
        match canceled {
            Some(event) => Computation::Partial(result, event),
            None => Computation::Done(result),
        }
    }

    /// One bottom-up pass. Fails only if `handler` refused; the state then
    /// holds everything committed before.
    fn local_search_pass(
        &self,
        region: SearchRegion,
        state: &mut SearchState,
        search: &dyn SearchHandlerFactory,
        handler: &mut dyn ComputationHandler,
    ) -> Result<(), Canceled> {
        let root = self.vtree().root();
        self.search_subtree(root, region, state, search, handler)?;
        Ok(())
    }

    /// Searches below and at `v`, returning the id `v`'s position got.
    fn search_subtree(
        &self,
        v: VtreeId,
        region: SearchRegion,
        state: &mut SearchState,
        search: &dyn SearchHandlerFactory,
        handler: &mut dyn ComputationHandler,
    ) -> Result<VtreeId, Canceled> {
        let vtree = self.vtree();
        if vtree.is_leaf(v) {
            return Ok(v);
        }
        let left = self.search_subtree(vtree.left(v), region, state, search, handler)?;
        let v = self.parent_of(left);
        let right = self.search_subtree(self.vtree().right(v), region, state, search, handler)?;
        let v = self.parent_of(right);

        let vtree = self.vtree();
        let searchable = vtree.is_left_fragment(v) || vtree.is_right_fragment(v);
        if searchable && region.contains(vtree.var_count(v)) {
            self.best_local_state(v, state, search, handler)
        } else {
            Ok(v)
        }
    }

    fn parent_of(&self, child: VtreeId) -> VtreeId {
        match self.vtree().parent(child) {
            Some(parent) => parent,
            None => unreachable!("a searched child has a parent"),
        }
    }

    /// Tries every fragment state at `v`, commits the smallest one and
    /// returns the new id of the fragment root.
    fn best_local_state(
        &self,
        v: VtreeId,
        state: &mut SearchState,
        search: &dyn SearchHandlerFactory,
        handler: &mut dyn ComputationHandler,
    ) -> Result<VtreeId, Canceled> {
        check(handler, ComputationEvent::LocalSearchStarted)?;
        state.stats.fragments_searched += 1;

        let depth = self.vtree_depth();
        let vtree = self.vtree();
        let mut kinds = Vec::with_capacity(2);
        if vtree.is_left_fragment(v) {
            kinds.push(FragmentKind::Left);
        }
        if vtree.is_right_fragment(v) {
            kinds.push(FragmentKind::Right);
        }

        let base_size = self.size(&state.roots);
        let mut best: Option<Candidate> = None;
        let mut outer_refusal = None;
        let mut last: Option<VtreeFragment<'_>> = None;

        let mut local = search.create();
        for kind in kinds {
            // the previous fragment goes back to the snapshot first
            if let Some(mut previous) = last.take() {
                previous.rollback(0);
            }
            let mut fragment = VtreeFragment::new(self, v, kind, state.roots.clone());
            let mut composite = CompositeHandler::new(handler, &mut *local);
            let stopped = self.explore(&mut fragment, &mut composite, &mut best, &mut state.stats);
            if composite.outer_refused() {
                outer_refusal = stopped;
            }
            let exhausted = stopped.is_some();
            last = Some(fragment);
            if exhausted {
                break;
            }
        }

        let result_root = match (best, last) {
            (Some(best), Some(mut fragment)) if best.size < base_size => {
                if fragment.kind() == best.kind {
                    fragment.rollback(best.index);
                } else {
                    fragment.rollback(0);
                    fragment = VtreeFragment::new(self, v, best.kind, state.roots.clone());
                    if let Err(canceled) = fragment.goto(best.index, &mut NopHandler) {
                        unreachable!("{} while replaying a fragment", canceled);
                    }
                }
                debug!(
                    "Fragment at {} ({:?}): size {} → {} in state {}",
                    v, best.kind, base_size, best.size, best.index
                );
                state.commit(&fragment);
                let root = fragment.root();
                drop(fragment);
                self.squash_vtree_stack(depth);
                root
            }
            (_, Some(mut fragment)) => {
                fragment.rollback(0);
                v
            }
            (_, None) => v,
        };

        match outer_refusal {
            Some(event) => Err(Canceled { event }),
            None => Ok(result_root),
        }
    }

    /// Walks through all states of `fragment`, recording the smallest.
    ///
    /// Returns the event on which `handler` refused, if it did.
    fn explore(
        &self,
        fragment: &mut VtreeFragment<'_>,
        handler: &mut dyn ComputationHandler,
        best: &mut Option<Candidate>,
        stats: &mut MinimizationStats,
    ) -> Option<ComputationEvent> {
        while fragment.has_next() {
            let size = match fragment.next(handler) {
                Ok(size) => size,
                Err(Canceled { event }) => return Some(event),
            };
            stats.states_measured += 1;
            if best.map_or(true, |b| size < b.size) {
                *best = Some(Candidate {
                    kind: fragment.kind(),
                    index: fragment.state(),
                    size,
                });
            }
            if let Err(Canceled { event }) = check(handler, ComputationEvent::MinimizationStep { size }) {
                return Some(event);
            }
        }
        None
    }
}
