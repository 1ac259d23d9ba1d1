//! Batch translation of many roots across one vtree edit.
//!
//! Translation runs in two phases. Planning walks the DAG from the roots and
//! records one [`Action`] per node, visiting every node once and descending
//! only into the side of a node that the edit can affect. Execution then
//! walks the planned nodes children first and evaluates their actions.

use std::collections::HashMap;

use log::debug;

use crate::handler::{check, Cancelable, ComputationEvent, ComputationHandler};
use crate::node::Element;
use crate::reference::Ref;
use crate::restructure::{VtreeEdit, VtreeOperation};
use crate::sdd::{Sdd, VtreeShadow};
use crate::transform::{Action, TransformContext, TransformationResult};

/// Actions for every node reachable from a set of roots.
#[derive(Debug, Default)]
pub struct TransformationPlan {
    actions: HashMap<Ref, Action>,
    /// Planned nodes, children before parents.
    order: Vec<Ref>,
}

impl TransformationPlan {
    pub fn action(&self, f: Ref) -> Option<&Action> {
        self.actions.get(&f)
    }

    /// Number of planned nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of nodes whose translation is not the node itself.
    pub fn num_changed(&self) -> usize {
        self.actions.values().filter(|a| **a != Action::Keep).count()
    }
}

impl Sdd {
    pub(crate) fn plan(&self, ctx: &TransformContext, roots: &[Ref]) -> TransformationPlan {
        let mut plan = TransformationPlan::default();
        for &f in roots {
            self.plan_rec(ctx, f, &mut plan);
        }
        plan
    }

    fn plan_rec(&self, ctx: &TransformContext, f: Ref, plan: &mut TransformationPlan) {
        if f.is_trivial() || plan.actions.contains_key(&f) {
            return;
        }
        let action = self.classify(ctx, f);
        match action {
            Action::DescendPrime => {
                for e in self.elements(f).iter() {
                    self.plan_rec(ctx, e.prime, plan);
                }
            }
            Action::DescendSub => {
                for e in self.elements(f).iter() {
                    self.plan_rec(ctx, e.sub, plan);
                }
            }
            _ => {}
        }
        plan.actions.insert(f, action);
        plan.order.push(f);
    }

    pub(crate) fn execute_plan(
        &self,
        ctx: &TransformContext,
        plan: &TransformationPlan,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<HashMap<Ref, Ref>> {
        let mut translated: HashMap<Ref, Ref> = HashMap::with_capacity(plan.len());
        for &f in &plan.order {
            let get = |g: Ref, translated: &HashMap<Ref, Ref>| translated.get(&g).copied().unwrap_or(g);
            let g = match &plan.actions[&f] {
                Action::Keep => f,
                Action::Reregister => self.reregister(ctx, f),
                Action::Partition(cases) => self.partition(ctx, f, cases, handler)?,
                Action::DescendPrime => {
                    let elements = self
                        .elements(f)
                        .iter()
                        .map(|e| Element::new(get(e.prime, &translated), e.sub))
                        .collect();
                    self.rebuild_ancestor(ctx, f, elements)
                }
                Action::DescendSub => {
                    let elements = self
                        .elements(f)
                        .iter()
                        .map(|e| Element::new(e.prime, get(e.sub, &translated)))
                        .collect();
                    self.rebuild_ancestor(ctx, f, elements)
                }
            };
            translated.insert(f, g);
        }
        Ok(translated)
    }

    /// Applies `operation` to the current vtree and translates all `roots`.
    ///
    /// The new vtree stays pushed while the returned shadow lives. On
    /// cancellation it is popped before returning.
    pub fn transform(
        &self,
        roots: &[Ref],
        operation: VtreeOperation,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<(TransformationResult, VtreeShadow<'_>)> {
        check(handler, ComputationEvent::ComputationStarted)?;
        let (result, _, shadow) = self.transform_edit(roots, operation, handler)?;
        Ok((result, shadow))
    }

    pub(crate) fn transform_edit(
        &self,
        roots: &[Ref],
        operation: VtreeOperation,
        handler: &mut dyn ComputationHandler,
    ) -> Cancelable<(TransformationResult, VtreeEdit, VtreeShadow<'_>)> {
        let (ctx, shadow) = self.begin_transformation(operation, handler)?;
        let plan = self.plan(&ctx, roots);
        debug!(
            "transform: {} planned {} node(s), {} changing",
            operation,
            plan.len(),
            plan.num_changed()
        );
        let translated = self.execute_plan(&ctx, &plan, handler)?;
        let translations = roots
            .iter()
            .map(|&f| (f, translated.get(&f).copied().unwrap_or(f)))
            .filter(|(f, g)| f != g)
            .collect();
        let result = TransformationResult::new(translations, self.vtree());
        Ok((result, ctx.edit, shadow))
    }
}
