//! Transition collector
//!
//! A leaf sees its own outgoing transitions plus those of every enclosing
//! state. They are grouped per level, most specific first, so a dispatcher
//! can try the leaf before falling back to its ancestors.
//!
//! Within one state, labeled transitions come before unlabeled (completion)
//! ones; each group keeps declaration order.

use crate::Result;
use crate::statechart::{RegionRef, StateChart, StateRef, TransitionRef};
use serde::Serialize;

/// Transitions declared on one state of a leaf's ancestor chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionLevel {
    pub state: StateRef,
    pub transitions: Vec<TransitionRef>,
}

/// Outgoing transitions visible at `leaf`, leaf level first, root excluded
pub fn outgoing_for(chart: &StateChart, leaf: StateRef) -> Result<Vec<TransitionLevel>> {
    let mut levels = Vec::new();
    let mut state = leaf;
    while state != chart.root {
        levels.push(TransitionLevel {
            state,
            transitions: ordered(chart, &chart.try_state(state)?.otrans),
        });
        state = chart.step_up(state)?;
    }
    Ok(levels)
}

/// Labeled before unlabeled, declaration order within each group
pub fn ordered(chart: &StateChart, transitions: &[TransitionRef]) -> Vec<TransitionRef> {
    let mut sorted = transitions.to_vec();
    sorted.sort_by_key(|&t| chart.transition(t).label.is_none());
    sorted
}

/// All simple states, depth first in declaration order
pub fn collect_leaves(chart: &StateChart) -> Vec<StateRef> {
    let mut leaves = Vec::new();
    for &region in &chart.state(chart.root).regions {
        leaves_in(chart, region, &mut leaves);
    }
    leaves
}

fn leaves_in(chart: &StateChart, region: RegionRef, leaves: &mut Vec<StateRef>) {
    for &state in &chart.region(region).states {
        if chart.is_leaf(state) {
            leaves.push(state);
        } else {
            for &child in &chart.state(state).regions {
                leaves_in(chart, child, leaves);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statechart::{ChartBuilder, Transition, fixtures};

    #[test]
    fn test_leaf_then_ancestors() {
        let chart = fixtures::nested();
        let s1 = chart.find_state_by_name("S1").unwrap();
        let s = chart.find_state_by_name("S").unwrap();
        let levels = outgoing_for(&chart, s1).unwrap();

        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].state, s1);
        assert_eq!(levels[1].state, s);
        assert_eq!(chart.transition(levels[0].transitions[0]).label.as_deref(), Some("e"));
        assert_eq!(chart.transition(levels[1].transitions[0]).label.as_deref(), Some("leave"));
    }

    #[test]
    fn test_labeled_before_unlabeled_stable() {
        let mut b = ChartBuilder::new("order");
        let top = b.top_region();
        let a = b.state(top, "A");
        let c = b.state(top, "C");
        b.initial(top, a).unwrap();
        let t0 = b.transition(Transition::new(a, c).with_guard("done"));
        let t1 = b.transition(Transition::new(a, c).with_label("zeta"));
        let t2 = b.transition(Transition::new(a, c));
        let t3 = b.transition(Transition::new(a, c).with_label("alpha"));
        let chart = b.build();

        let levels = outgoing_for(&chart, a).unwrap();
        assert_eq!(levels[0].transitions, vec![t1, t3, t0, t2]);
    }

    #[test]
    fn test_collect_leaves() {
        let chart = fixtures::orthogonal();
        let names: Vec<&str> = collect_leaves(&chart)
            .into_iter()
            .map(|s| chart.state(s).name.as_str())
            .collect();
        assert_eq!(names, vec!["Idle", "A1", "B1", "A2", "C21", "C22"]);
    }
}
