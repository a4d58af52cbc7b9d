//! Transition compiler
//!
//! Turns one `src -> dst` step into the ordered run-to-completion action
//! list (exits innermost first, the transition's own effects, entries
//! outermost first) and the contiguous state-vector patch that moves the
//! configuration below the lowest common region from `src` to `dst`.
//!
//! A composite target is entered through its default children. Leaving an
//! orthogonal state clears all of its regions; only a step from one of its
//! regions into a sibling region is rejected, by the hierarchy resolver.

use super::hierarchy::lowest_common_region;
use super::initial::default_child;
use crate::statechart::{
    RegionRef, StateChart, StateKind, StateRef, TransitionKind, TransitionRef,
};
use crate::{Result, ensure, structural_error};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionStep {
    Exit {
        state: StateRef,
        action: Option<String>,
    },
    Effect(String),
    Entry {
        state: StateRef,
        action: Option<String>,
    },
}

impl ActionStep {
    /// Statement text, if the step has one
    pub fn action(&self) -> Option<&str> {
        match self {
            ActionStep::Exit { action, .. } | ActionStep::Entry { action, .. } => action.as_deref(),
            ActionStep::Effect(action) => Some(action),
        }
    }
}

/// Values to write into the state vector starting at `offset`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    pub offset: usize,
    pub values: Vec<u32>,
}

impl Patch {
    /// Length of the `[offset, values...]` list form
    pub fn encoded_len(&self) -> usize {
        1 + self.values.len()
    }

    /// `[offset, values...]`
    pub fn to_list(&self) -> Vec<usize> {
        std::iter::once(self.offset)
            .chain(self.values.iter().map(|&v| v as usize))
            .collect()
    }

    /// `(slot, value)` pairs in increasing slot order
    pub fn writes(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &value)| (self.offset + i, value))
    }

    /// Write the patch into `vector`, leaving all other slots untouched
    pub fn apply(&self, vector: &mut [u32]) -> Result<()> {
        let len = vector.len();
        let end = self.offset + self.values.len();
        let slots = vector.get_mut(self.offset..end).ok_or_else(|| {
            structural_error!(
                "patch {}..{} exceeds state vector of length {}",
                self.offset,
                end,
                len
            )
        })?;
        slots.copy_from_slice(&self.values);
        Ok(())
    }
}

/// A transition compiled for one active leaf
#[derive(Debug, Clone, Serialize)]
pub struct CompiledTransition {
    pub transition: TransitionRef,
    /// The leaf the transition fires from; may sit below the declared source
    pub source: StateRef,
    pub target: StateRef,
    pub lca: RegionRef,
    pub steps: Vec<ActionStep>,
    pub patch: Patch,
}

impl CompiledTransition {
    /// Non-empty action statements in execution order
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(ActionStep::action)
    }

    /// Orthogonal states this transition exits
    pub fn exited_orthogonal<'a>(
        &'a self,
        chart: &'a StateChart,
    ) -> impl Iterator<Item = StateRef> + 'a {
        self.steps.iter().filter_map(move |step| match step {
            ActionStep::Exit { state, .. } if chart.kind(*state) == StateKind::Orthogonal => {
                Some(*state)
            }
            _ => None,
        })
    }
}

/// States from `state` up to the one directly inside `lca`, innermost first
fn path_to(chart: &StateChart, state: StateRef, lca: RegionRef) -> Result<Vec<StateRef>> {
    let mut path = vec![state];
    let mut current = state;
    while chart.try_state(current)?.parent != Some(lca) {
        current = chart.step_up(current)?;
        path.push(current);
    }
    Ok(path)
}

/// Exits, entries and slot writes of one `src -> dst` step
struct Step {
    lca: RegionRef,
    /// Innermost first
    exits: Vec<StateRef>,
    /// Outermost first, default children included
    entries: Vec<StateRef>,
    writes: Vec<(usize, u32)>,
}

fn plan(chart: &StateChart, src: StateRef, dst: StateRef) -> Result<Step> {
    let lca = lowest_common_region(chart, src, dst)?;
    let exits = path_to(chart, src, lca)?;
    let mut dst_path = path_to(chart, dst, lca)?;
    dst_path.reverse();

    let mut step = Step {
        lca,
        exits,
        entries: Vec::new(),
        writes: Vec::new(),
    };
    enter(chart, &dst_path, &mut step)?;
    Ok(step)
}

/// Enter `path[0]`, following the rest of `path` where it leads and the
/// default children everywhere else
fn enter(chart: &StateChart, path: &[StateRef], step: &mut Step) -> Result<()> {
    let Some((&state, rest)) = path.split_first() else {
        return Ok(());
    };
    let region = chart.try_state(state)?.parent.ok_or_else(|| {
        structural_error!("state '{}' has no parent region", chart.state(state).long_name)
    })?;
    step.writes.push((chart.region(region).offset, chart.state(state).id));
    step.entries.push(state);

    for &child in &chart.state(state).regions {
        match rest.first() {
            Some(&next) if chart.owning_region(next) == Some(child) => enter(chart, rest, step)?,
            _ => enter(chart, &[default_child(chart, child)?], step)?,
        }
    }
    Ok(())
}

/// One past the last slot the configuration of `exits` can occupy
///
/// The active leaf holds its region's slot. Every orthogonal state on the
/// way up also holds the full range of its regions, whatever is active in
/// the regions the leaf is not in.
fn occupied_end(chart: &StateChart, exits: &[StateRef]) -> Result<usize> {
    let mut end = 0;
    for (i, &state) in exits.iter().enumerate() {
        let region = chart.try_state(state)?.parent.ok_or_else(|| {
            structural_error!("state '{}' has no parent region", chart.state(state).long_name)
        })?;
        let width = if i == 0 || chart.kind(state) == StateKind::Orthogonal {
            chart.state(state).nslot
        } else {
            0
        };
        end = end.max(chart.region(region).offset + 1 + width);
    }
    Ok(end)
}

fn action_steps(chart: &StateChart, step: &Step, actions: &[String]) -> Vec<ActionStep> {
    let mut steps = Vec::with_capacity(step.exits.len() + actions.len() + step.entries.len());
    steps.extend(step.exits.iter().map(|&state| ActionStep::Exit {
        state,
        action: chart.state(state).a_ex.clone(),
    }));
    steps.extend(actions.iter().cloned().map(ActionStep::Effect));
    steps.extend(step.entries.iter().map(|&state| ActionStep::Entry {
        state,
        action: chart.state(state).a_en.clone(),
    }));
    steps
}

fn patch_for(chart: &StateChart, step: &Step) -> Result<Patch> {
    let offset = chart.region(step.lca).offset;
    let written = step.writes.iter().map(|&(slot, _)| slot + 1).max().unwrap_or(offset + 1);
    let end = written.max(occupied_end(chart, &step.exits)?);

    let mut values = vec![0; end - offset];
    for &(slot, id) in &step.writes {
        let value = slot
            .checked_sub(offset)
            .and_then(|i| values.get_mut(i))
            .ok_or_else(|| structural_error!("slot {} lies outside region at offset {}", slot, offset))?;
        *value = id;
    }
    Ok(Patch { offset, values })
}

/// Exit list, declared effects, entry list
///
/// Entering a composite target also enters the default child of each of
/// its regions, recursively.
pub fn transition_actions(
    chart: &StateChart,
    src: StateRef,
    actions: &[String],
    dst: StateRef,
) -> Result<Vec<ActionStep>> {
    let step = plan(chart, src, dst)?;
    Ok(action_steps(chart, &step, actions))
}

/// Vector patch moving the configuration below the common region to `dst`
///
/// The patch starts at the common region's slot. It writes the ids of the
/// entered states and zeroes every other slot up to the end of whatever
/// `src`'s configuration occupied.
pub fn transition_patch(chart: &StateChart, src: StateRef, dst: StateRef) -> Result<Patch> {
    let step = plan(chart, src, dst)?;
    patch_for(chart, &step)
}

/// Compile `transition` as fired from the active leaf `source`
pub fn compile_transition(
    chart: &StateChart,
    source: StateRef,
    transition: TransitionRef,
) -> Result<CompiledTransition> {
    let t = chart.transition(transition);
    let target = t
        .target
        .ok_or_else(|| structural_error!("transition in chart '{}' has no target", chart.name))?;
    if t.kind == TransitionKind::Internal {
        return compile_internal(chart, source, transition, target);
    }
    let step = plan(chart, source, target)?;

    Ok(CompiledTransition {
        transition,
        source,
        target,
        lca: step.lca,
        steps: action_steps(chart, &step, &t.actions),
        patch: patch_for(chart, &step)?,
    })
}

/// Internal transitions run their effects only; the configuration is unchanged
fn compile_internal(
    chart: &StateChart,
    source: StateRef,
    transition: TransitionRef,
    target: StateRef,
) -> Result<CompiledTransition> {
    let t = chart.transition(transition);
    ensure!(
        t.source == Some(target),
        structural_error!(
            "internal transition '{}' must target its own source",
            t.display_label()
        )
    );
    let lca = chart.owning_region(target).ok_or_else(|| {
        structural_error!("state '{}' has no parent region", chart.state(target).long_name)
    })?;
    Ok(CompiledTransition {
        transition,
        source,
        target,
        lca,
        steps: t.actions.iter().cloned().map(ActionStep::Effect).collect(),
        patch: Patch {
            offset: chart.region(lca).offset,
            values: Vec::new(),
        },
    })
}
