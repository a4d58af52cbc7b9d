//! Statechart model
//!
//! An arena of regions, states and transitions. Handles are plain indices
//! into the chart that owns them; every back-reference (`parent`) is already
//! resolved when the chart leaves the builder.

use crate::{Error, Result, structural_error};
use serde::{Deserialize, Serialize};

/// Handle of a [`State`] inside its chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StateRef(pub(crate) usize);

/// Handle of a [`Region`] inside its chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionRef(pub(crate) usize);

/// Handle of a [`Transition`] inside its chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TransitionRef(pub(crate) usize);

/// Structural kind of a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateKind {
    /// No child regions
    Simple,
    /// Exactly one child region
    Composite,
    /// More than one child region, executing concurrently
    Orthogonal,
    /// Reference to another state machine
    Submachine,
}

impl StateKind {
    pub fn name(&self) -> &'static str {
        match self {
            StateKind::Simple => "simple",
            StateKind::Composite => "composite",
            StateKind::Orthogonal => "orthogonal",
            StateKind::Submachine => "submachine",
        }
    }
}

/// UML transition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    #[default]
    External,
    Internal,
    Local,
}

/// History pseudostate held by a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum History {
    Shallow,
    Deep,
}

#[derive(Debug, Clone, Serialize)]
pub struct State {
    pub name: String,
    /// True when the translator supplied no name
    pub anonymous: bool,
    pub long_name: String,
    pub parent: Option<RegionRef>,
    pub regions: Vec<RegionRef>,
    /// Chart-wide dispatch id; 0 is the root
    pub id: u32,
    /// 1-based numbering position among siblings
    pub shallow_id: u32,
    /// 0-based declaration position among siblings
    pub index: usize,
    pub level: usize,
    /// Concurrency width: slots consumed by all child regions together
    pub nslot: usize,
    pub a_en: Option<String>,
    pub a_ex: Option<String>,
    pub a_do: Option<String>,
    pub submachine: Option<String>,
    /// Outgoing transitions whose source is exactly this state
    pub otrans: Vec<TransitionRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub name: Option<String>,
    pub long_name: String,
    pub parent: Option<StateRef>,
    pub states: Vec<StateRef>,
    pub offset: usize,
    pub nslot: usize,
    /// 1-based index of the default child state
    pub initial: Option<usize>,
    /// Slot holding the remembered deep configuration
    pub dhist: Option<usize>,
    /// Slot holding the remembered shallow child
    pub shist: Option<usize>,
    pub history: Option<History>,
    pub index: usize,
    pub level: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub source: Option<StateRef>,
    pub target: Option<StateRef>,
    pub label: Option<String>,
    pub guard: Option<String>,
    pub actions: Vec<String>,
    pub kind: TransitionKind,
}

impl Transition {
    pub fn new(source: StateRef, target: StateRef) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            label: None,
            guard: None,
            actions: Vec::new(),
            kind: TransitionKind::External,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn with_kind(mut self, kind: TransitionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get display label for the transition
    pub fn display_label(&self) -> String {
        match (&self.label, &self.guard) {
            (Some(label), Some(guard)) => format!("{}[{}]", label, guard),
            (Some(label), None) => label.clone(),
            (None, Some(guard)) => format!("[{}]", guard),
            (None, None) => "(completion)".to_string(),
        }
    }
}

/// A statechart: the root state, its region tree and all transitions
#[derive(Debug, Clone, Serialize)]
pub struct StateChart {
    pub name: String,
    pub(crate) states: Vec<State>,
    pub(crate) regions: Vec<Region>,
    pub(crate) transitions: Vec<Transition>,
    pub root: StateRef,
    /// Total state-vector length
    pub nslot: usize,
    pub maxid: u32,
    pub(crate) encoded: bool,
}

impl StateChart {
    pub fn state(&self, state: StateRef) -> &State {
        &self.states[state.0]
    }

    pub fn region(&self, region: RegionRef) -> &Region {
        &self.regions[region.0]
    }

    pub fn transition(&self, transition: TransitionRef) -> &Transition {
        &self.transitions[transition.0]
    }

    pub(crate) fn state_mut(&mut self, state: StateRef) -> &mut State {
        &mut self.states[state.0]
    }

    pub(crate) fn region_mut(&mut self, region: RegionRef) -> &mut Region {
        &mut self.regions[region.0]
    }

    /// Checked lookup, for handles that may come from another chart
    pub fn try_state(&self, state: StateRef) -> Result<&State> {
        self.states
            .get(state.0)
            .ok_or_else(|| structural_error!("state handle {} is not part of chart '{}'", state.0, self.name))
    }

    pub fn try_region(&self, region: RegionRef) -> Result<&Region> {
        self.regions
            .get(region.0)
            .ok_or_else(|| structural_error!("region handle {} is not part of chart '{}'", region.0, self.name))
    }

    pub fn state_refs(&self) -> impl Iterator<Item = StateRef> + '_ {
        (0..self.states.len()).map(StateRef)
    }

    pub fn region_refs(&self) -> impl Iterator<Item = RegionRef> + '_ {
        (0..self.regions.len()).map(RegionRef)
    }

    pub fn transition_refs(&self) -> impl Iterator<Item = TransitionRef> + '_ {
        (0..self.transitions.len()).map(TransitionRef)
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn is_encoded(&self) -> bool {
        self.encoded
    }

    /// The single region owned by the root state
    pub fn top_region(&self) -> Result<RegionRef> {
        match self.state(self.root).regions.as_slice() {
            [top] => Ok(*top),
            [] => Err(structural_error!("chart '{}' has no top region", self.name)),
            _ => Err(Error::unsupported(format!(
                "chart '{}' has more than one top-level region",
                self.name
            ))),
        }
    }

    pub fn kind(&self, state: StateRef) -> StateKind {
        let state = self.state(state);
        if state.submachine.is_some() {
            return StateKind::Submachine;
        }
        match state.regions.len() {
            0 => StateKind::Simple,
            1 => StateKind::Composite,
            _ => StateKind::Orthogonal,
        }
    }

    pub fn is_leaf(&self, state: StateRef) -> bool {
        self.state(state).regions.is_empty()
    }

    /// State owning `region`; the root owns the top region
    pub fn owning_state(&self, region: RegionRef) -> Option<StateRef> {
        self.region(region).parent
    }

    pub fn owning_region(&self, state: StateRef) -> Option<RegionRef> {
        self.state(state).parent
    }

    /// The state one level up, `None` at the root or directly under it
    pub fn parent_state(&self, state: StateRef) -> Option<StateRef> {
        self.owning_region(state)
            .and_then(|region| self.owning_state(region))
            .filter(|parent| *parent != self.root)
    }

    /// Like [`Self::parent_state`] but treats a missing parent as malformed
    pub(crate) fn step_up(&self, state: StateRef) -> Result<StateRef> {
        let region = self.try_state(state)?.parent.ok_or_else(|| {
            structural_error!("state '{}' has no parent region", self.state(state).long_name)
        })?;
        self.try_region(region)?.parent.ok_or_else(|| {
            structural_error!("region '{}' has no owning state", self.region(region).long_name)
        })
    }

    /// Default child of a region, if the region names one
    pub fn initial_state(&self, region: RegionRef) -> Option<StateRef> {
        let region = self.region(region);
        region
            .initial
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| region.states.get(idx))
            .copied()
    }

    /// Look up a state by its long name
    pub fn find_state(&self, long_name: &str) -> Option<StateRef> {
        self.state_refs()
            .find(|&s| self.state(s).long_name == long_name)
    }

    /// Look up a state by name; the name must be unique in the chart
    pub fn find_state_by_name(&self, name: &str) -> Option<StateRef> {
        let mut found = self
            .state_refs()
            .filter(|&s| s != self.root && self.state(s).name == name);
        match (found.next(), found.next()) {
            (Some(state), None) => Some(state),
            _ => None,
        }
    }

    /// All transition labels used by the chart, deduplicated in declaration order
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for transition in &self.transitions {
            if let Some(label) = transition.label.as_deref()
                && !labels.contains(&label)
            {
                labels.push(label);
            }
        }
        labels
    }
}
