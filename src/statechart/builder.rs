//! Chart construction
//!
//! `ChartBuilder` is the create-only interface a model translator uses to
//! hand a statechart to the compiler. It wires every `parent` back-reference
//! as elements are added and fills in levels, sibling indices and long names
//! on [`ChartBuilder::build`]. Ids, offsets and widths are left to the
//! encoder.

use super::model::{
    History, Region, RegionRef, State, StateChart, StateRef, Transition, TransitionRef,
};
use crate::{Result, structural_error};

pub struct ChartBuilder {
    chart: StateChart,
    top: RegionRef,
    anonymous: usize,
}

impl ChartBuilder {
    /// Start a chart with its root state and single top region
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut chart = StateChart {
            name: name.clone(),
            states: Vec::new(),
            regions: Vec::new(),
            transitions: Vec::new(),
            root: StateRef(0),
            nslot: 0,
            maxid: 0,
            encoded: false,
        };
        chart.states.push(new_state(name, false, None));
        let top = RegionRef(0);
        chart.regions.push(new_region(None, Some(chart.root)));
        chart.states[0].regions.push(top);

        Self {
            chart,
            top,
            anonymous: 0,
        }
    }

    pub fn top_region(&self) -> RegionRef {
        self.top
    }

    pub fn root(&self) -> StateRef {
        self.chart.root
    }

    /// Add a named state at the end of `region`
    pub fn state(&mut self, region: RegionRef, name: impl Into<String>) -> StateRef {
        self.push_state(region, name.into(), false)
    }

    /// Add a state the translator could not name
    pub fn anonymous_state(&mut self, region: RegionRef) -> StateRef {
        self.anonymous += 1;
        let name = format!("UNKNOWN{}", self.anonymous);
        self.push_state(region, name, true)
    }

    fn push_state(&mut self, region: RegionRef, name: String, anonymous: bool) -> StateRef {
        let state = StateRef(self.chart.states.len());
        self.chart.states.push(new_state(name, anonymous, Some(region)));
        self.chart.region_mut(region).states.push(state);
        state
    }

    /// Add a child region to `state`
    pub fn region(&mut self, state: StateRef) -> RegionRef {
        let region = RegionRef(self.chart.regions.len());
        self.chart.regions.push(new_region(None, Some(state)));
        self.chart.state_mut(state).regions.push(region);
        region
    }

    pub fn named_region(&mut self, state: StateRef, name: impl Into<String>) -> RegionRef {
        let region = self.region(state);
        self.chart.region_mut(region).name = Some(name.into());
        region
    }

    /// Mark `state` as the default child of `region`
    pub fn initial(&mut self, region: RegionRef, state: StateRef) -> Result<()> {
        let position = self
            .chart
            .region(region)
            .states
            .iter()
            .position(|&s| s == state)
            .ok_or_else(|| {
                structural_error!(
                    "initial state '{}' is not a child of its region",
                    self.chart.state(state).name
                )
            })?;
        let target = self.chart.region_mut(region);
        if target.initial.is_some() {
            return Err(structural_error!(
                "region already has an initial state; '{}' would be a second one",
                self.chart.state(state).name
            ));
        }
        target.initial = Some(position + 1);
        Ok(())
    }

    pub fn history(&mut self, region: RegionRef, history: History) {
        self.chart.region_mut(region).history = Some(history);
    }

    pub fn entry(&mut self, state: StateRef, action: impl Into<String>) {
        self.chart.state_mut(state).a_en = Some(action.into());
    }

    pub fn exit(&mut self, state: StateRef, action: impl Into<String>) {
        self.chart.state_mut(state).a_ex = Some(action.into());
    }

    pub fn activity(&mut self, state: StateRef, action: impl Into<String>) {
        self.chart.state_mut(state).a_do = Some(action.into());
    }

    pub fn submachine(&mut self, state: StateRef, machine: impl Into<String>) {
        self.chart.state_mut(state).submachine = Some(machine.into());
    }

    /// Add a transition; it is attached to its source's outgoing list
    ///
    /// Endpoints are not checked here. A handle that is not part of this
    /// chart is reported by validation as a structural error.
    pub fn transition(&mut self, transition: Transition) -> TransitionRef {
        let handle = TransitionRef(self.chart.transitions.len());
        if let Some(state) = transition
            .source
            .and_then(|source| self.chart.states.get_mut(source.0))
        {
            state.otrans.push(handle);
        }
        self.chart.transitions.push(transition);
        handle
    }

    /// Finish construction: compute levels, sibling indices and long names
    pub fn build(mut self) -> StateChart {
        let root = self.chart.root;
        self.chart.state_mut(root).long_name = self.chart.name.clone();
        annotate_state(&mut self.chart, root);
        self.chart
    }
}

fn new_state(name: String, anonymous: bool, parent: Option<RegionRef>) -> State {
    State {
        name,
        anonymous,
        long_name: String::new(),
        parent,
        regions: Vec::new(),
        id: 0,
        shallow_id: 0,
        index: 0,
        level: 0,
        nslot: 0,
        a_en: None,
        a_ex: None,
        a_do: None,
        submachine: None,
        otrans: Vec::new(),
    }
}

fn new_region(name: Option<String>, parent: Option<StateRef>) -> Region {
    Region {
        name,
        long_name: String::new(),
        parent,
        states: Vec::new(),
        offset: 0,
        nslot: 0,
        initial: None,
        dhist: None,
        shist: None,
        history: None,
        index: 0,
        level: 0,
    }
}

fn annotate_state(chart: &mut StateChart, state: StateRef) {
    let regions = chart.state(state).regions.clone();
    let orthogonal = regions.len() > 1;
    let level = chart.state(state).level;
    let owner_name = chart.state(state).long_name.clone();

    for (ix, region) in regions.into_iter().enumerate() {
        let index = if orthogonal { ix + 1 } else { 0 };
        let long_name = if orthogonal {
            format!("{}[{}]", owner_name, index)
        } else {
            owner_name.clone()
        };
        let r = chart.region_mut(region);
        r.index = index;
        r.level = level;
        r.long_name = long_name;
        annotate_region(chart, region);
    }
}

fn annotate_region(chart: &mut StateChart, region: RegionRef) {
    let states = chart.region(region).states.clone();
    let level = chart.region(region).level + 1;
    let prefix = chart.region(region).long_name.clone();

    for (index, state) in states.into_iter().enumerate() {
        let s = chart.state_mut(state);
        s.index = index;
        s.level = level;
        s.long_name = format!("{}.{}", prefix, s.name);
        annotate_state(chart, state);
    }
}
