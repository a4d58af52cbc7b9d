//! Analysis module - Encoding and transition compilation
//!
//! `compile` runs the whole pipeline for one chart: validation, state-vector
//! encoding, the initial configuration and a dispatch table holding every
//! transition compiled for every leaf. Any fatal error stops the chart
//! before a backend sees it.

pub mod collector;
pub mod diagnostics;
pub mod encoder;
pub mod hierarchy;
pub mod initial;
pub mod reachability;
pub mod transition;
pub mod validate;

pub use diagnostics::{Diagnostic, Severity};
pub use transition::{ActionStep, CompiledTransition, Patch};

use crate::Result;
use crate::config::EncodingConfig;
use crate::statechart::{StateChart, StateRef};
use serde::Serialize;
use std::collections::HashSet;

/// Transitions of one ancestor level, compiled for a specific leaf
#[derive(Debug, Clone, Serialize)]
pub struct DispatchLevel {
    pub state: StateRef,
    pub transitions: Vec<CompiledTransition>,
}

/// Everything a leaf can do, most specific level first
#[derive(Debug, Clone, Serialize)]
pub struct LeafDispatch {
    pub leaf: StateRef,
    pub levels: Vec<DispatchLevel>,
}

impl LeafDispatch {
    /// Transitions declared on the leaf itself
    pub fn local(&self) -> &[CompiledTransition] {
        self.levels
            .first()
            .filter(|level| level.state == self.leaf)
            .map(|level| level.transitions.as_slice())
            .unwrap_or_default()
    }

    /// Transitions inherited from enclosing states
    pub fn inherited(&self) -> impl Iterator<Item = &DispatchLevel> {
        self.levels.iter().filter(move |level| level.state != self.leaf)
    }
}

/// An encoded chart together with its analysis products
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    pub chart: StateChart,
    pub initial: Vec<u32>,
    pub dispatch: Vec<LeafDispatch>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn leaf(&self, leaf: StateRef) -> Option<&LeafDispatch> {
        self.dispatch.iter().find(|d| d.leaf == leaf)
    }
}

/// Validate, encode and compile one chart
pub fn compile(chart: StateChart, config: &EncodingConfig) -> Result<Compilation> {
    let mut chart = chart;
    tracing::info!("Compiling chart '{}'", chart.name);

    let mut diagnostics = validate::validate(&chart)?;
    encoder::encode(&mut chart, config.slot_width)?;
    let initial = initial::initial_vector(&chart)?;
    let dispatch = dispatch_table(&chart)?;

    diagnostics.extend(orthogonal_exits(&chart, &dispatch));
    diagnostics.extend(reachability::unreachable_states(&chart));
    for diagnostic in &diagnostics {
        tracing::warn!("{}", diagnostic);
    }

    tracing::info!(
        "Chart '{}': {} slot(s), {} leaf state(s), {} diagnostic(s)",
        chart.name,
        chart.nslot,
        dispatch.len(),
        diagnostics.len()
    );

    Ok(Compilation {
        chart,
        initial,
        dispatch,
        diagnostics,
    })
}

fn dispatch_table(chart: &StateChart) -> Result<Vec<LeafDispatch>> {
    let mut table = Vec::new();
    for leaf in collector::collect_leaves(chart) {
        let mut levels = Vec::new();
        for level in collector::outgoing_for(chart, leaf)? {
            let transitions = level
                .transitions
                .iter()
                .map(|&t| transition::compile_transition(chart, leaf, t))
                .collect::<Result<Vec<_>>>()?;
            levels.push(DispatchLevel {
                state: level.state,
                transitions,
            });
        }
        table.push(LeafDispatch { leaf, levels });
    }
    Ok(table)
}

/// Exit actions of the regions the active leaf is not in cannot be known
/// statically; leaving an orthogonal state skips them
fn orthogonal_exits(chart: &StateChart, dispatch: &[LeafDispatch]) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut diagnostics = Vec::new();
    for compiled in dispatch
        .iter()
        .flat_map(|d| d.levels.iter())
        .flat_map(|level| level.transitions.iter())
    {
        for ortho in compiled.exited_orthogonal(chart) {
            if seen.insert((compiled.transition, ortho)) {
                diagnostics.push(Diagnostic::note(
                    &chart.name,
                    format!(
                        "transition '{}' leaves orthogonal state '{}'; exit actions of its other regions are not run",
                        chart.transition(compiled.transition).display_label(),
                        chart.state(ortho).long_name
                    ),
                ));
            }
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::statechart::{ChartBuilder, Transition, fixtures};

    fn id(c: &Compilation, name: &str) -> u32 {
        c.chart.state(c.chart.find_state_by_name(name).unwrap()).id
    }

    fn only_transition<'a>(c: &'a Compilation, leaf: &str) -> &'a CompiledTransition {
        let leaf = c.chart.find_state_by_name(leaf).unwrap();
        let dispatch = c.leaf(leaf).unwrap();
        let all: Vec<&CompiledTransition> = dispatch
            .levels
            .iter()
            .flat_map(|l| l.transitions.iter())
            .collect();
        assert_eq!(all.len(), 1);
        all[0]
    }

    #[test]
    fn test_flat_end_to_end() {
        let c = compile(fixtures::flat(), &EncodingConfig::default()).unwrap();
        assert_eq!(c.initial, vec![id(&c, "A")]);
        assert!(c.diagnostics.is_empty());

        let mut vector = c.initial.clone();
        only_transition(&c, "A").patch.apply(&mut vector).unwrap();
        assert_eq!(vector, vec![id(&c, "B")]);
    }

    #[test]
    fn test_nested_end_to_end() {
        let c = compile(fixtures::nested(), &EncodingConfig::default()).unwrap();
        assert_eq!(c.initial, vec![id(&c, "S"), id(&c, "S1")]);

        let s1 = c.chart.find_state_by_name("S1").unwrap();
        let dispatch = c.leaf(s1).unwrap();
        assert_eq!(dispatch.local().len(), 1);
        let inner = &dispatch.local()[0];
        let mut vector = c.initial.clone();
        inner.patch.apply(&mut vector).unwrap();
        assert_eq!(vector, vec![id(&c, "S"), id(&c, "S2")]);

        let inherited: Vec<&DispatchLevel> = dispatch.inherited().collect();
        assert_eq!(inherited.len(), 1);
        let leave = &inherited[0].transitions[0];
        assert_eq!(
            leave.actions().collect::<Vec<_>>(),
            vec!["s1_ex()", "s_ex()", "bye()", "f_en()"]
        );
        let mut vector = c.initial.clone();
        leave.patch.apply(&mut vector).unwrap();
        assert_eq!(vector, vec![id(&c, "F"), 0]);

        // The same inherited transition fired from S2 exits S2 instead
        let s2 = c.chart.find_state_by_name("S2").unwrap();
        let from_s2 = &c.leaf(s2).unwrap().levels[1].transitions[0];
        assert_eq!(
            from_s2.actions().collect::<Vec<_>>(),
            vec!["s_ex()", "bye()", "f_en()"]
        );
    }

    #[test]
    fn test_fatal_errors_stop_compilation() {
        let mut b = ChartBuilder::new("cross");
        let top = b.top_region();
        let o = b.state(top, "O");
        b.initial(top, o).unwrap();
        let r1 = b.region(o);
        let r2 = b.region(o);
        let a = b.state(r1, "A");
        let c = b.state(r2, "C");
        b.initial(r1, a).unwrap();
        b.initial(r2, c).unwrap();
        b.transition(Transition::new(a, c).with_label("jump"));

        let err = compile(b.build(), &EncodingConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct(_)));
        assert!(err.is_fatal_compile_error());
    }

    #[test]
    fn test_composite_target_entered_by_default() {
        let mut b = ChartBuilder::new("enter");
        let top = b.top_region();
        let f = b.state(top, "F");
        let s = b.state(top, "S");
        let inner = b.region(s);
        let s1 = b.state(inner, "S1");
        b.initial(top, f).unwrap();
        b.initial(inner, s1).unwrap();
        b.transition(Transition::new(f, s).with_label("go"));

        let c = compile(b.build(), &EncodingConfig::default()).unwrap();
        assert!(c.diagnostics.is_empty());
        let mut vector = c.initial.clone();
        only_transition(&c, "F").patch.apply(&mut vector).unwrap();
        assert_eq!(vector, vec![id(&c, "S"), id(&c, "S1")]);
    }

    #[test]
    fn test_transition_out_of_orthogonal_state() {
        let mut b = ChartBuilder::new("ox");
        let top = b.top_region();
        let idle = b.state(top, "Idle");
        let o = b.state(top, "O");
        let r1 = b.region(o);
        let r2 = b.region(o);
        let a1 = b.state(r1, "A1");
        let a2 = b.state(r2, "A2");
        b.initial(top, idle).unwrap();
        b.initial(r1, a1).unwrap();
        b.initial(r2, a2).unwrap();
        b.transition(Transition::new(idle, o).with_label("start"));
        b.transition(Transition::new(o, idle).with_label("stop"));

        let c = compile(b.build(), &EncodingConfig::default()).unwrap();
        let mut vector = c.initial.clone();
        only_transition(&c, "Idle").patch.apply(&mut vector).unwrap();
        assert_eq!(vector, vec![id(&c, "O"), id(&c, "A1"), id(&c, "A2")]);

        for leaf in ["A1", "A2"] {
            let mut running = vector.clone();
            only_transition(&c, leaf).patch.apply(&mut running).unwrap();
            assert_eq!(running, vec![id(&c, "Idle"), 0, 0]);
        }

        // Reported once although both leaves inherit the transition
        assert_eq!(c.diagnostics.len(), 1);
        assert_eq!(c.diagnostics[0].severity, Severity::Note);
        assert!(c.diagnostics[0].message.contains("'stop' leaves orthogonal state 'ox.O'"));
    }

    #[test]
    fn test_orthogonal_compiles() {
        let c = compile(fixtures::orthogonal(), &EncodingConfig::default()).unwrap();
        assert_eq!(c.initial.len(), 4);
        assert_eq!(c.dispatch.len(), 6);
        let t = only_transition(&c, "A2");
        assert_eq!(t.patch.offset, 2);

        assert_eq!(c.diagnostics.len(), 1);
        assert!(c.diagnostics[0].to_string().contains("'ortho.O[2].C2.C22' is unreachable"));
    }
}
