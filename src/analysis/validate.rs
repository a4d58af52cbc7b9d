//! Chart validation
//!
//! Fatal checks run before encoding so that every later pass can rely on
//! a well-formed tree. Findings that do not affect generated code are
//! returned as diagnostics instead.

use super::diagnostics::Diagnostic;
use crate::statechart::{StateChart, StateRef, TransitionKind};
use crate::{Result, ensure, structural_error, unsupported_error};
use std::collections::HashMap;

/// Check the chart and collect non-fatal findings
pub fn validate(chart: &StateChart) -> Result<Vec<Diagnostic>> {
    chart.top_region()?;
    check_tree(chart)?;
    check_transitions(chart)?;
    check_unsupported(chart)?;

    let mut diagnostics = Vec::new();
    anonymous_states(chart, &mut diagnostics);
    trigger_conflicts(chart, &mut diagnostics);
    history_and_kinds(chart, &mut diagnostics);
    Ok(diagnostics)
}

fn check_tree(chart: &StateChart) -> Result<()> {
    for region in chart.region_refs() {
        let r = chart.region(region);
        let owner = r.parent.ok_or_else(|| {
            structural_error!("region '{}' has no owning state", r.long_name)
        })?;
        ensure!(
            chart.try_state(owner)?.regions.contains(&region),
            structural_error!(
                "region '{}' is not listed by its owning state '{}'",
                r.long_name,
                chart.state(owner).long_name
            )
        );
        ensure!(
            !r.states.is_empty(),
            structural_error!("region '{}' has no states", r.long_name)
        );
        ensure!(
            chart.initial_state(region).is_some(),
            structural_error!("region '{}' has no valid initial state", r.long_name)
        );
    }

    for state in chart.state_refs().filter(|&s| s != chart.root) {
        let s = chart.state(state);
        let region = s.parent.ok_or_else(|| {
            structural_error!("state '{}' has no parent region", s.long_name)
        })?;
        ensure!(
            chart.try_region(region)?.states.contains(&state),
            structural_error!("state '{}' is not listed by its parent region", s.long_name)
        );
    }
    Ok(())
}

fn check_transitions(chart: &StateChart) -> Result<()> {
    for transition in chart.transition_refs() {
        let t = chart.transition(transition);
        let label = t.display_label();
        let source = t
            .source
            .ok_or_else(|| structural_error!("transition '{}' has no source", label))?;
        let target = t
            .target
            .ok_or_else(|| structural_error!("transition '{}' has no target", label))?;
        chart.try_state(source)?;
        chart.try_state(target)?;
        ensure!(
            source != chart.root && target != chart.root,
            structural_error!("transition '{}' connects the chart root", label)
        );
    }
    Ok(())
}

fn check_unsupported(chart: &StateChart) -> Result<()> {
    for state in chart.state_refs() {
        let s = chart.state(state);
        if let Some(machine) = &s.submachine {
            return Err(unsupported_error!(
                "state '{}' references submachine '{}'",
                s.long_name,
                machine
            ));
        }
        if s.a_do.is_some() {
            return Err(unsupported_error!(
                "state '{}' declares a do-activity; do-activities are not supported",
                s.long_name
            ));
        }
    }
    Ok(())
}

fn anonymous_states(chart: &StateChart, diagnostics: &mut Vec<Diagnostic>) {
    for state in chart.state_refs() {
        let s = chart.state(state);
        if s.anonymous {
            diagnostics.push(Diagnostic::warning(
                &chart.name,
                format!("state '{}' has no name", s.long_name),
            ));
        }
    }
}

/// Same trigger declared more than once on one state
fn trigger_conflicts(chart: &StateChart, diagnostics: &mut Vec<Diagnostic>) {
    for state in chart.state_refs() {
        let mut by_label: HashMap<&str, Vec<Option<&str>>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for &t in &chart.state(state).otrans {
            let t = chart.transition(t);
            if let Some(label) = t.label.as_deref() {
                let guards = by_label.entry(label).or_default();
                if guards.is_empty() {
                    order.push(label);
                }
                guards.push(t.guard.as_deref());
            }
        }

        for label in order {
            let guards = &by_label[label];
            if guards.len() < 2 {
                continue;
            }
            report_trigger(chart, state, label, guards, diagnostics);
        }
    }
}

fn report_trigger(
    chart: &StateChart,
    state: StateRef,
    label: &str,
    guards: &[Option<&str>],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let long_name = &chart.state(state).long_name;
    let mut seen: Vec<Option<&str>> = Vec::new();
    let mut duplicated = false;
    for guard in guards {
        if seen.contains(guard) {
            duplicated = true;
        } else {
            seen.push(*guard);
        }
    }

    if duplicated {
        diagnostics.push(Diagnostic::warning(
            &chart.name,
            format!(
                "state '{}' maps trigger '{}' more than once with the same guard",
                long_name, label
            ),
        ));
    }
    if seen.len() > 1 {
        diagnostics.push(Diagnostic::warning(
            &chart.name,
            format!(
                "state '{}' has {} guarded alternatives for '{}'; evaluation follows declaration order",
                long_name,
                seen.len(),
                label
            ),
        ));
    }
}

fn history_and_kinds(chart: &StateChart, diagnostics: &mut Vec<Diagnostic>) {
    for region in chart.region_refs() {
        let r = chart.region(region);
        if let Some(history) = r.history {
            diagnostics.push(Diagnostic::note(
                &chart.name,
                format!(
                    "region '{}' keeps {:?} history slots, but no transition re-enters through them",
                    r.long_name, history
                ),
            ));
        }
    }
    for transition in chart.transition_refs() {
        let t = chart.transition(transition);
        if t.kind == TransitionKind::Local {
            diagnostics.push(Diagnostic::note(
                &chart.name,
                format!("local transition '{}' is compiled as external", t.display_label()),
            ));
        }
    }
}
