//! C dispatcher backend
//!
//! Emits, per chart, state constants, the vector size, the default
//! configuration, an init function copying it, and an exec function that
//! switches on each region's slot and, at a leaf, on the event.
//!
//! Only a leaf's own labeled transitions are dispatched, one per label.
//! Self-loops, internal and completion transitions, further guarded
//! alternatives for a label and transitions inherited from enclosing states
//! are written as comments and reported.

use super::{Backend, Rendered, cname, stname};
use crate::Result;
use crate::analysis::{CompiledTransition, Compilation, Diagnostic};
use crate::config::{CConfig, SlotWidth};
use crate::statechart::{RegionRef, StateRef, TransitionKind};
use std::collections::HashSet;

pub struct CBackend {
    config: CConfig,
    width: SlotWidth,
}

impl CBackend {
    pub fn new(config: CConfig, width: SlotWidth) -> Self {
        Self { config, width }
    }
}

impl Backend for CBackend {
    fn name(&self) -> &'static str {
        "c"
    }

    fn render(&self, units: &[Compilation]) -> Result<Rendered> {
        let mut rendered = Rendered::default();
        rendered.text.push_str("#include <string.h>\n\n");
        for unit in units {
            let mut emitter = Emitter {
                unit,
                config: &self.config,
                slot: self.width.c_type(),
                text: String::new(),
                diagnostics: Vec::new(),
                inherited: HashSet::new(),
            };
            emitter.chart();
            tracing::debug!(
                "C backend: chart '{}' rendered, {} diagnostic(s)",
                unit.chart.name,
                emitter.diagnostics.len()
            );
            rendered.text.push_str(&emitter.text);
            rendered.diagnostics.extend(emitter.diagnostics);
        }
        Ok(rendered)
    }
}

fn indent(level: usize) -> String {
    " ".repeat(2 * level + 2)
}

struct Emitter<'a> {
    unit: &'a Compilation,
    config: &'a CConfig,
    slot: &'static str,
    text: String,
    diagnostics: Vec<Diagnostic>,
    /// Ancestors whose transitions were already reported
    inherited: HashSet<StateRef>,
}

impl Emitter<'_> {
    fn line(&mut self, indent: &str, text: &str) {
        self.text.push_str(indent);
        self.text.push_str(text);
        self.text.push('\n');
    }

    fn warn(&mut self, message: String) {
        self.diagnostics
            .push(Diagnostic::warning(&self.unit.chart.name, message));
    }

    fn chart(&mut self) {
        let unit = self.unit;
        let chart = &unit.chart;
        let name = cname(&chart.name);
        let size = format!("{}_MACH_SIZE", name.to_uppercase());

        self.text.push_str(&format!("/* statechart {} */\n", chart.name));
        self.defines(chart.root);
        self.text
            .push_str(&format!("#define {:<31} {}\n\n", size, chart.nslot));

        let values: Vec<String> = self.unit.initial.iter().map(|v| v.to_string()).collect();
        self.text.push_str(&format!(
            "static const {} {}_default[{}] = {{ {} }};\n\n",
            self.slot,
            name,
            size,
            values.join(", ")
        ));

        self.text.push_str(&format!(
            "void\n{}_init({} *mst)\n{{\n  memcpy(mst, {}_default, sizeof({}_default));\n}}\n\n",
            name, self.slot, name, name
        ));

        self.text.push_str(&format!(
            "void\n{}_exec(const {} *mst_curr, {} evt, {} *mst_next)\n{{\n",
            name, self.slot, self.config.event_type, self.slot
        ));
        self.text.push_str(&format!(
            "  memcpy(mst_next, mst_curr, sizeof({}_default));\n",
            name
        ));
        self.state_body(chart.root);
        self.text.push_str("}\n\n");
    }

    /// Constants for a state's children, then for their subtrees
    fn defines(&mut self, state: StateRef) {
        let unit = self.unit;
        let chart = &unit.chart;
        for &region in &chart.state(state).regions {
            for &child in &chart.region(region).states {
                let s = chart.state(child);
                self.text
                    .push_str(&format!("#define {:<31} {}\n", stname(&s.long_name), s.id));
            }
            for &child in &chart.region(region).states {
                self.defines(child);
            }
        }
    }

    fn state_body(&mut self, state: StateRef) {
        let unit = self.unit;
        let chart = &unit.chart;
        if chart.is_leaf(state) {
            self.leaf_body(state);
        } else {
            for &region in &chart.state(state).regions {
                self.region_body(region);
            }
        }
    }

    fn region_body(&mut self, region: RegionRef) {
        let unit = self.unit;
        let chart = &unit.chart;
        let r = chart.region(region);
        let nd = indent(r.level);

        self.line(&nd, &format!("/* region {} */", r.long_name));
        self.line(&nd, &format!("switch (mst_curr[{}]) {{", r.offset));
        for &state in &r.states {
            self.line(&nd, &format!("case {}:", stname(&chart.state(state).long_name)));
            self.state_body(state);
            self.line(&nd, "  break;");
        }
        self.line(&nd, "}");
    }

    fn leaf_body(&mut self, leaf: StateRef) {
        let unit = self.unit;
        let chart = &unit.chart;
        let nd = indent(chart.state(leaf).level);
        let Some(dispatch) = unit.leaf(leaf) else {
            return;
        };

        let mut cases: Vec<&CompiledTransition> = Vec::new();
        let mut labels: Vec<&str> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();

        for compiled in dispatch.local() {
            let t = chart.transition(compiled.transition);
            let route = format!(
                "{} -> {}",
                chart.state(leaf).name,
                chart.state(compiled.target).name
            );
            match t.label.as_deref() {
                _ if t.kind == TransitionKind::Internal || compiled.target == leaf => {
                    skipped.push(format!(
                        "/* self-loop/internal transition {} ({}) not done */",
                        route,
                        t.display_label()
                    ));
                    self.warn(format!(
                        "C backend: self-loop transition '{}' on '{}' is not dispatched",
                        t.display_label(),
                        chart.state(leaf).long_name
                    ));
                }
                None => {
                    skipped.push(format!("/* completion transition {} not done */", route));
                    self.warn(format!(
                        "C backend: completion transition {} in '{}' is not dispatched",
                        route, chart.name
                    ));
                }
                Some(label) if labels.contains(&label) => {
                    skipped.push(format!(
                        "/* further alternative for {} ({}) not done */",
                        label, route
                    ));
                    self.warn(format!(
                        "C backend: only the first transition on '{}' from '{}' is dispatched",
                        label,
                        chart.state(leaf).long_name
                    ));
                }
                Some(label) => {
                    labels.push(label);
                    cases.push(compiled);
                }
            }
        }

        if !cases.is_empty() {
            self.line(&nd, "switch (evt) {");
            for compiled in cases {
                self.case(&nd, leaf, compiled);
            }
            self.line(&nd, "}");
        }
        for comment in skipped {
            self.line(&nd, &comment);
        }

        for level in dispatch.inherited() {
            if level.transitions.is_empty() {
                continue;
            }
            let ancestor = chart.state(level.state);
            self.line(
                &nd,
                &format!("/* transitions inherited from {} not done */", ancestor.name),
            );
            if self.inherited.insert(level.state) {
                self.warn(format!(
                    "C backend: transitions of composite state '{}' are not dispatched from its substates",
                    ancestor.long_name
                ));
            }
        }
    }

    fn case(&mut self, nd: &str, leaf: StateRef, compiled: &CompiledTransition) {
        let unit = self.unit;
        let chart = &unit.chart;
        let t = chart.transition(compiled.transition);
        let label = t.label.as_deref().unwrap_or_default();
        self.line(nd, &format!("case {}:", label));

        let mut body = format!("{}  ", nd);
        let guarded = match t.guard.as_deref() {
            Some(guard) if self.config.guards => {
                self.line(&body, &format!("if ({}) {{", guard));
                body.push_str("  ");
                true
            }
            Some(guard) => {
                self.line(&body, &format!("/* guard [{}] not evaluated */", guard));
                false
            }
            None => false,
        };

        self.line(
            &body,
            &format!(
                "/* {} -> {} */",
                chart.state(leaf).name,
                chart.state(compiled.target).name
            ),
        );
        for action in compiled.actions() {
            self.line(&body, &format!("{};", action));
        }
        for (slot, value) in compiled.patch.writes() {
            self.line(&body, &format!("mst_next[{}] = {};", slot, value));
        }

        if guarded {
            self.line(nd, "  }");
        }
        self.line(nd, "  break;");
    }
}
