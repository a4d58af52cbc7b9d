//! Promela backend
//!
//! One `mtype` enumeration covers the labels of every chart. Each chart
//! becomes an active process with its own event channel; the process loops
//! forever, takes the next event when none is pending and picks among the
//! transitions enabled in the current leaf.
//!
//! Only one discrete state variable is tracked, so a chart with orthogonal
//! regions is modeled through the first region of each orthogonal state.

use super::{Backend, Rendered, cname, stname};
use crate::Result;
use crate::analysis::initial::{default_leaf, initial_leaf};
use crate::analysis::{Compilation, Diagnostic};
use crate::config::PromelaConfig;
use crate::statechart::StateKind;

const INDENT: &str = "   ";

pub struct PromelaBackend {
    config: PromelaConfig,
}

impl PromelaBackend {
    pub fn new(config: PromelaConfig) -> Self {
        Self { config }
    }

    fn process(&self, unit: &Compilation, rendered: &mut Rendered) -> Result<()> {
        let chart = &unit.chart;
        let name = cname(&chart.name);
        let queue = format!("{}_evq", name);
        let text = &mut rendered.text;

        if let Some(ortho) = chart
            .state_refs()
            .find(|&s| chart.kind(s) == StateKind::Orthogonal)
        {
            text.push_str(&format!(
                "/* orthogonal regions of {} are not modeled; only the first region is tracked */\n",
                chart.state(ortho).long_name
            ));
            rendered.diagnostics.push(Diagnostic::note(
                &chart.name,
                format!(
                    "Promela backend tracks one state variable; orthogonal state '{}' is modeled through its first region",
                    chart.state(ortho).long_name
                ),
            ));
        }

        for dispatch in &unit.dispatch {
            let leaf = chart.state(dispatch.leaf);
            text.push_str(&format!("#define {:<31} {}\n", stname(&leaf.long_name), leaf.id));
        }
        text.push('\n');
        text.push_str(&format!(
            "chan {} = [{}] of {{ mtype }};\n\n",
            queue, self.config.queue_depth
        ));

        let start = chart.state(initial_leaf(chart)?);
        let l1 = INDENT;
        let l2 = INDENT.repeat(2);
        let l3 = INDENT.repeat(3);
        text.push_str(&format!("active proctype {}_exec()\n{{\n", name));
        text.push_str(&format!("{}byte evt, st;\n\n", l1));
        text.push_str(&format!("{}st = {};\n", l1, stname(&start.long_name)));
        text.push_str(&format!("{}evt = _NONE;\n", l1));
        text.push_str("loop:\n");
        text.push_str(&format!("{}if\n", l1));
        text.push_str(&format!(
            "{}:: atomic {{ (evt == _NONE) && nempty({}) -> {}?evt }}\n",
            l1, queue, queue
        ));
        text.push_str(&format!("{}:: else -> skip\n", l1));
        text.push_str(&format!("{}fi;\n", l1));

        text.push_str(&format!("{}if\n", l1));
        for dispatch in &unit.dispatch {
            let leaf = chart.state(dispatch.leaf);
            text.push_str(&format!("{}:: st == {} ->\n", l1, stname(&leaf.long_name)));
            text.push_str(&format!("{}if\n", l2));
            for level in &dispatch.levels {
                for compiled in &level.transitions {
                    let t = chart.transition(compiled.transition);
                    let condition = match (t.label.as_deref(), t.guard.as_deref()) {
                        (Some(label), Some(guard)) => format!("(evt == {}) && ({})", label, guard),
                        (Some(label), None) => format!("evt == {}", label),
                        (None, Some(guard)) => guard.to_string(),
                        (None, None) => "1".to_string(),
                    };
                    text.push_str(&format!("{}:: {} ->\n", l2, condition));

                    let mut statements: Vec<String> =
                        compiled.actions().map(str::to_string).collect();
                    if t.label.is_some() {
                        statements.push("evt = _NONE".to_string());
                    }
                    let target = chart.state(default_leaf(chart, compiled.target)?);
                    statements.push(format!("st = {}", stname(&target.long_name)));
                    let separator = format!(";\n{}", l3);
                    text.push_str(&format!("{}{}\n", l3, statements.join(&separator)));
                }
            }
            text.push_str(&format!("{}:: else -> evt = _NONE\n", l2));
            text.push_str(&format!("{}fi\n", l2));
        }
        text.push_str(&format!("{}fi;\n", l1));
        text.push_str(&format!("{}goto loop\n", l1));
        text.push_str("}\n\n");
        Ok(())
    }
}

impl Backend for PromelaBackend {
    fn name(&self) -> &'static str {
        "promela"
    }

    fn render(&self, units: &[Compilation]) -> Result<Rendered> {
        let mut labels: Vec<&str> = Vec::new();
        for unit in units {
            for label in unit.chart.labels() {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }

        let mut rendered = Rendered::default();
        let mut mtype = vec!["_NONE"];
        mtype.extend(labels);
        rendered
            .text
            .push_str(&format!("mtype = {{ {} }};\n\n", mtype.join(", ")));

        for unit in units {
            self.process(unit, &mut rendered)?;
            tracing::debug!("Promela backend: process for chart '{}' rendered", unit.chart.name);
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compile;
    use crate::config::EncodingConfig;
    use crate::statechart::fixtures;

    fn render(units: &[Compilation]) -> Rendered {
        PromelaBackend::new(PromelaConfig::default())
            .render(units)
            .unwrap()
    }

    fn compiled(chart: crate::StateChart) -> Compilation {
        compile(chart, &EncodingConfig::default()).unwrap()
    }

    #[test]
    fn test_flat_process() {
        let out = render(&[compiled(fixtures::flat())]);
        let text = &out.text;

        assert!(text.starts_with("mtype = { _NONE, evt1 };\n"));
        assert!(text.contains("chan flat_evq = [4] of { mtype };"));
        assert!(text.contains("active proctype flat_exec()\n{\n   byte evt, st;\n"));
        assert!(text.contains("   st = ST_flat_A;\n   evt = _NONE;\nloop:\n"));
        assert!(text.contains("   :: atomic { (evt == _NONE) && nempty(flat_evq) -> flat_evq?evt }\n"));
        assert!(text.contains(
            "   :: st == ST_flat_A ->\n      if\n      :: evt == evt1 ->\n         a_ex();\n         t1();\n         b_en();\n         evt = _NONE;\n         st = ST_flat_B\n      :: else -> evt = _NONE\n      fi\n"
        ));
        assert!(text.ends_with("   goto loop\n}\n\n"));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_labels_shared_across_charts() {
        let out = render(&[compiled(fixtures::flat()), compiled(fixtures::nested())]);
        assert!(out.text.starts_with("mtype = { _NONE, evt1, e, leave };"));
        assert_eq!(out.text.matches("active proctype").count(), 2);
    }

    #[test]
    fn test_inherited_transitions_offered_at_every_leaf() {
        let out = render(&[compiled(fixtures::nested())]);
        let text = &out.text;
        // Leaves only
        assert!(!text.contains("st == ST_nested_S ->"));
        assert!(text.contains("   st = ST_nested_S_S1;\n"));
        assert_eq!(text.matches(":: evt == leave ->").count(), 2);
        assert!(text.contains("         s1_ex();\n         s_ex();\n         bye();\n         f_en();\n"));
    }

    #[test]
    fn test_guards_and_composite_targets() {
        use crate::statechart::{ChartBuilder, Transition};

        let mut b = ChartBuilder::new("g");
        let top = b.top_region();
        let a = b.state(top, "A");
        let s = b.state(top, "S");
        let inner = b.region(s);
        let s1 = b.state(inner, "S1");
        b.initial(top, a).unwrap();
        b.initial(inner, s1).unwrap();
        b.entry(s, "s_en()");
        b.entry(s1, "s1_en()");
        b.transition(Transition::new(a, s).with_label("go").with_guard("ok"));
        b.transition(Transition::new(s1, a).with_guard("done"));

        let text = render(&[compiled(b.build())]).text;
        // Entry actions follow the default entry down to the leaf
        assert!(text.contains(
            ":: (evt == go) && (ok) ->\n         s_en();\n         s1_en();\n         evt = _NONE;\n         st = ST_g_S_S1\n"
        ));
        // Completion transitions keep the pending event
        assert!(text.contains(":: done ->\n         st = ST_g_A\n"));
    }

    #[test]
    fn test_orthogonal_limitation_reported() {
        let out = render(&[compiled(fixtures::orthogonal())]);
        assert!(out.text.contains("orthogonal regions of ortho.O are not modeled"));
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message.contains("'ortho.O'"));
    }
}
