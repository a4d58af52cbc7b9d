//! Chart documents
//!
//! A TOML (or JSON) description of one or more statecharts. Each document
//! is replayed through [`ChartBuilder`], so a loaded chart is exactly what a
//! model translator would have produced.

use super::builder::ChartBuilder;
use super::model::{History, RegionRef, StateChart, StateRef, Transition, TransitionKind};
use crate::{Error, Result, structural_error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDocument {
    #[serde(default)]
    pub chart: Vec<ChartSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub name: String,
    #[serde(default)]
    pub states: Vec<StateSpec>,
    #[serde(default)]
    pub transitions: Vec<TransitionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateSpec {
    pub name: Option<String>,
    #[serde(default)]
    pub initial: bool,
    pub entry: Option<String>,
    pub exit: Option<String>,
    #[serde(rename = "do")]
    pub activity: Option<String>,
    pub submachine: Option<String>,
    /// Shorthand for a single child region
    #[serde(default)]
    pub states: Vec<StateSpec>,
    #[serde(default)]
    pub regions: Vec<RegionSpec>,
    /// History of the shorthand region
    pub history: Option<History>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegionSpec {
    pub name: Option<String>,
    pub history: Option<History>,
    #[serde(default)]
    pub states: Vec<StateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionSpec {
    /// Dot-separated path of state names from the top region
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub guard: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub kind: TransitionKind,
}

/// Document encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

impl ChartDocument {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)?;
        Self::parse(&contents, Format::from_path(&path))
            .map_err(|e| Error::document(&path, document_message(e)))
    }

    pub fn parse(contents: &str, format: Format) -> Result<Self> {
        let document = match format {
            Format::Toml => toml::from_str(contents)?,
            Format::Json => serde_json::from_str(contents)?,
        };
        Ok(document)
    }

    /// Build every chart in the document
    pub fn build(&self) -> Result<Vec<StateChart>> {
        if self.chart.is_empty() {
            return Err(Error::custom("document contains no charts"));
        }
        self.chart.iter().map(ChartSpec::build).collect()
    }
}

fn document_message(err: Error) -> String {
    match err {
        Error::Document { message, .. } => message,
        other => other.to_string(),
    }
}

/// Load and build all charts from a TOML or JSON file
pub fn load_charts(path: impl Into<PathBuf>) -> Result<Vec<StateChart>> {
    let path = path.into();
    let document = ChartDocument::from_file(&path)?;
    tracing::debug!("Loaded {} chart(s) from {:?}", document.chart.len(), path);
    document.build()
}

impl ChartSpec {
    pub fn build(&self) -> Result<StateChart> {
        let mut builder = ChartBuilder::new(&self.name);
        let top = builder.top_region();
        add_states(&mut builder, top, &self.states)?;

        let probe = builder_names(&self.states);
        for spec in &self.transitions {
            let source = resolve_path(&probe, &spec.source)
                .ok_or_else(|| structural_error!("chart '{}': unknown transition source '{}'", self.name, spec.source))?;
            let target = resolve_path(&probe, &spec.target)
                .ok_or_else(|| structural_error!("chart '{}': unknown transition target '{}'", self.name, spec.target))?;
            let mut transition = Transition::new(source, target).with_kind(spec.kind);
            transition.label = spec.label.clone();
            transition.guard = spec.guard.clone();
            transition.actions = spec.actions.clone();
            builder.transition(transition);
        }

        Ok(builder.build())
    }
}

fn add_states(builder: &mut ChartBuilder, region: RegionRef, specs: &[StateSpec]) -> Result<()> {
    for spec in specs {
        let state = match &spec.name {
            Some(name) => builder.state(region, name),
            None => builder.anonymous_state(region),
        };
        if spec.initial {
            builder.initial(region, state)?;
        }
        if let Some(action) = &spec.entry {
            builder.entry(state, action);
        }
        if let Some(action) = &spec.exit {
            builder.exit(state, action);
        }
        if let Some(action) = &spec.activity {
            builder.activity(state, action);
        }
        if let Some(machine) = &spec.submachine {
            builder.submachine(state, machine);
        }

        if !spec.states.is_empty() && !spec.regions.is_empty() {
            return Err(structural_error!(
                "state '{}' lists both `states` and `regions`",
                spec.name.as_deref().unwrap_or("(unnamed)")
            ));
        }
        if !spec.states.is_empty() {
            let child = builder.region(state);
            if let Some(history) = spec.history {
                builder.history(child, history);
            }
            add_states(builder, child, &spec.states)?;
        }
        for region_spec in &spec.regions {
            let child = match &region_spec.name {
                Some(name) => builder.named_region(state, name),
                None => builder.region(state),
            };
            if let Some(history) = region_spec.history {
                builder.history(child, history);
            }
            add_states(builder, child, &region_spec.states)?;
        }
    }
    Ok(())
}

/// Name tree mirroring the builder's state numbering, used to resolve paths
struct NameNode {
    name: Option<String>,
    state: StateRef,
    children: Vec<NameNode>,
}

fn builder_names(specs: &[StateSpec]) -> Vec<NameNode> {
    // States are allocated depth first in declaration order, right after the root.
    let mut next = 1;
    number_specs(specs, &mut next)
}

fn number_specs(specs: &[StateSpec], next: &mut usize) -> Vec<NameNode> {
    let mut nodes = Vec::with_capacity(specs.len());
    for spec in specs {
        let state = StateRef(*next);
        *next += 1;
        let mut children = number_specs(&spec.states, next);
        for region in &spec.regions {
            children.extend(number_specs(&region.states, next));
        }
        nodes.push(NameNode {
            name: spec.name.clone(),
            state,
            children,
        });
    }
    nodes
}

fn resolve_path(nodes: &[NameNode], path: &str) -> Option<StateRef> {
    let mut level = nodes;
    let mut found = None;
    for segment in path.split('.') {
        let mut matches = level
            .iter()
            .filter(|node| node.name.as_deref() == Some(segment));
        let node = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        found = Some(node.state);
        level = &node.children;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statechart::StateKind;

    const DOOR: &str = r#"
[[chart]]
name = "door"

[[chart.states]]
name = "Closed"
initial = true
entry = "lamp_off()"

[[chart.states]]
name = "Open"
history = "shallow"

[[chart.states.states]]
name = "Ajar"
initial = true

[[chart.states.states]]
name = "Wide"

[[chart.transitions]]
source = "Closed"
target = "Open.Ajar"
label = "push"
guard = "unlocked"
actions = ["beep()"]

[[chart.transitions]]
source = "Open"
target = "Closed"
label = "slam"
"#;

    #[test]
    fn test_parse_toml_document() {
        let doc = ChartDocument::parse(DOOR, Format::Toml).unwrap();
        let charts = doc.build().unwrap();
        assert_eq!(charts.len(), 1);
        let chart = &charts[0];

        let closed = chart.find_state("door.Closed").unwrap();
        let open = chart.find_state("door.Open").unwrap();
        let ajar = chart.find_state("door.Open.Ajar").unwrap();
        assert_eq!(chart.kind(open), StateKind::Composite);
        assert_eq!(chart.state(closed).a_en.as_deref(), Some("lamp_off()"));

        let push = chart.transition(chart.state(closed).otrans[0]);
        assert_eq!(push.target, Some(ajar));
        assert_eq!(push.guard.as_deref(), Some("unlocked"));
        assert_eq!(push.actions, vec!["beep()".to_string()]);

        let inner = chart.state(open).regions[0];
        assert_eq!(chart.region(inner).history, Some(History::Shallow));
        assert_eq!(chart.initial_state(inner), Some(ajar));
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{
            "chart": [{
                "name": "j",
                "states": [
                    {"name": "A", "initial": true},
                    {"name": "P", "regions": [
                        {"states": [{"name": "X", "initial": true}]},
                        {"states": [{"name": "Y", "initial": true}]}
                    ]}
                ],
                "transitions": [{"source": "A", "target": "P.Y", "label": "go", "kind": "local"}]
            }]
        }"#;
        let charts = ChartDocument::parse(json, Format::Json).unwrap().build().unwrap();
        let chart = &charts[0];
        let p = chart.find_state("j.P").unwrap();
        assert_eq!(chart.kind(p), StateKind::Orthogonal);
        let y = chart.find_state("j.P[2].Y").unwrap();
        let a = chart.find_state("j.A").unwrap();
        let go = chart.transition(chart.state(a).otrans[0]);
        assert_eq!(go.target, Some(y));
        assert_eq!(go.kind, TransitionKind::Local);
    }

    #[test]
    fn test_unknown_path_is_structural() {
        let toml = r#"
[[chart]]
name = "bad"
[[chart.states]]
name = "A"
initial = true
[[chart.transitions]]
source = "A"
target = "Nope"
"#;
        let err = ChartDocument::parse(toml, Format::Toml)
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn test_two_initials_rejected() {
        let toml = r#"
[[chart]]
name = "bad"
[[chart.states]]
name = "A"
initial = true
[[chart.states]]
name = "B"
initial = true
"#;
        let err = ChartDocument::parse(toml, Format::Toml)
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn test_anonymous_state_named() {
        let toml = r#"
[[chart]]
name = "anon"
[[chart.states]]
initial = true
"#;
        let charts = ChartDocument::parse(toml, Format::Toml).unwrap().build().unwrap();
        assert!(charts[0].find_state("anon.UNKNOWN1").is_some());
    }

    #[test]
    fn test_empty_document_rejected() {
        let doc = ChartDocument::parse("", Format::Toml).unwrap();
        assert!(doc.build().is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.toml")), Format::Toml);
    }
}
