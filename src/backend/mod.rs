//! Backends - Text renderers over compiled charts
//!
//! A backend never changes the analysis it is given. Constructs it cannot
//! express are emitted as comments and reported in [`Rendered::diagnostics`].

pub mod c;
pub mod promela;

pub use c::CBackend;
pub use promela::PromelaBackend;

use crate::Result;
use crate::analysis::{Compilation, Diagnostic};
use crate::config::Config;
use regex::Regex;
use std::sync::LazyLock;

/// Rendered source text plus whatever the backend had to leave out
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Render every compiled chart into one output
    fn render(&self, units: &[Compilation]) -> Result<Rendered>;
}

/// Backend selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Switch-based C dispatcher
    C,
    /// Promela process for SPIN
    Promela,
}

impl BackendKind {
    pub fn create(&self, config: &Config) -> Box<dyn Backend> {
        match self {
            BackendKind::C => Box::new(CBackend::new(
                config.c.clone(),
                config.encoding.slot_width,
            )),
            BackendKind::Promela => Box::new(PromelaBackend::new(config.promela.clone())),
        }
    }
}

static INDEX_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("valid index pattern"));

/// Canonical identifier for a long name: `a.b[2]` becomes `a_b_2`
pub fn cname(long_name: &str) -> String {
    INDEX_SUFFIX
        .replace_all(long_name, "_$1")
        .replace(['.', ' ', '-'], "_")
}

/// State constant name
pub fn stname(long_name: &str) -> String {
    format!("ST_{}", cname(long_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cname() {
        assert_eq!(cname("door.Open.Ajar"), "door_Open_Ajar");
        assert_eq!(cname("m.O[2].Y"), "m_O_2_Y");
        assert_eq!(cname("my chart-1"), "my_chart_1");
        assert_eq!(stname("flat.A"), "ST_flat_A");
    }

    #[test]
    fn test_demo_document_renders_with_both_backends() {
        use crate::analysis::compile;
        use crate::statechart::{ChartDocument, document::Format};

        let doc = ChartDocument::parse(include_str!("../../demos/door.toml"), Format::Toml).unwrap();
        let config = Config::default();
        let units: Vec<Compilation> = doc
            .build()
            .unwrap()
            .into_iter()
            .map(|chart| compile(chart, &config.encoding).unwrap())
            .collect();

        let c = BackendKind::C.create(&config).render(&units).unwrap();
        assert!(c.text.contains("door_exec("));
        assert!(c.text.contains("if (unlocked) {"));

        let pml = BackendKind::Promela.create(&config).render(&units).unwrap();
        assert!(pml.text.starts_with("mtype = { _NONE, push, slam };"));
        assert!(pml.text.contains("st = ST_door_Open_Ajar"));
    }

    #[test]
    fn test_backend_kind() {
        let config = Config::default();
        assert_eq!(BackendKind::C.create(&config).name(), "c");
        assert_eq!(BackendKind::Promela.create(&config).name(), "promela");
    }
}
