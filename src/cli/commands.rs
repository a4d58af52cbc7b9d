//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::analysis::{Compilation, Diagnostic, compile};
use crate::statechart::load_charts;
use crate::{Config, Result};
use std::path::{Path, PathBuf};

/// Load a document and compile every chart in it, stopping at the first fatal error
fn compile_document(input: &Path, config: &Config) -> Result<Vec<Compilation>> {
    tracing::info!("Loading charts from {:?}", input);
    let charts = load_charts(input)?;
    tracing::info!("Found {} chart(s)", charts.len());

    charts
        .into_iter()
        .map(|chart| compile(chart, &config.encoding))
        .collect()
}

fn report_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

/// Compile command implementation
pub mod compile {
    use super::*;
    use crate::backend::BackendKind;

    /// Execute the compile command
    pub fn execute(
        input: PathBuf,
        backend: BackendKind,
        output: Option<PathBuf>,
        config: &Config,
    ) -> Result<()> {
        let units = compile_document(&input, config)?;

        let backend = backend.create(config);
        tracing::info!("Rendering {} chart(s) with the {} backend", units.len(), backend.name());
        let rendered = backend.render(&units)?;

        report_diagnostics(units.iter().flat_map(|u| u.diagnostics.iter()));
        report_diagnostics(&rendered.diagnostics);

        match output {
            Some(path) => {
                std::fs::write(&path, &rendered.text)?;
                tracing::info!("Wrote {} byte(s) to {:?}", rendered.text.len(), path);
            }
            None => print!("{}", rendered.text),
        }
        Ok(())
    }
}

/// Analyze command implementation
pub mod analyze {
    use super::*;
    use crate::cli::OutputFormat;

    /// Execute the analyze command
    pub fn execute(input: PathBuf, format: OutputFormat, config: &Config) -> Result<()> {
        let units = compile_document(&input, config)?;

        match format {
            OutputFormat::Json => crate::cli::output::output_json(&mut std::io::stdout(), &units)?,
            OutputFormat::Table => {
                crate::cli::output::output_table(&mut std::io::stdout(), &units)?
            }
        }
        Ok(())
    }
}

/// Check command implementation
pub mod check {
    use super::*;
    use crate::analysis::Severity;

    /// Execute the check command
    pub fn execute(input: PathBuf, config: &Config) -> Result<()> {
        tracing::info!("Checking document: {:?}", input);

        let charts = match load_charts(&input) {
            Ok(charts) => charts,
            Err(e) => {
                eprintln!("❌ Failed to load document: {}", e);
                return Err(e);
            }
        };

        println!("📋 Statechart Check Report");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("File: {:?}", input);
        println!();

        let mut failed = 0;
        for chart in charts {
            let name = chart.name.clone();
            let states = chart.state_count() - 1;
            println!("Chart: {}", name);
            println!("  States: {}", states);

            match compile(chart, &config.encoding) {
                Ok(unit) => {
                    println!("  Slots: {}", unit.chart.nslot);
                    println!("  Max id: {}", unit.chart.maxid);
                    let warnings = unit
                        .diagnostics
                        .iter()
                        .filter(|d| d.severity == Severity::Warning)
                        .count();
                    if !unit.diagnostics.is_empty() {
                        println!("  ⚠️  Diagnostics ({} warning(s)):", warnings);
                        for diagnostic in &unit.diagnostics {
                            println!("     {}: {}", diagnostic.severity.name(), diagnostic.message);
                        }
                    }
                }
                Err(e) => {
                    failed += 1;
                    println!("  ❌ {}", e);
                }
            }
            println!();
        }

        if failed == 0 {
            println!("✅ All charts compile!");
            Ok(())
        } else {
            println!("❌ {} chart(s) failed to compile", failed);
            Err(crate::Error::custom("Check failed"))
        }
    }
}
