//! Output formatting module
//!
//! This module handles formatting encoding reports for different output formats.

use crate::Result;
use crate::analysis::Compilation;
use crate::statechart::StateChart;
use serde_json::json;

fn offsets(chart: &StateChart) -> Vec<serde_json::Value> {
    chart
        .region_refs()
        .map(|r| {
            let region = chart.region(r);
            json!({
                "region": region.long_name,
                "offset": region.offset,
                "nslot": region.nslot,
                "history": region.history,
            })
        })
        .collect()
}

/// Output encoding reports as JSON
pub fn output_json(w: &mut impl std::io::Write, units: &[Compilation]) -> Result<()> {
    let output = json!({
        "summary": {
            "total_charts": units.len(),
            "total_diagnostics": units.iter().map(|u| u.diagnostics.len()).sum::<usize>(),
        },
        "charts": units.iter().map(|unit| {
            let chart = &unit.chart;
            json!({
                "name": chart.name,
                "nslot": chart.nslot,
                "maxid": chart.maxid,
                "initial": unit.initial,
                "states": chart.state_refs().filter(|&s| s != chart.root).map(|s| {
                    let state = chart.state(s);
                    json!({
                        "name": state.long_name,
                        "kind": chart.kind(s).name(),
                        "id": state.id,
                        "level": state.level,
                        "nslot": state.nslot,
                    })
                }).collect::<Vec<_>>(),
                "regions": offsets(chart),
                "diagnostics": unit.diagnostics,
            })
        }).collect::<Vec<_>>(),
    });

    serde_json::to_writer_pretty(&mut *w, &output)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

/// Output encoding reports as text table
pub fn output_table(w: &mut impl std::io::Write, units: &[Compilation]) -> Result<()> {
    writeln!(w, "Statechart Encoding - Analysis Results")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;

    for unit in units {
        let chart = &unit.chart;
        let initial: Vec<String> = unit.initial.iter().map(|v| v.to_string()).collect();

        writeln!(w, "Chart: {}", chart.name)?;
        writeln!(w, "  Vector slots: {}", chart.nslot)?;
        writeln!(w, "  Max id:       {}", chart.maxid)?;
        writeln!(w, "  Initial:      [{}]", initial.join(", "))?;
        writeln!(w)?;

        writeln!(w, "States:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(
            w,
            "{:<48} {:<12} {:>5} {:>6} {:>6}",
            "State", "Kind", "Id", "Level", "Width"
        )?;
        writeln!(w, "{:-<80}", "")?;
        for s in chart.state_refs().filter(|&s| s != chart.root) {
            let state = chart.state(s);
            writeln!(
                w,
                "{:<48} {:<12} {:>5} {:>6} {:>6}",
                state.long_name,
                chart.kind(s).name(),
                state.id,
                state.level,
                state.nslot
            )?;
        }
        writeln!(w)?;

        writeln!(w, "Regions:")?;
        writeln!(w, "{:-<80}", "")?;
        writeln!(w, "{:<48} {:>8} {:>8}", "Region", "Offset", "Slots")?;
        writeln!(w, "{:-<80}", "")?;
        for r in chart.region_refs() {
            let region = chart.region(r);
            writeln!(
                w,
                "{:<48} {:>8} {:>8}",
                region.long_name, region.offset, region.nslot
            )?;
        }
        writeln!(w)?;

        if !unit.diagnostics.is_empty() {
            writeln!(w, "Diagnostics:")?;
            for diagnostic in &unit.diagnostics {
                writeln!(w, "  {}", diagnostic)?;
            }
            writeln!(w)?;
        }
    }

    Ok(())
}
