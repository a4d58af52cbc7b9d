//! Initial-configuration builder

use crate::statechart::{RegionRef, StateChart, StateRef};
use crate::{Result, structural_error};

/// Default configuration: each active region's slot holds its initial child's id
pub fn initial_vector(chart: &StateChart) -> Result<Vec<u32>> {
    if !chart.is_encoded() {
        return Err(structural_error!("chart '{}' has not been encoded", chart.name));
    }
    let mut vector = vec![0; chart.nslot];
    init_region(chart, chart.top_region()?, &mut vector)?;
    Ok(vector)
}

fn init_region(chart: &StateChart, region: RegionRef, vector: &mut [u32]) -> Result<()> {
    let state = default_child(chart, region)?;
    let offset = chart.region(region).offset;
    let slot = vector.get_mut(offset).ok_or_else(|| {
        structural_error!("region '{}' offset {} outside vector", chart.region(region).long_name, offset)
    })?;
    *slot = chart.state(state).id;
    for &child in &chart.state(state).regions {
        init_region(chart, child, vector)?;
    }
    Ok(())
}

pub fn default_child(chart: &StateChart, region: RegionRef) -> Result<StateRef> {
    chart.initial_state(region).ok_or_else(|| {
        structural_error!(
            "region '{}' has no valid initial state",
            chart.region(region).long_name
        )
    })
}

/// Leaf entered when `state` is the target: follow the first region's defaults down
pub fn default_leaf(chart: &StateChart, state: StateRef) -> Result<StateRef> {
    let mut current = state;
    while let Some(&region) = chart.state(current).regions.first() {
        current = default_child(chart, region)?;
    }
    Ok(current)
}

/// Leaf active in the initial configuration of the chart's first region chain
pub fn initial_leaf(chart: &StateChart) -> Result<StateRef> {
    default_leaf(chart, chart.root)
}
