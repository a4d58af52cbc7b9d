//! Hierarchy resolver
//!
//! Finds the deepest region containing two states. Transitions whose
//! endpoints sit in sibling regions of one orthogonal state have no such
//! region short of the orthogonal state's parent; they are rejected.

use crate::statechart::{RegionRef, StateChart, StateRef};
use crate::{Result, structural_error, unsupported_error};

/// Deepest region that is an ancestor of both `s1` and `s2`
pub fn lowest_common_region(chart: &StateChart, s1: StateRef, s2: StateRef) -> Result<RegionRef> {
    let mut s1 = s1;
    let mut s2 = s2;
    let level = |s: StateRef| chart.try_state(s).map(|state| state.level);

    while level(s1)? > level(s2)? {
        s1 = chart.step_up(s1)?;
    }
    while level(s2)? > level(s1)? {
        s2 = chart.step_up(s2)?;
    }

    let parent = |s: StateRef| {
        chart.try_state(s)?.parent.ok_or_else(|| {
            structural_error!("state '{}' has no parent region", chart.state(s).long_name)
        })
    };
    let mut r1 = parent(s1)?;
    let mut r2 = parent(s2)?;

    while r1 != r2 {
        let o1 = chart.owning_state(r1);
        let o2 = chart.owning_state(r2);
        match (o1, o2) {
            (Some(o1), Some(o2)) if o1 == o2 => {
                return Err(unsupported_error!(
                    "states '{}' and '{}' lie in different regions of orthogonal state '{}'",
                    chart.state(s1).long_name,
                    chart.state(s2).long_name,
                    chart.state(o1).long_name
                ));
            }
            (Some(o1), Some(o2)) => {
                r1 = parent(o1)?;
                r2 = parent(o2)?;
            }
            _ => {
                return Err(structural_error!(
                    "states '{}' and '{}' do not share a region in chart '{}'",
                    chart.state(s1).long_name,
                    chart.state(s2).long_name,
                    chart.name
                ));
            }
        }
    }
    Ok(r1)
}

/// True when `region` contains `state` at any depth
pub fn region_contains(chart: &StateChart, region: RegionRef, state: StateRef) -> bool {
    let mut current = chart.owning_region(state);
    while let Some(r) = current {
        if r == region {
            return true;
        }
        current = chart
            .owning_state(r)
            .and_then(|owner| chart.owning_region(owner));
    }
    false
}
