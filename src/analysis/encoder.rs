//! State-vector encoder
//!
//! Every region that can be active gets one slot in a flat vector holding
//! the id of its active child (0 when the region is inactive). Only one
//! child of a region is active at a time, so the child regions of sibling
//! states reuse the same slots; the regions of one orthogonal state run
//! together and get disjoint ranges.
//!
//! Encoding runs in three passes over the tree:
//! 1. numbering: chart-wide ids, simple states of a region before its
//!    composite states, each composite followed immediately by its subtree;
//! 2. sizing: a region needs one slot plus the widest of its states, and a
//!    state is as wide as all of its regions together;
//! 3. placement: child regions of a state follow the parent region's slot,
//!    laid out one after another.
//!
//! History pseudostates get their slots after the configuration slots.

use crate::config::SlotWidth;
use crate::statechart::{History, RegionRef, StateChart, StateKind, StateRef};
use crate::{Error, Result, structural_error, unsupported_error};

/// Per-run encoding state; dropped once the chart is annotated
struct EncodingContext {
    width: SlotWidth,
    next_id: u32,
}

/// Assign ids, widths and offsets to an unencoded chart
pub fn encode(chart: &mut StateChart, width: SlotWidth) -> Result<()> {
    if chart.encoded {
        return Err(structural_error!("chart '{}' is already encoded", chart.name));
    }
    let top = chart.top_region()?;
    let root = chart.root;

    let mut ctx = EncodingContext { width, next_id: 1 };
    {
        let state = chart.state_mut(root);
        state.id = 0;
        state.shallow_id = 0;
    }
    number_region(chart, &mut ctx, top)?;

    let width_top = size_region(chart, top);
    chart.state_mut(root).nslot = width_top;
    place_region(chart, top, 0);

    let mut nslot = width_top;
    let history_regions: Vec<RegionRef> = chart
        .region_refs()
        .filter(|&r| chart.region(r).history.is_some())
        .collect();
    for region in history_regions {
        let r = chart.region_mut(region);
        match r.history {
            Some(History::Shallow) => {
                r.shist = Some(nslot);
                nslot += 1;
            }
            Some(History::Deep) => {
                r.dhist = Some(nslot);
                nslot += r.nslot;
            }
            None => {}
        }
    }

    chart.nslot = nslot;
    chart.maxid = ctx.next_id - 1;
    if chart.maxid as usize > width.limit() {
        return Err(Error::EncodingOverflow {
            region: chart.name.clone(),
            count: chart.maxid as usize,
            limit: width.limit(),
        });
    }
    chart.encoded = true;

    tracing::debug!(
        "Encoded chart '{}': {} slot(s), max id {}",
        chart.name,
        chart.nslot,
        chart.maxid
    );
    Ok(())
}

fn number_region(chart: &mut StateChart, ctx: &mut EncodingContext, region: RegionRef) -> Result<()> {
    let states = chart.region(region).states.clone();
    if states.len() > ctx.width.limit() {
        return Err(Error::EncodingOverflow {
            region: chart.region(region).long_name.clone(),
            count: states.len(),
            limit: ctx.width.limit(),
        });
    }

    let mut shallow_id = 0;
    let (simple, composite): (Vec<StateRef>, Vec<StateRef>) =
        states.into_iter().partition(|&s| chart.kind(s) == StateKind::Simple);

    for state in simple {
        shallow_id += 1;
        assign_id(chart, ctx, state, shallow_id);
    }

    for state in composite {
        shallow_id += 1;
        assign_id(chart, ctx, state, shallow_id);
        match chart.kind(state) {
            StateKind::Composite | StateKind::Orthogonal => {
                for child in chart.state(state).regions.clone() {
                    number_region(chart, ctx, child)?;
                }
            }
            StateKind::Submachine => {
                return Err(unsupported_error!(
                    "submachine state '{}' cannot be encoded",
                    chart.state(state).long_name
                ));
            }
            StateKind::Simple => unreachable!("simple states are numbered first"),
        }
    }
    Ok(())
}

fn assign_id(chart: &mut StateChart, ctx: &mut EncodingContext, state: StateRef, shallow_id: u32) {
    let s = chart.state_mut(state);
    s.id = ctx.next_id;
    s.shallow_id = shallow_id;
    ctx.next_id += 1;
    tracing::trace!("state {} -> id {}", s.long_name, s.id);
}

/// Width of a region's subtree; records region and state widths on the way
fn size_region(chart: &mut StateChart, region: RegionRef) -> usize {
    let mut widest = 0;
    for state in chart.region(region).states.clone() {
        let mut width = 0;
        for child in chart.state(state).regions.clone() {
            width += size_region(chart, child);
        }
        chart.state_mut(state).nslot = width;
        widest = widest.max(width);
    }
    let nslot = 1 + widest;
    chart.region_mut(region).nslot = nslot;
    nslot
}

fn place_region(chart: &mut StateChart, region: RegionRef, offset: usize) {
    chart.region_mut(region).offset = offset;
    tracing::debug!(
        "region {} at offset {} ({} slot(s))",
        chart.region(region).long_name,
        offset,
        chart.region(region).nslot
    );
    for state in chart.region(region).states.clone() {
        let mut next = offset + 1;
        for child in chart.state(state).regions.clone() {
            place_region(chart, child, next);
            next += chart.region(child).nslot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statechart::{ChartBuilder, fixtures};

    fn encoded(mut chart: StateChart) -> StateChart {
        encode(&mut chart, SlotWidth::U8).unwrap();
        chart
    }

    fn id(chart: &StateChart, name: &str) -> u32 {
        chart.state(chart.find_state_by_name(name).unwrap()).id
    }

    #[test]
    fn test_flat_encoding() {
        let chart = encoded(fixtures::flat());
        assert_eq!(chart.nslot, 1);
        assert_eq!(chart.maxid, 2);
        assert_eq!(id(&chart, "A"), 1);
        assert_eq!(id(&chart, "B"), 2);
        assert_eq!(chart.state(chart.root).id, 0);
    }

    #[test]
    fn test_simple_states_numbered_before_composites() {
        let chart = encoded(fixtures::nested());
        assert_eq!(id(&chart, "F"), 1);
        assert_eq!(id(&chart, "S"), 2);
        assert_eq!(id(&chart, "S1"), 3);
        assert_eq!(id(&chart, "S2"), 4);
        let s = chart.find_state_by_name("S").unwrap();
        assert_eq!(chart.state(s).shallow_id, 2);
        assert_eq!(chart.state(s).index, 0);
        assert_eq!(chart.nslot, 2);
        let inner = chart.state(s).regions[0];
        assert_eq!(chart.region(inner).offset, 1);
    }

    #[test]
    fn test_orthogonal_widths_and_offsets() {
        let chart = encoded(fixtures::orthogonal());
        let o = chart.find_state_by_name("O").unwrap();
        let regions = chart.state(o).regions.clone();
        let (r1, r2) = (regions[0], regions[1]);

        assert_eq!(chart.region(r1).nslot, 1);
        assert_eq!(chart.region(r2).nslot, 2);
        assert_eq!(
            chart.state(o).nslot,
            chart.region(r1).nslot + chart.region(r2).nslot
        );
        assert_eq!(chart.nslot, 4);

        assert_eq!(chart.region(r1).offset, 1);
        assert_eq!(chart.region(r2).offset, 2);
        let c2 = chart.find_state_by_name("C2").unwrap();
        assert_eq!(chart.region(chart.state(c2).regions[0]).offset, 3);

        // Sibling ranges never overlap
        let end1 = chart.region(r1).offset + chart.region(r1).nslot;
        assert!(end1 <= chart.region(r2).offset);
    }

    #[test]
    fn test_ids_unique_and_increasing_in_visit_order() {
        let chart = encoded(fixtures::orthogonal());
        let order = ["Idle", "O", "A1", "B1", "A2", "C2", "C21", "C22"];
        let ids: Vec<u32> = order.iter().map(|n| id(&chart, n)).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(chart.maxid, 8);
    }

    #[test]
    fn test_reencoding_rejected() {
        let mut chart = encoded(fixtures::flat());
        assert!(encode(&mut chart, SlotWidth::U8).is_err());
    }

    #[test]
    fn test_region_overflow() {
        let mut b = ChartBuilder::new("wide");
        let top = b.top_region();
        let first = b.state(top, "S0");
        for i in 1..256 {
            b.state(top, format!("S{}", i));
        }
        b.initial(top, first).unwrap();
        let mut chart = b.build();
        let err = encode(&mut chart, SlotWidth::U8).unwrap_err();
        assert!(matches!(err, Error::EncodingOverflow { count: 256, limit: 255, .. }));

        encode(&mut chart, SlotWidth::U16).unwrap();
        assert_eq!(chart.maxid, 256);
    }

    #[test]
    fn test_submachine_unsupported() {
        let mut b = ChartBuilder::new("sub");
        let top = b.top_region();
        let s = b.state(top, "S");
        b.submachine(s, "Other");
        b.initial(top, s).unwrap();
        let mut chart = b.build();
        let err = encode(&mut chart, SlotWidth::U8).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct(_)));
    }

    #[test]
    fn test_history_slots_follow_configuration() {
        let mut b = ChartBuilder::new("hist");
        let top = b.top_region();
        let s = b.state(top, "S");
        let inner = b.region(s);
        let s1 = b.state(inner, "S1");
        b.initial(top, s).unwrap();
        b.initial(inner, s1).unwrap();
        b.history(inner, History::Shallow);
        let chart = encoded(b.build());
        assert_eq!(chart.region(inner).shist, Some(2));
        assert_eq!(chart.nslot, 3);
    }
}
