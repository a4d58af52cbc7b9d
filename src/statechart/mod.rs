//! Statechart module - The model consumed and annotated by the compiler

pub mod builder;
pub mod document;
pub mod model;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export key types
pub use builder::ChartBuilder;
pub use document::{ChartDocument, load_charts};
pub use model::{
    History, Region, RegionRef, State, StateChart, StateKind, StateRef, Transition,
    TransitionKind, TransitionRef,
};
