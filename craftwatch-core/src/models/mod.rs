// File: src/models/mod.rs

pub mod endpoint;
pub mod status;

pub use endpoint::{EndpointSpec, PopulationSemantics};
pub use status::{
    AggregateTotals, ColorState, DisplayPayload, ProbeResult, StatusSummary,
};
