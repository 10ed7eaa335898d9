//! Cross-contract flows on a four-organisation network.

pub mod emissions_flows;
pub mod supply_chain_flows;
pub mod telemetry_flows;
