//! Cross-subsystem flows, driven through the node runtime.

#[cfg(test)]
mod bridge_stub;
#[cfg(test)]
mod checkpoint_flows;
#[cfg(test)]
mod state_sync_flows;
