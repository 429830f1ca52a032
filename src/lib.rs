pub mod firewall;
pub mod net;
pub mod queue;
pub mod sim;
pub mod telemetry;
pub mod topo;
pub mod traffic;

#[cfg(test)]
mod test;
