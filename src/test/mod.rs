mod scenarios;
mod sim_time;
mod simulator;
mod telemetry;
