pub mod distribution;
pub mod p99;
pub mod percentiles;
pub mod simulator;
