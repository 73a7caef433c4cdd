pub mod errors;
pub mod models;
pub mod ports;
pub mod provisioning;
pub mod refresh;
pub mod service;
