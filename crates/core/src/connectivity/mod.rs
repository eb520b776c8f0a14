//! Connectivity ports

pub mod ports;
