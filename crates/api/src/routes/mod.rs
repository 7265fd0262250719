//! Route Handlers

pub mod iot_data;
pub mod readings;
