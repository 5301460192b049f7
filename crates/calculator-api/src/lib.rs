//! HTTP service exposing the resource calculator

pub mod api;
pub mod config;
