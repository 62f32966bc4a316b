//! A to-do record service: validation and state-transition rules over an
//! injected record store, exposed through an axum HTTP surface.

pub mod adapters;
pub mod config;
pub mod core;
pub mod storage;

#[cfg(test)]
mod tests;
