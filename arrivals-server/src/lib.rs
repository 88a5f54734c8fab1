//! Transit arrivals board server.
//!
//! Polls the BusNearby API for upcoming bus, light-rail and train
//! arrivals at configured stops and exposes the results as read-only
//! sensor values over a local HTTP interface.

pub mod busnearby;
pub mod coordinator;
pub mod directory;
pub mod domain;
pub mod sensor;
pub mod web;
