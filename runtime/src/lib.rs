// Copyright 2026 Oil Price Sensor Contributors
// SPDX-License-Identifier: Apache-2.0

//! Heating-oil price sensor: scrape a regional price and publish it to a
//! Home Assistant hub.
//!
//! The pipeline is fetch ([`acquisition`]) → extract ([`extract`]) →
//! publish ([`publish`]), driven by [`pipeline::run`].

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod publish;
pub mod renderer;
pub mod types;

pub use error::{SensorError, SensorResult};
