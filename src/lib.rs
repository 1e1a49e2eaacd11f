//! Disaster Atlas: a read-only query service over a disaster-events table
//! and a country-boundary FeatureCollection.

pub mod api;
pub mod config;
pub mod data;
