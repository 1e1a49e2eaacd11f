use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Read-only query service over disaster events and country boundaries.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Disaster events table (.csv, .json or .parquet).
    #[arg(long = "data", env = "DISASTER_ATLAS_DATA", default_value = "public/data.csv")]
    pub data_path: PathBuf,

    /// Country boundaries as a GeoJSON FeatureCollection.
    #[arg(
        long = "geojson",
        env = "DISASTER_ATLAS_GEOJSON",
        default_value = "public/geojson/countries.geo.json"
    )]
    pub geojson_path: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "DISASTER_ATLAS_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,
}
