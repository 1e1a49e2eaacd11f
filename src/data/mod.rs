/// Data layer: core types, loading, the shared store, and queries.
///
/// Architecture:
/// ```text
///  data.csv / .json / .parquet     countries.geo.json
///        │                                │
///        ▼                                ▼
///   ┌──────────┐  parse file → Vec<DisasterRecord>, GeoCollection
///   │  loader  │
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ DatasetStore │  loaded once, read-only; a failed load = unavailable
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  query   │  exact-match predicates → years / records / features
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod query;
pub mod store;
