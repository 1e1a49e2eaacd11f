use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// Column holding the country code.
pub const ISO_COLUMN: &str = "ISO";
/// Column holding the disaster category label.
pub const DISASTER_TYPE_COLUMN: &str = "Disaster Type";
/// Column holding the year the event started.
pub const START_YEAR_COLUMN: &str = "Start Year";

// ---------------------------------------------------------------------------
// CellValue – a single cell of a pass-through column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a dataframe reader infers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a calendar year.
    ///
    /// Integers, integral floats (`2001.0`, as written by dataframe exporters)
    /// and numeric strings qualify; anything else is treated as absent so a
    /// missing year can never collide with a real one.
    pub fn as_year(&self) -> Option<i32> {
        match self {
            CellValue::Integer(i) => i32::try_from(*i).ok(),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                let rounded = *v as i64;
                i32::try_from(rounded).ok()
            }
            CellValue::String(s) => {
                let s = s.trim();
                s.parse::<i32>()
                    .ok()
                    .or_else(|| CellValue::Float(s.parse::<f64>().ok()?).as_year())
            }
            _ => None,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            CellValue::String(s) => s,
            other => other.to_string(),
        }
    }
}

impl From<&JsonValue> for CellValue {
    fn from(val: &JsonValue) -> Self {
        match val {
            JsonValue::String(s) => CellValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::String(n.to_string())
                }
            }
            JsonValue::Bool(b) => CellValue::Bool(*b),
            JsonValue::Null => CellValue::Null,
            other => CellValue::String(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// DisasterRecord – one row of the events table
// ---------------------------------------------------------------------------

/// One disaster event. The three filter keys are typed; every other column is
/// carried verbatim in `attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct DisasterRecord {
    pub iso: String,
    pub disaster_type: String,
    /// `None` when the source cell was empty or not a whole number.
    pub start_year: Option<i32>,
    /// Pass-through columns: column_name → value.
    pub attributes: BTreeMap<String, CellValue>,
}

impl DisasterRecord {
    /// Split a parsed row into the typed keys and the attribute bag.
    ///
    /// Fails with the name of the first required column the row lacks.
    pub fn from_cells(mut cells: BTreeMap<String, CellValue>) -> Result<Self, &'static str> {
        let iso = cells.remove(ISO_COLUMN).ok_or(ISO_COLUMN)?.into_text();
        let disaster_type = cells
            .remove(DISASTER_TYPE_COLUMN)
            .ok_or(DISASTER_TYPE_COLUMN)?
            .into_text();
        let start_year = cells
            .remove(START_YEAR_COLUMN)
            .ok_or(START_YEAR_COLUMN)?
            .as_year();

        Ok(DisasterRecord {
            iso,
            disaster_type,
            start_year,
            attributes: cells,
        })
    }
}

impl Serialize for DisasterRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 3))?;
        map.serialize_entry(ISO_COLUMN, &self.iso)?;
        map.serialize_entry(DISASTER_TYPE_COLUMN, &self.disaster_type)?;
        map.serialize_entry(START_YEAR_COLUMN, &self.start_year)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// One GeoJSON feature. Geometry and properties are opaque payloads.
///
/// Members are re-emitted exactly as read: an absent member stays absent and
/// an explicit `null` stays `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<JsonValue>,
    /// Country code; only string ids take part in lookups.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<JsonValue>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub geometry: Option<JsonValue>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub properties: Option<JsonValue>,
    /// Any other members (`bbox`, foreign members) kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// A member that appears in the document, `null` included.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<JsonValue>, D::Error> {
    JsonValue::deserialize(deserializer).map(Some)
}

impl GeoFeature {
    pub fn country_code(&self) -> Option<&str> {
        self.id.as_ref().and_then(JsonValue::as_str)
    }
}

/// The loaded boundary dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoCollection {
    pub features: Vec<GeoFeature>,
}

/// A FeatureCollection built per query, borrowing features from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<&'a GeoFeature>,
}

impl<'a> FeatureCollection<'a> {
    pub fn new(features: Vec<&'a GeoFeature>) -> Self {
        FeatureCollection {
            kind: "FeatureCollection",
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pairs: &[(&str, CellValue)]) -> BTreeMap<String, CellValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn year_from_integral_values() {
        assert_eq!(CellValue::Integer(2001).as_year(), Some(2001));
        assert_eq!(CellValue::Float(1999.0).as_year(), Some(1999));
        assert_eq!(CellValue::String(" 2010 ".into()).as_year(), Some(2010));
        assert_eq!(CellValue::String("2010.0".into()).as_year(), Some(2010));
    }

    #[test]
    fn year_absent_for_non_numeric_or_fractional() {
        assert_eq!(CellValue::Null.as_year(), None);
        assert_eq!(CellValue::String(String::new()).as_year(), None);
        assert_eq!(CellValue::String("unknown".into()).as_year(), None);
        assert_eq!(CellValue::Float(2001.5).as_year(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_year(), None);
        assert_eq!(CellValue::Integer(i64::MAX).as_year(), None);
    }

    #[test]
    fn from_cells_splits_keys_and_attributes() {
        let record = DisasterRecord::from_cells(cells(&[
            ("ISO", CellValue::String("FRA".into())),
            ("Disaster Type", CellValue::String("Flood".into())),
            ("Start Year", CellValue::Integer(2001)),
            ("Total Deaths", CellValue::Integer(12)),
        ]))
        .unwrap();

        assert_eq!(record.iso, "FRA");
        assert_eq!(record.disaster_type, "Flood");
        assert_eq!(record.start_year, Some(2001));
        assert_eq!(record.attributes.len(), 1);
        assert_eq!(record.attributes["Total Deaths"], CellValue::Integer(12));
    }

    #[test]
    fn from_cells_reports_missing_column() {
        let err = DisasterRecord::from_cells(cells(&[
            ("ISO", CellValue::String("FRA".into())),
            ("Start Year", CellValue::Integer(2001)),
        ]))
        .unwrap_err();
        assert_eq!(err, DISASTER_TYPE_COLUMN);
    }

    #[test]
    fn record_serializes_flat_with_null_year() {
        let record = DisasterRecord {
            iso: "FRA".into(),
            disaster_type: "Storm".into(),
            start_year: None,
            attributes: cells(&[("Event Name", CellValue::String("Lothar".into()))]),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ISO": "FRA",
                "Disaster Type": "Storm",
                "Start Year": null,
                "Event Name": "Lothar",
            })
        );
    }

    #[test]
    fn feature_keeps_unknown_members() {
        let feature: GeoFeature = serde_json::from_value(serde_json::json!({
            "type": "Feature",
            "id": "FRA",
            "bbox": [1, 2, 3, 4],
            "properties": {"name": "France"},
            "geometry": {"type": "Point", "coordinates": [2.0, 46.0]},
        }))
        .unwrap();
        assert_eq!(feature.country_code(), Some("FRA"));
        assert!(feature.extra.contains_key("bbox"));

        assert_eq!(
            serde_json::to_value(&feature).unwrap()["bbox"],
            serde_json::json!([1, 2, 3, 4])
        );

        let numeric: GeoFeature =
            serde_json::from_value(serde_json::json!({"type": "Feature", "id": 250})).unwrap();
        assert_eq!(numeric.country_code(), None);
    }

    #[test]
    fn feature_round_trips_absent_and_null_members() {
        let source = serde_json::json!({"id": "FRA", "geometry": null});
        let feature: GeoFeature = serde_json::from_value(source.clone()).unwrap();
        assert_eq!(feature.geometry, Some(JsonValue::Null));
        assert_eq!(feature.properties, None);
        assert_eq!(serde_json::to_value(&feature).unwrap(), source);
    }
}
