use std::collections::BTreeSet;

use super::model::{DisasterRecord, FeatureCollection};
use super::store::{DatasetSource, Unavailable};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Exact-match criteria for a disaster lookup. Comparisons are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisasterFilter<'a> {
    pub country: &'a str,
    /// Any integer is accepted; years outside the stored range simply match nothing.
    pub year: i64,
    pub disaster_type: &'a str,
}

impl DisasterFilter<'_> {
    /// A record passes only when all three keys match; a missing year never does.
    pub fn matches(&self, record: &DisasterRecord) -> bool {
        record.iso == self.country
            && record.start_year.map(i64::from) == Some(self.year)
            && record.disaster_type == self.disaster_type
    }
}

/// Outcome of [`find_disasters`]. Zero matches is a result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Matches<'a> {
    Found(Vec<&'a DisasterRecord>),
    NoMatches,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Distinct start years, ascending, of events for a country and disaster type.
pub fn available_years<S>(
    source: &S,
    country: &str,
    disaster_type: &str,
) -> Result<Vec<i32>, Unavailable>
where
    S: DatasetSource + ?Sized,
{
    let years: BTreeSet<i32> = source
        .records()?
        .iter()
        .filter(|r| r.iso == country && r.disaster_type == disaster_type)
        .filter_map(|r| r.start_year)
        .collect();
    Ok(years.into_iter().collect())
}

/// Events matching all of `filter`, in load order.
pub fn find_disasters<'a, S>(
    source: &'a S,
    filter: &DisasterFilter<'_>,
) -> Result<Matches<'a>, Unavailable>
where
    S: DatasetSource + ?Sized,
{
    let found: Vec<&DisasterRecord> = source
        .records()?
        .iter()
        .filter(|r| filter.matches(r))
        .collect();

    if found.is_empty() {
        Ok(Matches::NoMatches)
    } else {
        Ok(Matches::Found(found))
    }
}

/// Boundary features for a country code, matched after uppercasing the input.
///
/// Feature ids are expected to be uppercase already. Duplicate ids are all
/// returned.
pub fn geometry_for<'a, S>(source: &'a S, country_code: &str) -> Result<FeatureCollection<'a>, Unavailable>
where
    S: DatasetSource + ?Sized,
{
    let code = country_code.to_uppercase();
    let features = source
        .features()?
        .iter()
        .filter(|f| f.country_code() == Some(code.as_str()))
        .collect();
    Ok(FeatureCollection::new(features))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::data::model::{CellValue, GeoCollection, GeoFeature};
    use crate::data::store::DatasetStore;

    pub(crate) fn record(iso: &str, kind: &str, year: Option<i32>, name: &str) -> DisasterRecord {
        let mut attributes = BTreeMap::new();
        attributes.insert("Event Name".to_string(), CellValue::String(name.to_string()));
        DisasterRecord {
            iso: iso.to_string(),
            disaster_type: kind.to_string(),
            start_year: year,
            attributes,
        }
    }

    pub(crate) fn feature(id: &str) -> GeoFeature {
        serde_json::from_value(json!({
            "type": "Feature",
            "id": id,
            "properties": {"name": id},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]},
        }))
        .unwrap()
    }

    pub(crate) fn sample_store() -> DatasetStore {
        DatasetStore::new(
            vec![
                record("FRA", "Flood", Some(2001), "a"),
                record("FRA", "Flood", Some(1999), "b"),
                record("FRA", "Storm", Some(2001), "c"),
                record("FRA", "Flood", None, "d"),
                record("FRA", "Flood", Some(2001), "e"),
                record("fra", "Flood", Some(1980), "f"),
                record("DEU", "Flood", Some(2002), "g"),
            ],
            GeoCollection {
                features: vec![feature("FRA"), feature("DEU"), feature("ITA")],
            },
        )
    }

    #[test]
    fn years_are_sorted_unique_and_skip_missing() {
        let store = sample_store();
        assert_eq!(
            available_years(&store, "FRA", "Flood").unwrap(),
            vec![1999, 2001]
        );
    }

    #[test]
    fn years_match_country_case_sensitively() {
        let store = sample_store();
        assert_eq!(available_years(&store, "fra", "Flood").unwrap(), vec![1980]);
        assert!(available_years(&store, "FRA", "flood").unwrap().is_empty());
    }

    #[test]
    fn years_empty_when_nothing_matches() {
        let store = sample_store();
        assert!(available_years(&store, "JPN", "Earthquake").unwrap().is_empty());
    }

    #[test]
    fn every_year_has_a_backing_record() {
        let store = sample_store();
        let records = store.records().unwrap();
        for (country, kind) in [("FRA", "Flood"), ("FRA", "Storm"), ("DEU", "Flood")] {
            let years = available_years(&store, country, kind).unwrap();
            assert!(years.windows(2).all(|w| w[0] < w[1]));
            for year in years {
                assert!(records.iter().any(|r| r.iso == country
                    && r.disaster_type == kind
                    && r.start_year == Some(year)));
            }
        }
    }

    #[test]
    fn disasters_returned_in_load_order() {
        let store = sample_store();
        let filter = DisasterFilter {
            country: "FRA",
            year: 2001,
            disaster_type: "Flood",
        };
        let Matches::Found(found) = find_disasters(&store, &filter).unwrap() else {
            panic!("expected matches");
        };
        let names: Vec<_> = found
            .iter()
            .map(|r| r.attributes["Event Name"].to_string())
            .collect();
        assert_eq!(names, vec!["a", "e"]);
    }

    #[test]
    fn disasters_with_no_match_report_no_matches() {
        let store = sample_store();
        let filter = DisasterFilter {
            country: "FRA",
            year: 2020,
            disaster_type: "Flood",
        };
        assert_eq!(find_disasters(&store, &filter).unwrap(), Matches::NoMatches);
    }

    #[test]
    fn disasters_with_year_beyond_stored_range_match_nothing() {
        let store = sample_store();
        let filter = DisasterFilter {
            country: "FRA",
            year: 99_999_999_999,
            disaster_type: "Flood",
        };
        assert_eq!(find_disasters(&store, &filter).unwrap(), Matches::NoMatches);
    }

    #[test]
    fn geometry_lookup_normalizes_case_and_is_repeatable() {
        let store = sample_store();
        let lower = geometry_for(&store, "fra").unwrap();
        let upper = geometry_for(&store, "FRA").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(upper.features.len(), 1);
        assert_eq!(upper.features[0].country_code(), Some("FRA"));
        assert_eq!(geometry_for(&store, "FRA").unwrap(), upper);
    }

    #[test]
    fn geometry_keeps_duplicate_ids() {
        let store = DatasetStore::new(
            vec![],
            GeoCollection {
                features: vec![feature("FRA"), feature("FRA")],
            },
        );
        assert_eq!(geometry_for(&store, "fra").unwrap().features.len(), 2);
    }

    #[test]
    fn geometry_unknown_code_is_empty_collection() {
        let store = sample_store();
        let collection = geometry_for(&store, "XYZ").unwrap();
        assert!(collection.features.is_empty());
        assert_eq!(
            serde_json::to_value(&collection).unwrap(),
            json!({"type": "FeatureCollection", "features": []})
        );
    }

    #[test]
    fn unavailable_store_fails_every_query() {
        let store = DatasetStore::unavailable();
        let filter = DisasterFilter {
            country: "FRA",
            year: 2001,
            disaster_type: "Flood",
        };
        assert_eq!(
            available_years(&store, "FRA", "Flood"),
            Err(Unavailable::Records)
        );
        assert_eq!(
            find_disasters(&store, &filter),
            Err(Unavailable::Records)
        );
        assert_eq!(
            geometry_for(&store, "FRA").unwrap_err(),
            Unavailable::Geometry
        );
    }
}
