//! Seed command implementation.

use super::error::Result;
use chrono::{DateTime, Utc};
use purr::storage::DynamoDbRepository;
use purr_core::records::{prepare_records, PreparedRecords};
use purr_core::resource::ResourceKind;
use purr_core::storage::RecordRepository;
use serde_json::{json, Value};

const LOG_TYPES: [(&str, &str); 6] = [
    ("GR", "Gamma Ray"),
    ("SP", "Spontaneous Potential"),
    ("RES", "Deep Induction Resistivity"),
    ("NEU", "Compensated Neutron Porosity"),
    ("DEN", "Bulk Density"),
    ("SON", "Borehole Compensated Sonic"),
];

const COUNTIES: [&str; 4] = ["Barton", "Ellis", "Russell", "Stafford"];

/// Generate `count` demo raster records for wells under the uwi prefix `area`.
///
/// Each well gets one raster per log type until `count` rasters exist.
pub fn generate_seed_rasters(area: &str, count: u32) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let well = i / LOG_TYPES.len() as u32;
            let (code, description) = LOG_TYPES[i as usize % LOG_TYPES.len()];
            let uwi = format!("{area}-{well:05}");
            let county = COUNTIES[well as usize % COUNTIES.len()];
            json!({
                "sk": format!("rasters/{uwi}/{code}.tif"),
                "uwi": uwi,
                "county": county,
                "calib_log_description": description,
                "calib_log_description_lc": description.to_lowercase(),
                "wordz": format!("{county} {code} {description}").to_lowercase(),
            })
        })
        .collect()
}

/// Stamps keys and timestamps the way the API does on create.
pub fn prepare_seed(rasters: Vec<Value>, now: DateTime<Utc>) -> Result<PreparedRecords> {
    Ok(prepare_records(
        ResourceKind::Raster,
        &Value::Array(rasters),
        now,
    )?)
}

/// Insert rasters into the records table in batches.
pub async fn seed_rasters(
    repository: &DynamoDbRepository,
    prepared: &PreparedRecords,
) -> Result<usize> {
    repository.put_records(&prepared.items).await?;
    Ok(prepared.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_generates_unique_sort_keys() {
        let rasters = generate_seed_rasters("15-009", 40);
        let keys: HashSet<&str> = rasters.iter().filter_map(|r| r["sk"].as_str()).collect();
        assert_eq!(keys.len(), 40);
    }

    #[test]
    fn test_wells_share_the_area_prefix() {
        let rasters = generate_seed_rasters("15-009", 13);
        assert_eq!(rasters[0]["uwi"], "15-009-00000");
        assert_eq!(rasters[6]["uwi"], "15-009-00001");
        assert_eq!(rasters[12]["uwi"], "15-009-00002");
        assert!(rasters
            .iter()
            .all(|r| r["uwi"].as_str().is_some_and(|u| u.starts_with("15-009"))));
    }

    #[test]
    fn test_description_index_attribute_is_lower_case() {
        let rasters = generate_seed_rasters("A", 2);
        assert_eq!(rasters[0]["calib_log_description_lc"], "gamma ray");
        assert_eq!(rasters[1]["calib_log_description_lc"], "spontaneous potential");
    }

    #[test]
    fn test_prepare_stamps_partition_and_timestamps() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let prepared = prepare_seed(generate_seed_rasters("A", 3), now).unwrap();

        assert_eq!(prepared.count(), 3);
        assert!(prepared
            .echo
            .iter()
            .all(|r| r["pk"] == "RASTER" && r["created_at"] == "2024-05-01T12:00:00.000Z"));
    }
}
