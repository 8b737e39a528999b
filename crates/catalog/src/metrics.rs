use std::collections::BTreeMap;

use foundation::Year;
use serde::{Deserialize, Serialize};

/// Change metrics computed offline for one ROI (and optionally one year).
///
/// Every field is optional; absent fields render as placeholders.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deforestation_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_ha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_pixels: Option<u64>,
}

const RECORD_FIELDS: [&str; 3] = ["deforestation_percent", "area_ha", "changed_pixels"];

/// Metrics attached to one ROI. Catalogs carry either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RoiMetrics {
    PerYear(BTreeMap<Year, MetricsRecord>),
    Flat(MetricsRecord),
}

impl RoiMetrics {
    /// Classifies a raw metrics value.
    ///
    /// An object carrying any record field name is a flat record; any other
    /// object is a per-year map. Per-year entries that fail to parse are
    /// dropped. Returns `None` when nothing usable remains.
    pub fn from_value(roi: &str, value: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(map) = value else {
            tracing::warn!("metrics for {roi} is not an object, ignoring");
            return None;
        };

        if RECORD_FIELDS.iter().any(|f| map.contains_key(*f)) {
            return match serde_json::from_value(serde_json::Value::Object(map)) {
                Ok(record) => Some(RoiMetrics::Flat(record)),
                Err(err) => {
                    tracing::warn!("malformed metrics for {roi}: {err}");
                    None
                }
            };
        }

        let mut per_year = BTreeMap::new();
        for (year, raw) in map {
            match serde_json::from_value::<MetricsRecord>(raw) {
                Ok(record) => {
                    per_year.insert(Year::new(year), record);
                }
                Err(err) => tracing::warn!("malformed metrics for {roi}/{year}: {err}"),
            }
        }
        Some(RoiMetrics::PerYear(per_year))
    }

    /// Record for `year`. A flat record applies to every year.
    pub fn for_year(&self, year: &Year) -> Option<&MetricsRecord> {
        match self {
            RoiMetrics::PerYear(by_year) => by_year.get(year),
            RoiMetrics::Flat(record) => Some(record),
        }
    }
}

pub const NO_METRICS: &str = "No metrics available for this selection.";

/// Display strings for the metrics card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MetricsSummary {
    Available {
        deforestation: String,
        area_ha: String,
        changed_pixels: String,
    },
    Unavailable {
        message: String,
    },
}

impl MetricsSummary {
    pub fn from_record(record: Option<&MetricsRecord>) -> Self {
        let Some(record) = record else {
            return MetricsSummary::Unavailable {
                message: NO_METRICS.to_string(),
            };
        };
        let deforestation = match record.deforestation_percent {
            Some(p) if p.is_finite() => format!("{p:.2}%"),
            _ => "0.00%".to_string(),
        };
        let area_ha = match record.area_ha {
            Some(a) if a.is_finite() => {
                let rounded = a.round();
                let sign = if rounded < 0.0 { "-" } else { "" };
                format!("{sign}{}", group_thousands(rounded.abs() as u64))
            }
            _ => "N/A".to_string(),
        };
        let changed_pixels = match record.changed_pixels {
            Some(n) => group_thousands(n),
            None => "N/A".to_string(),
        };
        MetricsSummary::Available {
            deforestation,
            area_ha,
            changed_pixels,
        }
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn flat_record_is_detected_by_field_names() {
        let m = RoiMetrics::from_value("park", json!({"deforestation_percent": 1.5, "area_ha": null}))
            .unwrap();
        let expected = MetricsRecord {
            deforestation_percent: Some(1.5),
            area_ha: None,
            changed_pixels: None,
        };
        assert_eq!(m, RoiMetrics::Flat(expected.clone()));
        assert_eq!(m.for_year(&Year::from(1999)), Some(&expected));
    }

    #[test]
    fn per_year_map_drops_malformed_entries() {
        let m = RoiMetrics::from_value(
            "park",
            json!({
                "2019": {"changed_pixels": 120, "deforestation_percent": 2.0},
                "2020": "broken",
            }),
        )
        .unwrap();
        let RoiMetrics::PerYear(by_year) = &m else {
            panic!("expected per-year metrics");
        };
        assert_eq!(by_year.len(), 1);
        assert_eq!(
            m.for_year(&Year::from(2019)).and_then(|r| r.changed_pixels),
            Some(120)
        );
        assert_eq!(m.for_year(&Year::from(2020)), None);
    }

    #[test]
    fn non_object_metrics_are_ignored() {
        assert_eq!(RoiMetrics::from_value("park", json!([1, 2])), None);
        assert_eq!(
            RoiMetrics::from_value("park", json!({"changed_pixels": "many"})),
            None
        );
    }

    #[test]
    fn summary_formats_and_placeholders() {
        let full = MetricsRecord {
            deforestation_percent: Some(12.346),
            area_ha: Some(1_234_567.6),
            changed_pixels: Some(9_876_543),
        };
        assert_eq!(
            MetricsSummary::from_record(Some(&full)),
            MetricsSummary::Available {
                deforestation: "12.35%".to_string(),
                area_ha: "1,234,568".to_string(),
                changed_pixels: "9,876,543".to_string(),
            }
        );
        assert_eq!(
            MetricsSummary::from_record(Some(&MetricsRecord::default())),
            MetricsSummary::Available {
                deforestation: "0.00%".to_string(),
                area_ha: "N/A".to_string(),
                changed_pixels: "N/A".to_string(),
            }
        );
        assert_eq!(
            MetricsSummary::from_record(None),
            MetricsSummary::Unavailable {
                message: NO_METRICS.to_string()
            }
        );
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn large_counts_and_negative_areas_keep_their_sign() {
        let record = MetricsRecord {
            deforestation_percent: None,
            area_ha: Some(-12_345.4),
            changed_pixels: Some(u64::MAX),
        };
        assert_eq!(
            MetricsSummary::from_record(Some(&record)),
            MetricsSummary::Available {
                deforestation: "0.00%".to_string(),
                area_ha: "-12,345".to_string(),
                changed_pixels: "18,446,744,073,709,551,615".to_string(),
            }
        );
    }
}
