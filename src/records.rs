use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Consumption;

/// Identifier of a metering point (MPID/MPAN).
///
/// The API sends these either as strings or as plain integers, and an id is
/// sent back in the same form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeteringPointId {
    Text(String),
    Number(u64),
}

impl fmt::Display for MeteringPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeteringPointId::Text(id) => f.write_str(id),
            MeteringPointId::Number(id) => write!(f, "{id}"),
        }
    }
}

impl From<String> for MeteringPointId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl From<&str> for MeteringPointId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

impl From<u64> for MeteringPointId {
    fn from(id: u64) -> Self {
        Self::Number(id)
    }
}

/// A metering point linked to the account's contract.
#[derive(Debug, Clone, Deserialize)]
pub struct MeteringPoint {
    pub mpid: MeteringPointId,
    /// Everything else the API reports about the metering point.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Deserialize)]
pub(crate) struct ValuePoint {
    start: DateTime<Utc>,
    value: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmissionPoint {
    date_time: DateTime<Utc>,
    co2_in_kg: f64,
}

#[derive(Deserialize)]
pub(crate) struct ConsumptionPoint {
    mpid: MeteringPointId,
    start: DateTime<Utc>,
    quantity: f64,
}

#[derive(Deserialize)]
pub(crate) struct KwhPrice {
    pub value: f64,
}

impl ValuePoint {
    pub fn into_entry(self) -> (DateTime<Utc>, f64) {
        (self.start, self.value)
    }
}

impl EmissionPoint {
    pub fn into_entry(self) -> (DateTime<Utc>, f64) {
        (self.date_time, self.co2_in_kg)
    }
}

pub(crate) fn group_consumption(points: Vec<ConsumptionPoint>) -> Consumption {
    let mut consumption = Consumption::new();
    for point in points {
        consumption.entry(point.mpid).or_default().insert(point.start, point.quantity);
    }
    consumption
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::TimeSeries;

    #[test]
    fn test_value_points_from_z_timestamps() {
        let points: Vec<ValuePoint> = serde_json::from_value(json!([
            {"start": "2023-01-01T00:00:00Z", "value": 0.1234},
            {"start": "2023-01-01T01:00:00Z", "value": -0.01},
        ]))
        .unwrap();

        let series: TimeSeries = points.into_iter().map(ValuePoint::into_entry).collect();

        assert_eq!(series.len(), 2);
        assert_eq!(series[&Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()], 0.1234);
        assert_eq!(series[&Utc.with_ymd_and_hms(2023, 1, 1, 1, 0, 0).unwrap()], -0.01);
    }

    #[test]
    fn test_value_point_with_explicit_offset() {
        let points: Vec<ValuePoint> =
            serde_json::from_value(json!([{"start": "2023-01-01T01:00:00+01:00", "value": 1.0}]))
                .unwrap();

        let series: TimeSeries = points.into_iter().map(ValuePoint::into_entry).collect();

        assert_eq!(series.keys().next(), Some(&Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_emission_points() {
        let points: Vec<EmissionPoint> = serde_json::from_value(json!([
            {"dateTime": "2023-02-01T10:00:00Z", "co2InKg": 0.42},
        ]))
        .unwrap();

        let series: TimeSeries = points.into_iter().map(EmissionPoint::into_entry).collect();

        assert_eq!(series[&Utc.with_ymd_and_hms(2023, 2, 1, 10, 0, 0).unwrap()], 0.42);
    }

    #[test]
    fn test_series_keeps_arrival_order() {
        let points: Vec<ValuePoint> = serde_json::from_value(json!([
            {"start": "2023-01-01T02:00:00Z", "value": 2.0},
            {"start": "2023-01-01T00:00:00Z", "value": 0.0},
            {"start": "2023-01-01T02:00:00Z", "value": 2.5},
        ]))
        .unwrap();

        let series: TimeSeries = points.into_iter().map(ValuePoint::into_entry).collect();

        // A repeated timestamp keeps its first position and takes the last value.
        assert_eq!(series.values().copied().collect::<Vec<_>>(), vec![2.5, 0.0]);
    }

    #[test]
    fn test_metering_point_id_keeps_wire_form() {
        assert_eq!(serde_json::to_value(MeteringPointId::from(42_u64)).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(MeteringPointId::from("42")).unwrap(), json!("42"));
        assert_eq!(
            serde_json::from_value::<MeteringPointId>(json!(42)).unwrap(),
            MeteringPointId::Number(42)
        );
        assert_eq!(MeteringPointId::Number(42).to_string(), "42");
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let result =
            serde_json::from_value::<Vec<ValuePoint>>(json!([{"start": "2023-01-01T00:00:00Z"}]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let result =
            serde_json::from_value::<Vec<ValuePoint>>(json!([{"start": "yesterday", "value": 1.0}]));
        assert!(result.is_err());
    }

    #[test]
    fn test_group_consumption() {
        let points: Vec<ConsumptionPoint> = serde_json::from_value(json!([
            {"mpid": "571313000000000001", "start": "2023-01-01T00:00:00Z", "quantity": 0.5},
            {"mpid": 571313000000000002_u64, "start": "2023-01-01T00:00:00Z", "quantity": 1.5},
            {"mpid": "571313000000000001", "start": "2023-01-01T01:00:00Z", "quantity": 0.25},
        ]))
        .unwrap();

        let consumption = group_consumption(points);

        let first = MeteringPointId::from("571313000000000001");
        let second = MeteringPointId::from(571313000000000002_u64);
        assert_eq!(consumption.keys().collect::<Vec<_>>(), vec![&first, &second]);
        assert_eq!(consumption[&first].values().copied().collect::<Vec<_>>(), vec![0.5, 0.25]);
        assert_eq!(consumption[&second][&Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()], 1.5);
    }

    #[test]
    fn test_metering_point_keeps_details() {
        let point: MeteringPoint = serde_json::from_value(json!({
            "mpid": 571313000000000001_u64,
            "address": "Vesterbrogade 1",
            "priceArea": "DK_NORDPOOL_SPOT_DK2",
        }))
        .unwrap();

        assert_eq!(point.mpid, MeteringPointId::Number(571313000000000001));
        assert_eq!(point.details["priceArea"], json!("DK_NORDPOOL_SPOT_DK2"));
        assert!(!point.details.contains_key("mpid"));
    }
}
