use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Number of raised beds the controller waters.
pub const BED_COUNT: usize = 5;

/// Describes the states the watering pump reports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Deserialize,
    strum::AsRefStr,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum PumpStatus {
    #[strum(serialize = "off")]
    Off,
    #[strum(serialize = "on")]
    On,
    /// Labels newer firmware may report that this panel does not know.
    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// One sensor reading as served by the controller's `/data.json` endpoint.
///
/// Only light, temperature and humidity are guaranteed; the remaining fields
/// arrived in later firmware revisions and are absent on older controllers.
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct SensorSnapshot {
    light: f64,
    temperature: f64,
    humidity: f64,
    #[serde(default, rename = "pumpStatus")]
    pump_status: Option<PumpStatus>,
    #[serde(default, rename = "beet1")]
    bed1_moisture: Option<f64>,
    #[serde(default, rename = "beet2")]
    bed2_moisture: Option<f64>,
    #[serde(default, rename = "beet3")]
    bed3_moisture: Option<f64>,
    #[serde(default, rename = "beet4")]
    bed4_moisture: Option<f64>,
    #[serde(default, rename = "beet5")]
    bed5_moisture: Option<f64>,
    #[serde(default, rename = "floatHigh")]
    float_high: Option<bool>,
    #[serde(default, rename = "floatLow")]
    float_low: Option<bool>,
    #[serde(default, rename = "roofStatus")]
    roof_status: Option<String>,
}

impl SensorSnapshot {
    /// Soil moisture readings in bed order, missing where the firmware sent
    /// nothing.
    pub fn bed_moistures(&self) -> [Option<f64>; BED_COUNT] {
        [
            self.bed1_moisture,
            self.bed2_moisture,
            self.bed3_moisture,
            self.bed4_moisture,
            self.bed5_moisture,
        ]
    }
}

/// The persisted irrigation configuration: one moisture target per bed plus
/// the global light target. Field names mirror the controller's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrigationConfig {
    moisture1: i64,
    moisture2: i64,
    moisture3: i64,
    moisture4: i64,
    moisture5: i64,
    lux: i64,
}

impl IrrigationConfig {
    pub fn new(bed_targets: [u8; BED_COUNT], lux: i64) -> Self {
        Self {
            moisture1: bed_targets[0].into(),
            moisture2: bed_targets[1].into(),
            moisture3: bed_targets[2].into(),
            moisture4: bed_targets[3].into(),
            moisture5: bed_targets[4].into(),
            lux,
        }
    }

    /// Moisture target for a 1-based bed index.
    pub fn bed_target(&self, bed: usize) -> Option<i64> {
        match bed {
            1 => Some(self.moisture1),
            2 => Some(self.moisture2),
            3 => Some(self.moisture3),
            4 => Some(self.moisture4),
            5 => Some(self.moisture5),
            _ => None,
        }
    }

    pub fn lux(&self) -> i64 {
        self.lux
    }
}

/// A named plant profile carrying the moisture target it prefers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Plant {
    name: String,
    #[serde(rename = "targetMoisture")]
    target_moisture: i64,
}

impl Plant {
    pub fn new(name: impl Into<String>, target_moisture: i64) -> Self {
        Self {
            name: name.into(),
            target_moisture,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn config_serializes_to_the_wire_field_names() {
        let config = IrrigationConfig::new([10, 20, 30, 40, 50], 500);

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "moisture1": 10,
                "moisture2": 20,
                "moisture3": 30,
                "moisture4": 40,
                "moisture5": 50,
                "lux": 500,
            })
        );
    }

    #[test]
    fn plant_uses_camel_case_moisture_on_the_wire() {
        let plant = Plant::new("Mint", 65);

        assert_eq!(
            serde_json::to_value(&plant).unwrap(),
            json!({ "name": "Mint", "targetMoisture": 65 })
        );
    }

    #[test]
    fn snapshot_parses_without_the_newer_fields() {
        let snapshot: SensorSnapshot = serde_json::from_value(json!({
            "light": 512.0,
            "temperature": 21.5,
            "humidity": 48.0,
        }))
        .unwrap();

        assert_eq!(*snapshot.light(), 512.0);
        assert_eq!(*snapshot.pump_status(), None);
        assert_eq!(snapshot.bed_moistures(), [None; BED_COUNT]);
    }

    #[test]
    fn snapshot_parses_the_full_payload() {
        let snapshot: SensorSnapshot = serde_json::from_value(json!({
            "light": 512,
            "temperature": 21.5,
            "humidity": 48,
            "pumpStatus": "on",
            "beet1": 33.0,
            "beet2": 40.0,
            "beet3": 55.0,
            "beet4": 61.0,
            "beet5": 72.0,
            "floatHigh": true,
            "floatLow": false,
            "roofStatus": "open",
        }))
        .unwrap();

        assert_eq!(*snapshot.pump_status(), Some(PumpStatus::On));
        assert_eq!(snapshot.bed_moistures()[2], Some(55.0));
        assert_eq!(*snapshot.float_low(), Some(false));
        assert_eq!(snapshot.roof_status().as_deref(), Some("open"));
    }

    #[test]
    fn unknown_pump_label_does_not_fail_the_parse() {
        let snapshot: SensorSnapshot = serde_json::from_value(json!({
            "light": 0,
            "temperature": 0,
            "humidity": 0,
            "pumpStatus": "priming",
        }))
        .unwrap();

        assert_eq!(*snapshot.pump_status(), Some(PumpStatus::Unknown));
    }
}
