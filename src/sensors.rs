/// Sensor registry for the Crystal Cove dashboard.
///
/// Defines display metadata and storage field names for every sensor kind
/// the RaccoonBot reports. This is the single source of truth for field
/// names at the storage boundary. The assembler and the Firestore adapter
/// look fields up through here rather than hardcoding them.

use crate::model::{SensorGroup, SensorKind};

// ---------------------------------------------------------------------------
// Sensor metadata
// ---------------------------------------------------------------------------

/// One storage field a kind may be read from, with the factor that brings
/// the stored number into the kind's display unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageField {
    pub name: &'static str,
    pub scale: f64,
}

impl StorageField {
    pub const fn plain(name: &'static str) -> Self {
        Self { name, scale: 1.0 }
    }

    pub const fn scaled(name: &'static str, scale: f64) -> Self {
        Self { name, scale }
    }

    /// Stored value converted to the display unit.
    pub fn apply(&self, stored: f64) -> f64 {
        stored * self.scale
    }
}

/// Metadata for a single sensor kind.
pub struct SensorSpec {
    pub kind: SensorKind,
    /// Human-readable label used on cards and chart titles.
    pub label: &'static str,
    pub unit: &'static str,
    /// Lower bound of the plausible range; charts never pad below it.
    pub min: f64,
    /// Upper bound of the plausible range; charts never pad above it.
    pub max: f64,
    /// Fixed number of decimals for display.
    pub decimals: usize,
    /// Storage field names, newest schema first. The first field present on
    /// a record wins; a record carrying none of them yields 0.
    pub fields: &'static [StorageField],
}

/// Every sensor kind, environment group first, then status group.
pub static SENSOR_REGISTRY: &[SensorSpec] = &[
    SensorSpec {
        kind: SensorKind::Temperature,
        label: "Temperature",
        unit: "°C",
        min: -10.0,
        max: 50.0,
        decimals: 1,
        fields: &[StorageField::plain("temp_c")],
    },
    SensorSpec {
        kind: SensorKind::Humidity,
        label: "Humidity",
        unit: "%",
        min: 0.0,
        max: 100.0,
        decimals: 1,
        fields: &[StorageField::plain("humidity_percent")],
    },
    SensorSpec {
        kind: SensorKind::Pressure,
        label: "Pressure",
        unit: "hPa",
        min: 900.0,
        max: 1100.0,
        decimals: 1,
        // the bot writes decapascals under this name; a tenth is hPa
        fields: &[StorageField::scaled("pressure_pa", 0.1)],
    },
    SensorSpec {
        kind: SensorKind::Aqi,
        label: "Air Quality Index",
        unit: "AQI",
        min: 0.0,
        max: 500.0,
        decimals: 1,
        fields: &[StorageField::plain("aqi")],
    },
    SensorSpec {
        kind: SensorKind::Tvoc,
        label: "TVOC",
        unit: "ppb",
        min: 0.0,
        max: 1800.0,
        decimals: 0,
        fields: &[StorageField::plain("tvoc_ppb")],
    },
    SensorSpec {
        kind: SensorKind::Eco2,
        label: "eCO2",
        unit: "ppm",
        min: 0.0,
        max: 1200.0,
        decimals: 0,
        fields: &[StorageField::plain("eco2_ppm")],
    },
    SensorSpec {
        kind: SensorKind::StateOfCharge,
        label: "State of Charge",
        unit: "%",
        min: 0.0,
        max: 100.0,
        decimals: 1,
        fields: &[StorageField::plain("soc_percent")],
    },
    SensorSpec {
        kind: SensorKind::BatteryVoltage,
        label: "Battery Voltage",
        unit: "V",
        min: 0.0,
        max: 5.0,
        decimals: 2,
        fields: &[StorageField::plain("battery_voltage_v")],
    },
    SensorSpec {
        kind: SensorKind::SolarPower,
        label: "Solar Power",
        unit: "W",
        min: 0.0,
        max: 10.0,
        decimals: 2,
        fields: &[StorageField::plain("solar_power_w")],
    },
    SensorSpec {
        kind: SensorKind::SolarVoltage,
        label: "Solar Voltage",
        unit: "V",
        min: 0.0,
        max: 6.0,
        decimals: 2,
        fields: &[StorageField::plain("solar_voltage_v")],
    },
    SensorSpec {
        kind: SensorKind::SolarCurrent,
        label: "Solar Current",
        unit: "A",
        min: 0.0,
        max: 0.1,
        decimals: 3,
        // renamed from milliamps to amps; older documents still carry the _ma field
        fields: &[StorageField::plain("solar_current_a"), StorageField::plain("solar_current_ma")],
    },
];

/// Looks up the spec for a kind. Every `SensorKind` has an entry.
pub fn spec_for(kind: SensorKind) -> &'static SensorSpec {
    SENSOR_REGISTRY
        .iter()
        .find(|s| s.kind == kind)
        .unwrap_or(&SENSOR_REGISTRY[0])
}

/// Specs of every kind in `group`, in registry order.
pub fn specs_in_group(group: SensorGroup) -> Vec<&'static SensorSpec> {
    SENSOR_REGISTRY
        .iter()
        .filter(|s| s.kind.group() == group)
        .collect()
}

/// Renders a value with the kind's fixed display precision.
pub fn format_value(kind: SensorKind, value: f64) -> String {
    format!("{:.*}", spec_for(kind).decimals, value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_exactly_one_spec() {
        for kind in SensorKind::ALL {
            let count = SENSOR_REGISTRY.iter().filter(|s| s.kind == kind).count();
            assert_eq!(count, 1, "kind {} should appear once in SENSOR_REGISTRY", kind);
        }
        assert_eq!(SENSOR_REGISTRY.len(), SensorKind::ALL.len());
    }

    #[test]
    fn test_spec_for_returns_matching_entry() {
        assert_eq!(spec_for(SensorKind::Tvoc).label, "TVOC");
        assert_eq!(spec_for(SensorKind::SolarCurrent).unit, "A");
    }

    #[test]
    fn test_ranges_are_ordered() {
        for spec in SENSOR_REGISTRY {
            assert!(spec.min < spec.max, "min must be below max for '{}'", spec.label);
        }
    }

    #[test]
    fn test_every_spec_has_a_storage_field() {
        for spec in SENSOR_REGISTRY {
            assert!(!spec.fields.is_empty(), "'{}' needs at least one field name", spec.label);
        }
    }

    #[test]
    fn test_solar_current_prefers_amps_field() {
        let spec = spec_for(SensorKind::SolarCurrent);
        let names: Vec<&str> = spec.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["solar_current_a", "solar_current_ma"]);
    }

    #[test]
    fn test_pressure_reads_scaled_decapascals() {
        let spec = spec_for(SensorKind::Pressure);
        assert_eq!(spec.fields.len(), 1);
        assert_eq!(spec.fields[0].name, "pressure_pa");
        let hpa = spec.fields[0].apply(10_132.4);
        assert!((hpa - 1013.24).abs() < 1e-9);
        assert!(hpa >= spec.min && hpa <= spec.max);
        assert_eq!(format_value(SensorKind::Pressure, hpa), "1013.2");
    }

    #[test]
    fn test_group_specs_split_six_and_five() {
        assert_eq!(specs_in_group(SensorGroup::Environment).len(), 6);
        assert_eq!(specs_in_group(SensorGroup::Status).len(), 5);
    }

    #[test]
    fn test_format_value_uses_fixed_decimals() {
        assert_eq!(format_value(SensorKind::Temperature, 21.456), "21.5");
        assert_eq!(format_value(SensorKind::Eco2, 415.6), "416");
        assert_eq!(format_value(SensorKind::SolarCurrent, 0.04567), "0.046");
    }
}
