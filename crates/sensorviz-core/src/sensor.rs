//! Sensor records and the ordered sensor registry
//!
//! The registry order is significant: viewable ids are assigned from it,
//! so every consumer must preserve the order returned by `list_sensors`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read sensor registry: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse sensor registry: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Duplicate sensor id: {0}")]
    DuplicateId(String),
}

/// Human-readable sensor identifier (the location name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(pub String);

impl SensorId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SensorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in model space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A physical sensor location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Unique location name
    pub id: SensorId,
    /// Position in model space
    pub position: Position,
    /// Device class (e.g. "thermometer")
    #[serde(default = "default_device_class")]
    pub device_class: String,
    /// Kinds of telemetry this sensor reports
    #[serde(default = "default_sensor_kinds")]
    pub sensor_kinds: BTreeSet<String>,
}

fn default_device_class() -> String {
    "thermometer".to_string()
}

fn default_sensor_kinds() -> BTreeSet<String> {
    BTreeSet::from(["temperature".to_string()])
}

impl SensorRecord {
    /// Create a thermometer reporting temperature, the reference device class
    pub fn thermometer(id: &str, position: Position) -> Self {
        Self {
            id: SensorId::new(id),
            position,
            device_class: default_device_class(),
            sensor_kinds: default_sensor_kinds(),
        }
    }
}

/// Z plane shared by most sensors on the reference floor
const FLOOR_Z: f64 = -16.919677257537842;

/// Reference hospital floor layout, in registry order
const HOSPITAL_FLOOR: &[(&str, f64, f64, f64)] = &[
    ("Exit 2", -55.66762924194336, 88.7755241394043, FLOOR_Z),
    ("Restroom 2", -65.71856307983398, 86.61837005615234, FLOOR_Z),
    ("Consulation Room 2", -90.7604751586914, 87.13715362548828, FLOOR_Z),
    ("Main Entrance", -105.57610702514648, -11.594642639160156, FLOOR_Z),
    ("Cafeteria", -143.30173110961914, 87.18759536743164, FLOOR_Z),
    ("Lobby", -132.45924377441406, 10.900766372680664, -10.544355034828186),
    ("Administration", -159.2780303955078, -1.8119175434112549, FLOOR_Z),
    ("Imaging & Radiology Lab", -159.2780303955078, -50.4998254776001, FLOOR_Z),
    ("Consulation Room 1", -126.44904327392578, -62.24671173095703, FLOOR_Z),
    ("Restroom 1", -112.73586654663086, -66.04428291320801, FLOOR_Z),
    ("Medical Supplies", -103.05361557006836, -66.04428291320801, FLOOR_Z),
    ("Diagnostic Labs", -80.95461654663086, -62.41075134277344, FLOOR_Z),
    ("Lab Sample Storage", -52.953880310058594, -62.41075134277344, FLOOR_Z),
    ("Blood Bank", -23.426319122314453, -62.41075134277344, FLOOR_Z),
    ("Pharmacy", 6.101234436035156, -62.41075134277344, FLOOR_Z),
    ("Waiting Room", 25.59398651123047, -62.41075134277344, FLOOR_Z),
    ("Exit 1", 40.003883361816406, -63.63409614562988, FLOOR_Z),
];

/// On-disk registry format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub sensor: Vec<SensorRecord>,
}

/// Ordered, immutable catalog of sensors
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    sensors: Vec<SensorRecord>,
}

impl SensorRegistry {
    /// Build a registry from records, rejecting duplicate ids
    pub fn new(sensors: Vec<SensorRecord>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(sensors.len());
        for sensor in &sensors {
            if !seen.insert(sensor.id.as_str()) {
                return Err(RegistryError::DuplicateId(sensor.id.0.clone()));
            }
        }
        Ok(Self { sensors })
    }

    /// The built-in hospital floor table
    pub fn builtin() -> Self {
        let sensors = HOSPITAL_FLOOR
            .iter()
            .map(|&(name, x, y, z)| SensorRecord::thermometer(name, Position::new(x, y, z)))
            .collect();
        Self { sensors }
    }

    /// Parse a registry from TOML (`[[sensor]]` tables), keeping file order
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(content)?;
        Self::new(file.sensor)
    }

    /// Load a registry file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&content)?;
        info!(path = %path.display(), sensors = registry.len(), "Loaded sensor registry");
        Ok(registry)
    }

    /// All sensors in registry order
    pub fn list_sensors(&self) -> &[SensorRecord] {
        &self.sensors
    }

    pub fn get(&self, id: &str) -> Option<&SensorRecord> {
        self.sensors.iter().find(|s| s.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
