use serde::{Deserialize, Serialize};

/// Vitals captured at intake. Every field is independently optional;
/// blood pressure is the combined "systolic/diastolic" string the
/// intake form collects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub heart_rate: Option<u32>,
    #[serde(default)]
    pub respiratory_rate: Option<u32>,
    #[serde(default)]
    pub oxygen_saturation: Option<f64>,
}

impl VitalSigns {
    /// Parse the combined blood-pressure string into (systolic, diastolic).
    /// Returns `None` for a missing or malformed reading.
    pub fn parsed_blood_pressure(&self) -> Option<(u32, u32)> {
        let raw = self.blood_pressure.as_deref()?.replace(' ', "");
        let (sys, dia) = raw.split_once('/')?;
        Some((sys.parse().ok()?, dia.parse().ok()?))
    }
}
