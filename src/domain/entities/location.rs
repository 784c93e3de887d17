//! Selected location preference.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_radius")]
    pub radius_km: u32,
}

const fn default_radius() -> u32 {
    25
}

impl Location {
    /// Creates a named location with the default radius.
    ///
    /// Returns `None` for blank names.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Option<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            latitude: None,
            longitude: None,
            radius_km: default_radius(),
        })
    }

    #[must_use]
    pub const fn with_radius(mut self, radius_km: u32) -> Self {
        self.radius_km = radius_km;
        self
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{} (+{} km)", self.name, self.radius_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_location() {
        assert!(Location::named("   ").is_none());
        let loc = Location::named(" Lyon ").unwrap().with_radius(10);
        assert_eq!(loc.label(), "Lyon (+10 km)");
    }
}
