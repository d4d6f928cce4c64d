use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::order::{CourierId, RestaurantId};

/// Initial restaurant and courier availability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySeed {
    #[serde(default)]
    pub restaurants: HashMap<RestaurantId, bool>,
    #[serde(default)]
    pub couriers: HashMap<CourierId, bool>,
}

impl AvailabilitySeed {
    /// Demo data: R002 is closed and D003 is off shift.
    pub fn demo() -> Self {
        let restaurants = [("R001", true), ("R002", false), ("R003", true)];
        let couriers = [("D001", true), ("D002", true), ("D003", false)];

        Self {
            restaurants: restaurants
                .into_iter()
                .map(|(id, open)| (id.to_string(), open))
                .collect(),
            couriers: couriers
                .into_iter()
                .map(|(id, free)| (id.to_string(), free))
                .collect(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::AvailabilitySeed;

    #[test]
    fn parses_partial_json_seed() {
        let seed = AvailabilitySeed::from_json_str(r#"{"couriers": {"D009": true}}"#).unwrap();

        assert!(seed.restaurants.is_empty());
        assert_eq!(seed.couriers.get("D009"), Some(&true));
    }

    #[test]
    fn demo_seed_marks_r002_and_d003_unavailable() {
        let seed = AvailabilitySeed::demo();

        assert_eq!(seed.restaurants.get("R001"), Some(&true));
        assert_eq!(seed.restaurants.get("R002"), Some(&false));
        assert_eq!(seed.couriers.get("D003"), Some(&false));
        assert_eq!(seed.couriers.len(), 3);
    }
}
