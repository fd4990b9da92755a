//! Neighbour search over a set of named places.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::distance::{distance_km, Coordinate};
use crate::error::{Result, WorkbenchError};

/// Default neighbour radius in kilometres
pub const DEFAULT_THRESHOLD_KM: f64 = 40.0;

/// A neighbour of a place and its distance rounded to two decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPlace {
    pub name: String,
    pub distance: f64,
}

/// Neighbour information for one place
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceReport {
    pub name: String,
    pub coordinate: Coordinate,
    pub has_nearby_city: bool,
    pub nearby_cities: Vec<NearbyPlace>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearbySummary {
    pub total: usize,
    pub with_nearby: usize,
    pub without_nearby: usize,
}

/// Result of a neighbour search, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyReport {
    pub threshold_km: f64,
    pub places: Vec<PlaceReport>,
}

impl NearbyReport {
    pub fn get(&self, name: &str) -> Option<&PlaceReport> {
        self.places.iter().find(|p| p.name == name)
    }

    pub fn summary(&self) -> NearbySummary {
        let with_nearby = self.places.iter().filter(|p| p.has_nearby_city).count();
        NearbySummary {
            total: self.places.len(),
            with_nearby,
            without_nearby: self.places.len() - with_nearby,
        }
    }

    /// JSON object keyed by place name, matching the input city map layout
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for place in &self.places {
            let nearby: Vec<Value> = place
                .nearby_cities
                .iter()
                .map(|n| serde_json::json!({ "name": n.name, "distance": n.distance }))
                .collect();
            out.insert(
                place.name.clone(),
                serde_json::json!({
                    "lat": place.coordinate.lat,
                    "lng": place.coordinate.lng,
                    "has_nearby_city": place.has_nearby_city,
                    "nearby_cities": nearby,
                }),
            );
        }
        Value::Object(out)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// For every place, collect all other places within `threshold_km`.
///
/// Places are compared by position in the input, so two entries with identical
/// coordinates are each other's neighbours at distance 0.
pub fn find_nearby(places: &[(String, Coordinate)], threshold_km: f64) -> Result<NearbyReport> {
    if !threshold_km.is_finite() || threshold_km < 0.0 {
        return Err(WorkbenchError::InvalidInput(format!(
            "threshold must be a non-negative number of kilometres, got {}",
            threshold_km
        )));
    }

    let mut reports = Vec::with_capacity(places.len());
    for (i, (name, origin)) in places.iter().enumerate() {
        let nearby_cities: Vec<NearbyPlace> = places
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .filter_map(|(_, (other, target))| {
                let distance = distance_km(origin, target);
                (distance <= threshold_km).then(|| NearbyPlace {
                    name: other.clone(),
                    distance: round2(distance),
                })
            })
            .collect();

        reports.push(PlaceReport {
            name: name.clone(),
            coordinate: *origin,
            has_nearby_city: !nearby_cities.is_empty(),
            nearby_cities,
        });
    }

    log::debug!("Neighbour search over {} places at {} km", places.len(), threshold_km);
    Ok(NearbyReport {
        threshold_km,
        places: reports,
    })
}

/// Parse a city map (`name -> {"lat", "lng", ...}`) preserving key order
pub fn parse_places(content: &str) -> Result<Vec<(String, Coordinate)>> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Object(map) = value else {
        return Err(WorkbenchError::InvalidInput(
            "city data must be a JSON object keyed by place name".to_string(),
        ));
    };

    let mut places = Vec::with_capacity(map.len());
    for (name, entry) in map {
        let coordinate: Coordinate = serde_json::from_value(entry).map_err(|e| {
            WorkbenchError::InvalidInput(format!("place '{}' has no usable lat/lng: {}", name, e))
        })?;
        coordinate.validate()?;
        places.push((name, coordinate));
    }
    Ok(places)
}

pub fn load_places(path: &Path) -> Result<Vec<(String, Coordinate)>> {
    let content = fs::read_to_string(path)?;
    let places = parse_places(&content)?;
    log::info!("Loaded {} places from {}", places.len(), path.display());
    Ok(places)
}

pub fn write_report(report: &NearbyReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.to_json())?;
    fs::write(path, json)?;
    log::info!("Wrote nearby report to {}", path.display());
    Ok(())
}
