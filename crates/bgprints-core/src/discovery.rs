//! Vendor discovery: radius filtering, text search and sorting over vendor listings.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::geo::{haversine_km, Coordinates};
use crate::models::Vendor;

/// Sort order for the vendor list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VendorSort {
    /// Keep the backend's order (nearest first, then rating)
    #[default]
    None,
    /// Highest rating first; unrated vendors last
    Rating,
    /// Nearest first
    Distance,
}

impl FromStr for VendorSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(VendorSort::None),
            "rating" => Ok(VendorSort::Rating),
            "distance" => Ok(VendorSort::Distance),
            _ => Err(anyhow::anyhow!("Invalid sort option: {}", s)),
        }
    }
}

impl Display for VendorSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VendorSort::None => write!(f, "none"),
            VendorSort::Rating => write!(f, "rating"),
            VendorSort::Distance => write!(f, "distance"),
        }
    }
}

/// Distance from `origin` to the vendor, if its coordinates are usable.
pub fn distance_to(vendor: &Vendor, origin: Coordinates) -> Option<f64> {
    vendor.coordinates().map(|c| haversine_km(origin, c))
}

/// Keep active vendors within `radius_km` of `origin`.
pub fn within_radius(vendors: Vec<Vendor>, origin: Coordinates, radius_km: f64) -> Vec<Vendor> {
    vendors
        .into_iter()
        .filter(|v| v.is_active)
        .filter(|v| distance_to(v, origin).is_some_and(|d| d <= radius_km))
        .collect()
}

/// Case-insensitive match on business name or any offered service name.
/// Blank search text keeps every vendor.
pub fn filter_vendors<'a>(vendors: &'a [Vendor], search: &str) -> Vec<&'a Vendor> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return vendors.iter().collect();
    }
    vendors
        .iter()
        .filter(|v| {
            v.business_name.to_lowercase().contains(&needle)
                || v.active_services()
                    .iter()
                    .any(|s| s.name.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Sort vendors in place. Sorting is stable, so ties keep the backend order.
pub fn sort_vendors(vendors: &mut [&Vendor], sort: VendorSort, origin: Coordinates) {
    match sort {
        VendorSort::None => {}
        VendorSort::Rating => {
            vendors.sort_by(|a, b| descending_with_missing_last(a.rating(), b.rating()));
        }
        VendorSort::Distance => {
            vendors.sort_by(|a, b| {
                ascending_with_missing_last(distance_to(a, origin), distance_to(b, origin))
            });
        }
    }
}

fn ascending_with_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn descending_with_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vendor(id: i64, name: &str, lat: &str, lon: &str, rating: Option<&str>) -> Vendor {
        serde_json::from_value(json!({
            "id": id,
            "business_name": name,
            "location_latitude": lat,
            "location_longitude": lon,
            "reviews_and_ratings": rating,
            "services_offered": [{ "id": 1, "name": "Color Printing" }]
        }))
        .unwrap()
    }

    fn origin() -> Coordinates {
        Coordinates::new(12.9716, 77.5946)
    }

    fn fixtures() -> Vec<Vendor> {
        vec![
            vendor(1, "Far Prints", "13.0500", "77.5946", Some("4.9")),
            vendor(2, "Near Copies", "12.9720", "77.5950", Some("3.1")),
            vendor(3, "Unrated Xerox", "12.9800", "77.5946", None),
            vendor(4, "Chennai Print Hub", "13.0827", "80.2707", Some("5.0")),
        ]
    }

    #[test]
    fn within_radius_drops_far_and_inactive_vendors() {
        let mut vendors = fixtures();
        vendors[1].is_active = false;
        let kept: Vec<i64> = within_radius(vendors, origin(), 10.0)
            .iter()
            .map(|v| v.id.0)
            .collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn filter_matches_name_or_service() {
        let vendors = fixtures();
        assert_eq!(filter_vendors(&vendors, "near").len(), 1);
        assert_eq!(filter_vendors(&vendors, "COLOR").len(), 4);
        assert_eq!(filter_vendors(&vendors, "  ").len(), 4);
        assert!(filter_vendors(&vendors, "binding").is_empty());
    }

    #[test]
    fn sort_by_rating_puts_unrated_last() {
        let vendors = fixtures();
        let mut refs: Vec<&Vendor> = vendors.iter().collect();
        sort_vendors(&mut refs, VendorSort::Rating, origin());
        let ids: Vec<i64> = refs.iter().map(|v| v.id.0).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
    }

    #[test]
    fn sort_by_distance_is_nearest_first() {
        let vendors = fixtures();
        let mut refs: Vec<&Vendor> = vendors.iter().collect();
        sort_vendors(&mut refs, VendorSort::Distance, origin());
        let ids: Vec<i64> = refs.iter().map(|v| v.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }

    #[test]
    fn sort_option_parses() {
        assert_eq!("Rating".parse::<VendorSort>().unwrap(), VendorSort::Rating);
        assert_eq!("distance".parse::<VendorSort>().unwrap(), VendorSort::Distance);
        assert!("price".parse::<VendorSort>().is_err());
    }
}
