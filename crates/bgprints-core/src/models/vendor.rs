use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attachment::{ServiceId, VendorId};
use crate::geo::Coordinates;

/// A print service offering (e.g. "color printing", "binding").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pricing: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub terms_and_conditions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Link between a vendor and a service it offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorService {
    pub service: Service,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// A print-service provider as returned by the vendor endpoints.
///
/// Coordinates arrive as decimal strings (`"12.971599"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub business_name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone_number: String,
    #[serde(default)]
    pub address: String,
    pub location_latitude: Decimal,
    pub location_longitude: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub accepted_file_formats: String,
    #[serde(default)]
    pub pricing_information: String,
    #[serde(default)]
    pub payment_methods: String,
    #[serde(default)]
    pub terms_and_conditions: String,
    #[serde(default)]
    pub printer_specifications: Option<String>,
    #[serde(default)]
    pub vendor_logo_url: Option<String>,
    #[serde(default)]
    pub reviews_and_ratings: Option<String>,
    #[serde(default)]
    pub services_offered: Vec<Service>,
    #[serde(default)]
    pub vendor_services: Vec<VendorService>,
}

impl Vendor {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(
            self.location_latitude.to_f64()?,
            self.location_longitude.to_f64()?,
        ))
    }

    /// Numeric rating if `reviews_and_ratings` holds one.
    pub fn rating(&self) -> Option<f64> {
        self.reviews_and_ratings
            .as_deref()
            .and_then(|r| r.trim().parse::<f64>().ok())
            .filter(|r| r.is_finite())
    }

    /// Services the vendor currently accepts files for.
    ///
    /// Active `vendor_services` entries win; `services_offered` is the fallback
    /// for listings that only carry the flat form.
    pub fn active_services(&self) -> Vec<&Service> {
        if self.vendor_services.is_empty() {
            return self.services_offered.iter().collect();
        }
        self.vendor_services
            .iter()
            .filter(|vs| vs.is_active)
            .map(|vs| &vs.service)
            .collect()
    }

    pub fn offers(&self, service_id: ServiceId) -> bool {
        self.active_services().iter().any(|s| s.id == service_id)
    }
}
