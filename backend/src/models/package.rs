use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::PackageId;

/// A bundle of events sold at a single price (`packages` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub package_name: String,
    pub package_slug: String,
    pub description: Option<String>,
    pub package_price: f64,
    pub discount_percent: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPackage {
    pub package_name: String,
    pub package_slug: String,
    pub description: Option<String>,
    pub package_price: f64,
    pub discount_percent: Option<f64>,
    pub active: bool,
}

/// Partial update for a package; same `Option<Option<_>>` convention as
/// [`crate::models::event::EventChanges`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageChanges {
    pub package_name: Option<String>,
    pub description: Option<Option<String>>,
    pub package_price: Option<f64>,
    pub discount_percent: Option<Option<f64>>,
    pub active: Option<bool>,
}

impl PackageChanges {
    pub fn is_empty(&self) -> bool {
        *self == PackageChanges::default()
    }

    pub fn apply_to(&self, package: &mut Package) {
        if let Some(name) = &self.package_name {
            package.package_name = name.clone();
        }
        if let Some(description) = &self.description {
            package.description = description.clone();
        }
        if let Some(price) = self.package_price {
            package.package_price = price;
        }
        if let Some(discount) = self.discount_percent {
            package.discount_percent = discount;
        }
        if let Some(active) = self.active {
            package.active = active;
        }
    }
}

/// Package fields embedded in sale listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub id: PackageId,
    pub package_name: String,
    pub package_price: f64,
}

impl From<&Package> for PackageSummary {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id,
            package_name: package.package_name.clone(),
            package_price: package.package_price,
        }
    }
}
