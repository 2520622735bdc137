use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{PackageId, SaleId};
use crate::define_label_enum;
use crate::models::event::EventSummary;
use crate::models::package::PackageSummary;

define_label_enum!(
    /// Whether a sale is for a package bundle or for individual events.
    SaleType {
        Package => "package",
        Individual => "individual",
    }
);

define_label_enum!(
    PaymentStatus {
        Pendiente => "pendiente",
        Pagado => "pagado",
        Parcial => "parcial",
        Rechazado => "rechazado",
    }
);

/// Default payment method recorded when the request omits one.
pub const DEFAULT_PAYMENT_METHOD: &str = "transferencia";

/// A ticket sale (`sales` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub sale_type: SaleType,
    pub package_id: Option<PackageId>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub ticket_quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub team_leader: Option<String>,
    pub rrpp_name: Option<String>,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub city: Option<String>,
    pub receipt_filename: Option<String>,
    pub tickets_delivered: bool,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub sale_type: SaleType,
    pub package_id: Option<PackageId>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub ticket_quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub team_leader: Option<String>,
    pub rrpp_name: Option<String>,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub city: Option<String>,
    pub receipt_filename: Option<String>,
}

/// A sale with its package and linked events resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDetails {
    #[serde(flatten)]
    pub sale: Sale,
    pub package: Option<PackageSummary>,
    pub events: Vec<EventSummary>,
    /// Public URL of the receipt; filled in by the service layer.
    pub receipt_url: Option<String>,
}

impl SaleDetails {
    pub fn new(sale: Sale) -> Self {
        Self {
            sale,
            package: None,
            events: Vec::new(),
            receipt_url: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub sale_type: Option<SaleType>,
    pub city: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub limit: Option<usize>,
}

impl SaleFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        self.sale_type.map_or(true, |t| sale.sale_type == t)
            && self.city.as_deref().map_or(true, |c| sale.city.as_deref() == Some(c))
            && self.payment_status.map_or(true, |s| sale.payment_status == s)
    }
}
