//! Package and individual ticket sales.

use chrono::Utc;

use crate::api::*;
use crate::db::repository::FullRepository;
use crate::models::sale::DEFAULT_PAYMENT_METHOD;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::validators::*;
use crate::services::{list_limit, receipts, Submission};
use crate::storage::{ObjectStorage, Upload};

pub const DEFAULT_LIST_LIMIT: usize = 100;

pub fn parse_filter(query: &Record) -> ValidationResult<SaleFilter> {
    Ok(SaleFilter {
        sale_type: field(query, "sale_type")
            .map(|v| require_choice::<SaleType>(v, "sale_type", &SaleType::labels()))
            .transpose()?,
        city: optional_string(query, "city", "city", 100)?,
        payment_status: field(query, "payment_status")
            .map(|v| require_choice::<PaymentStatus>(v, "payment_status", &PaymentStatus::labels()))
            .transpose()?,
        limit: Some(list_limit(query, DEFAULT_LIST_LIMIT)?),
    })
}

fn with_receipt_url(storage: &dyn ObjectStorage, mut details: SaleDetails) -> SaleDetails {
    details.receipt_url = receipts::public_url(storage, details.sale.receipt_filename.as_deref());
    details
}

pub async fn list_sales(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    filter: &SaleFilter,
) -> ServiceResult<Vec<SaleDetails>> {
    let sales = repo.list_sales(filter).await?;
    Ok(sales.into_iter().map(|d| with_receipt_url(storage, d)).collect())
}

pub async fn get_sale(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    id: SaleId,
) -> ServiceResult<SaleDetails> {
    let details = repo
        .get_sale(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Sale not found"))?;
    Ok(with_receipt_url(storage, details))
}

/// Customer and attribution fields shared by both kinds of sale.
struct SaleFields {
    customer_name: String,
    customer_phone: Option<String>,
    customer_email: Option<String>,
    ticket_quantity: i32,
    team_leader: Option<String>,
    rrpp_name: Option<String>,
    payment_method: String,
    city: Option<String>,
}

fn parse_sale_fields(body: &Record) -> ValidationResult<SaleFields> {
    let customer_name = require_string(required(body, "customer_name")?, "Customer name", 1, 200)?;
    let ticket_quantity =
        require_positive_integer(required(body, "ticket_quantity")?, "Ticket quantity")?;

    let customer_email = optional_string(body, "customer_email", "Email", 200)?;
    if let Some(email) = &customer_email {
        require_email(email)?;
    }
    let customer_phone = optional_string(body, "customer_phone", "Phone", 50)?;
    if let Some(phone) = &customer_phone {
        require_phone(phone)?;
    }

    Ok(SaleFields {
        customer_name,
        customer_phone,
        customer_email,
        ticket_quantity,
        team_leader: optional_string(body, "team_leader", "Team leader", 200)?,
        rrpp_name: optional_string(body, "rrpp_name", "RRPP name", 200)?,
        payment_method: optional_string(body, "payment_method", "Payment method", 50)?
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        city: optional_string(body, "city", "City", 100)?,
    })
}

fn checked_receipt(receipt: &Option<Upload>, max_upload_bytes: usize) -> ValidationResult<()> {
    match receipt {
        Some(upload) => receipts::check(upload, max_upload_bytes),
        None => Ok(()),
    }
}

impl SaleFields {
    fn into_new_sale(
        self,
        sale_type: SaleType,
        package_id: Option<PackageId>,
        unit_price: f64,
        total_amount: f64,
        receipt_filename: Option<String>,
    ) -> NewSale {
        NewSale {
            sale_type,
            package_id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
            ticket_quantity: self.ticket_quantity,
            unit_price,
            total_amount,
            team_leader: self.team_leader,
            rrpp_name: self.rrpp_name,
            payment_method: self.payment_method,
            payment_status: PaymentStatus::Pendiente,
            city: self.city,
            receipt_filename,
        }
    }
}

/// Upload the receipt (if any), insert the sale and link its events.
///
/// A receipt stored for a sale that then fails to insert is removed again.
async fn store_sale(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    receipt: Option<Upload>,
    build: impl FnOnce(Option<String>) -> NewSale,
    event_ids: &[EventId],
) -> ServiceResult<SaleDetails> {
    let receipt_key = match receipt {
        Some(upload) => Some(receipts::store(storage, upload).await?),
        None => None,
    };

    let sale = match repo.insert_sale(build(receipt_key.clone())).await {
        Ok(sale) => sale,
        Err(e) => {
            if let Some(key) = &receipt_key {
                receipts::discard(storage, key).await;
            }
            return Err(e.into());
        }
    };

    if !event_ids.is_empty() {
        if let Err(e) = repo.link_sale_events(sale.id, event_ids).await {
            log::error!("Sale {} stored but its events could not be linked: {}", sale.id, e);
            return Err(e.into());
        }
    }

    log::info!(
        "Registered {} sale {} for {:.2}",
        sale.sale_type,
        sale.id,
        sale.total_amount
    );

    let details = repo
        .get_sale(sale.id)
        .await?
        .unwrap_or_else(|| SaleDetails::new(sale));
    Ok(with_receipt_url(storage, details))
}

/// Register a sale of a package bundle.
pub async fn create_package_sale(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    submission: Submission,
    max_upload_bytes: usize,
) -> ServiceResult<SaleDetails> {
    let Submission { fields: body, receipt } = submission;
    require_fields(&body, &["package_id", "customer_name", "ticket_quantity"])?;
    let package_id = PackageId::new(require_id(required(&body, "package_id")?, "package_id")?);
    let fields = parse_sale_fields(&body)?;
    checked_receipt(&receipt, max_upload_bytes)?;

    let package = repo
        .get_package(package_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Package not found"))?;
    if !package.active {
        return Err(ServiceError::conflict("Package is not available"));
    }

    let quantity = fields.ticket_quantity;
    let total = package.package_price * f64::from(quantity);
    store_sale(
        repo,
        storage,
        receipt,
        |receipt_filename| {
            fields.into_new_sale(
                SaleType::Package,
                Some(package_id),
                package.package_price,
                total,
                receipt_filename,
            )
        },
        &[],
    )
    .await
}

/// Register a sale of tickets to one or more individual events.
///
/// Repeated event ids count once. The unit price is the mean price of the
/// distinct events and the total is their summed price times the quantity.
pub async fn create_individual_sale(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    submission: Submission,
    max_upload_bytes: usize,
) -> ServiceResult<SaleDetails> {
    let Submission { fields: body, receipt } = submission;
    require_fields(&body, &["event_ids", "customer_name", "ticket_quantity"])?;
    let mut event_ids: Vec<EventId> = Vec::new();
    for id in require_id_list(required(&body, "event_ids")?, "event_ids")? {
        let id = EventId::new(id);
        if !event_ids.contains(&id) {
            event_ids.push(id);
        }
    }
    let fields = parse_sale_fields(&body)?;
    checked_receipt(&receipt, max_upload_bytes)?;

    let events = repo.get_events(&event_ids).await?;
    if events.len() != event_ids.len() {
        return Err(ServiceError::not_found("One or more events not found"));
    }
    if events.iter().any(|e| !e.status.is_sellable()) {
        return Err(ServiceError::conflict("One or more events are not available"));
    }

    let price_sum: f64 = events.iter().map(|e| e.ticket_price).sum();
    let unit_price = price_sum / event_ids.len() as f64;
    let total = price_sum * f64::from(fields.ticket_quantity);
    store_sale(
        repo,
        storage,
        receipt,
        |receipt_filename| {
            fields.into_new_sale(SaleType::Individual, None, unit_price, total, receipt_filename)
        },
        &event_ids,
    )
    .await
}

/// Mark tickets as delivered (stamping the time) or undo it.
pub async fn set_delivery(repo: &dyn FullRepository, id: SaleId, body: &Record) -> ServiceResult<Sale> {
    let delivered = require_json_bool(required(body, "delivered")?, "delivered")?;
    let delivery_date = delivered.then(Utc::now);
    repo.set_delivery(id, delivered, delivery_date)
        .await?
        .ok_or_else(|| ServiceError::not_found("Sale not found"))
}

pub async fn set_payment_status(
    repo: &dyn FullRepository,
    id: SaleId,
    body: &Record,
) -> ServiceResult<Sale> {
    let labels = PaymentStatus::labels();
    let invalid = || ValidationFailure::InvalidChoice {
        label: "Payment status".to_string(),
        allowed: labels.join(", "),
    };
    let status = field(body, "payment_status")
        .ok_or_else(invalid)
        .and_then(|v| require_choice::<PaymentStatus>(v, "Payment status", &labels))?;
    repo.set_payment_status(id, status)
        .await?
        .ok_or_else(|| ServiceError::not_found("Sale not found"))
}

/// Delete a sale, then its receipt.
pub async fn delete_sale(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    id: SaleId,
) -> ServiceResult<()> {
    let removed = repo
        .delete_sale(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Sale not found"))?;
    if let Some(key) = &removed.receipt_filename {
        receipts::discard(storage, key).await;
    }
    log::info!("Deleted sale {}", id);
    Ok(())
}

#[cfg(test)]
#[path = "sales_tests.rs"]
mod sales_tests;
