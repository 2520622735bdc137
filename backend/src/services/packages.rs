//! Package bundles and their linked events.

use serde::Serialize;
use serde_json::Value;

use crate::api::*;
use crate::db::repository::FullRepository;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::slug::unique_slug;
use crate::services::validators::*;
use crate::services::query_flag;

/// Package identity shown next to its event list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageRef {
    pub id: PackageId,
    pub package_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageEvents {
    pub package: PackageRef,
    pub events: Vec<Event>,
}

pub async fn list_packages(repo: &dyn FullRepository, query: &Record) -> ServiceResult<Vec<Package>> {
    let active_only = query_flag(query, "active_only")?;
    Ok(repo.list_packages(active_only).await?)
}

pub async fn get_package(repo: &dyn FullRepository, id: PackageId) -> ServiceResult<Package> {
    repo.get_package(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Package not found"))
}

pub async fn package_events(repo: &dyn FullRepository, id: PackageId) -> ServiceResult<PackageEvents> {
    let package = get_package(repo, id).await?;
    let events = repo.package_events(id).await?;
    Ok(PackageEvents {
        package: PackageRef {
            id: package.id,
            package_name: package.package_name,
        },
        events,
    })
}

fn parse_name(value: &Value) -> ValidationResult<String> {
    require_string(value, "Package name", 1, 200)
}

fn parse_price(value: &Value) -> ValidationResult<f64> {
    require_positive_number(value, "Package price")
}

fn parse_description(value: &Value) -> ValidationResult<String> {
    require_string(value, "Description", 1, 1000)
}

fn parse_discount(value: &Value) -> ValidationResult<f64> {
    let discount = require_non_negative_number(value, "Discount")?;
    if discount > 100.0 {
        return Err(ValidationFailure::ExceedsLimit {
            label: "Discount".to_string(),
            limit: "100".to_string(),
        });
    }
    Ok(discount)
}

/// `event_ids` when sent: an empty list unlinks everything.
fn parse_event_ids(body: &Record) -> ValidationResult<Option<Vec<EventId>>> {
    let Some(value) = body.get("event_ids") else {
        return Ok(None);
    };
    let empty = match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty() || s.trim() == "[]",
        _ => false,
    };
    if empty {
        return Ok(Some(Vec::new()));
    }
    let mut ids: Vec<EventId> = Vec::new();
    for id in require_id_list(value, "event_ids")? {
        let id = EventId::new(id);
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(Some(ids))
}

/// Replace the event links of a package. A failure leaves the package in
/// place and is only logged.
async fn link_events(repo: &dyn FullRepository, id: PackageId, event_ids: &[EventId]) {
    if let Err(e) = repo.replace_package_events(id, event_ids).await {
        log::warn!("Package {} saved but its events could not be linked: {}", id, e);
    }
}

pub async fn create_package(repo: &dyn FullRepository, body: &Record) -> ServiceResult<Package> {
    require_fields(body, &["package_name", "package_price"])?;
    let package_name = parse_name(required(body, "package_name")?)?;
    let package_price = parse_price(required(body, "package_price")?)?;
    let description = field(body, "description").map(parse_description).transpose()?;
    let discount_percent = field(body, "discount_percent").map(parse_discount).transpose()?;
    let active = field(body, "active")
        .map(|v| require_bool(v, "active"))
        .transpose()?
        .unwrap_or(true);
    let requested_slug = optional_string(body, "package_slug", "Package slug", 200)?;
    let event_ids = parse_event_ids(body)?.unwrap_or_default();

    let base = requested_slug.unwrap_or_else(|| package_name.clone());
    let package_slug = unique_slug(&base, "package", |candidate| async move {
        repo.package_slug_exists(&candidate).await
    })
    .await?;

    let package = repo
        .insert_package(NewPackage {
            package_name,
            package_slug,
            description,
            package_price,
            discount_percent,
            active,
        })
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => ServiceError::conflict("A package with this slug already exists"),
            other => other,
        })?;
    log::info!("Created package {} ({})", package.id, package.package_slug);

    if !event_ids.is_empty() {
        link_events(repo, package.id, &event_ids).await;
    }
    Ok(package)
}

fn parse_changes(body: &Record) -> ValidationResult<PackageChanges> {
    Ok(PackageChanges {
        package_name: provided(body, "package_name", parse_name)?,
        description: nullable(body, "description", parse_description)?,
        package_price: provided(body, "package_price", parse_price)?,
        discount_percent: nullable(body, "discount_percent", parse_discount)?,
        active: provided(body, "active", |v| require_bool(v, "active"))?,
    })
}

/// Apply the fields present in `body`. When `event_ids` is sent the links
/// are replaced with it.
pub async fn update_package(
    repo: &dyn FullRepository,
    id: PackageId,
    body: &Record,
) -> ServiceResult<Package> {
    let changes = parse_changes(body)?;
    let event_ids = parse_event_ids(body)?;

    let package = if changes.is_empty() {
        get_package(repo, id).await?
    } else {
        repo.update_package(id, &changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Package not found"))?
    };

    if let Some(event_ids) = event_ids {
        link_events(repo, id, &event_ids).await;
    }
    Ok(package)
}

/// Delete a package no sale references, unlinking its events first.
pub async fn delete_package(repo: &dyn FullRepository, id: PackageId) -> ServiceResult<Package> {
    let package = get_package(repo, id).await?;
    if repo.package_has_sales(id).await? {
        return Err(ServiceError::conflict(
            "Cannot delete a package that has registered sales",
        ));
    }
    repo.replace_package_events(id, &[]).await?;
    if !repo.delete_package(id).await? {
        return Err(ServiceError::not_found("Package not found"));
    }
    log::info!("Deleted package {} ({})", id, package.package_slug);
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{CatalogRepository, SalesRepository};
    use crate::models::sale::DEFAULT_PAYMENT_METHOD;
    use chrono::NaiveDate;
    use serde_json::json;

    fn body(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn seed_event(repo: &LocalRepository, slug: &str) -> EventId {
        repo.insert_event(NewEvent {
            event_name: slug.to_string(),
            event_slug: slug.to_string(),
            event_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            event_type: None,
            city: "Tarija".to_string(),
            venue_name: None,
            capacity: None,
            ticket_price: 40.0,
            status: EventStatus::Activo,
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_create_package_links_events() {
        let repo = LocalRepository::new();
        let a = seed_event(&repo, "noche-1").await;
        let b = seed_event(&repo, "noche-2").await;

        let package = create_package(
            &repo,
            &body(json!({
                "package_name": "Pase Completo",
                "package_price": "180",
                "discount_percent": 10,
                "event_ids": format!("[{}, {}]", a, b)
            })),
        )
        .await
        .unwrap();

        assert_eq!(package.package_slug, "pase-completo");
        assert!(package.active);
        assert_eq!(package.discount_percent, Some(10.0));

        let linked = package_events(&repo, package.id).await.unwrap();
        assert_eq!(linked.package.package_name, "Pase Completo");
        let ids: Vec<EventId> = linked.events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);

        let json = serde_json::to_value(&linked).unwrap();
        assert_eq!(json["package"]["id"], package.id.value());
    }

    #[tokio::test]
    async fn test_link_failure_keeps_package() {
        let repo = LocalRepository::new();
        let package = create_package(
            &repo,
            &body(json!({"package_name": "VIP", "package_price": 300, "event_ids": [404]})),
        )
        .await
        .unwrap();

        assert!(repo.get_package(package.id).await.unwrap().is_some());
        assert!(package_events(&repo, package.id).await.unwrap().events.is_empty());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let repo = LocalRepository::new();
        let cases = vec![
            (json!({"package_price": 10}), "Field 'package_name' is required"),
            (json!({"package_name": "VIP", "package_price": -5}), "Package price must be greater than 0"),
            (
                json!({"package_name": "VIP", "package_price": 5, "discount_percent": 120}),
                "Discount cannot exceed 100",
            ),
            (
                json!({"package_name": "VIP", "package_price": 5, "active": "maybe"}),
                "active must be true or false",
            ),
        ];
        for (request, message) in cases {
            assert_eq!(
                create_package(&repo, &body(request)).await.unwrap_err().to_string(),
                message
            );
        }
    }

    #[tokio::test]
    async fn test_update_replaces_links_only_when_sent() {
        let repo = LocalRepository::new();
        let a = seed_event(&repo, "a").await;
        let b = seed_event(&repo, "b").await;
        let package = create_package(
            &repo,
            &body(json!({"package_name": "Duo", "package_price": 70, "event_ids": [a.value()]})),
        )
        .await
        .unwrap();

        let renamed = update_package(&repo, package.id, &body(json!({"package_price": 65, "description": null})))
            .await
            .unwrap();
        assert_eq!(renamed.package_price, 65.0);
        assert_eq!(package_events(&repo, package.id).await.unwrap().events.len(), 1);

        update_package(&repo, package.id, &body(json!({"event_ids": [b.value()]})))
            .await
            .unwrap();
        let events = package_events(&repo, package.id).await.unwrap().events;
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![b]);

        update_package(&repo, package.id, &body(json!({"event_ids": []})))
            .await
            .unwrap();
        assert!(package_events(&repo, package.id).await.unwrap().events.is_empty());

        assert!(matches!(
            update_package(&repo, PackageId::new(99), &body(json!({"active": false}))).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_package() {
        let repo = LocalRepository::new();
        let event = seed_event(&repo, "solo").await;
        let sold = create_package(&repo, &body(json!({"package_name": "Sold", "package_price": 10})))
            .await
            .unwrap();
        let spare = create_package(
            &repo,
            &body(json!({"package_name": "Spare", "package_price": 10, "event_ids": [event.value()]})),
        )
        .await
        .unwrap();
        repo.insert_sale(NewSale {
            sale_type: SaleType::Package,
            package_id: Some(sold.id),
            customer_name: "Ana".to_string(),
            customer_phone: None,
            customer_email: None,
            ticket_quantity: 1,
            unit_price: 10.0,
            total_amount: 10.0,
            team_leader: None,
            rrpp_name: None,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            payment_status: PaymentStatus::Pagado,
            city: None,
            receipt_filename: None,
        })
        .await
        .unwrap();

        assert!(matches!(delete_package(&repo, sold.id).await, Err(ServiceError::Conflict(_))));
        assert!(repo.package_has_sales(sold.id).await.unwrap());

        assert_eq!(delete_package(&repo, spare.id).await.unwrap().package_name, "Spare");
        assert!(matches!(get_package(&repo, spare.id).await, Err(ServiceError::NotFound(_))));

        let listed = list_packages(&repo, &body(json!({"active_only": "true"}))).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
