//! Festival events.

use serde_json::Value;

use crate::api::*;
use crate::db::repository::FullRepository;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::validators::*;
use crate::services::slug::unique_slug;
use crate::services::{list_limit, query_flag};

pub const DEFAULT_LIST_LIMIT: usize = 100;

pub fn parse_filter(query: &Record) -> ValidationResult<EventFilter> {
    Ok(EventFilter {
        status: field(query, "status")
            .map(|v| require_choice::<EventStatus>(v, "status", &EventStatus::labels()))
            .transpose()?,
        city: optional_string(query, "city", "city", 100)?,
        active_only: query_flag(query, "active_only")?,
        limit: Some(list_limit(query, DEFAULT_LIST_LIMIT)?),
    })
}

pub async fn list_events(repo: &dyn FullRepository, filter: &EventFilter) -> ServiceResult<Vec<Event>> {
    Ok(repo.list_events(filter).await?)
}

pub async fn get_event(repo: &dyn FullRepository, id: EventId) -> ServiceResult<Event> {
    repo.get_event(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Event not found"))
}

fn parse_name(value: &Value) -> ValidationResult<String> {
    require_string(value, "Event name", 1, 200)
}

fn parse_city(value: &Value) -> ValidationResult<String> {
    require_string(value, "City", 1, 100)
}

fn parse_price(value: &Value) -> ValidationResult<f64> {
    require_positive_number(value, "Ticket price")
}

fn parse_capacity(value: &Value) -> ValidationResult<i32> {
    require_positive_integer(value, "Capacity")
}

fn parse_status(value: &Value) -> ValidationResult<EventStatus> {
    require_choice::<EventStatus>(value, "Status", &EventStatus::labels())
}

fn parse_new_event(body: &Record) -> ServiceResult<(NewEvent, Option<String>)> {
    let mut failures = Vec::new();
    let name = collect(&mut failures, required(body, "event_name").and_then(parse_name));
    let date = collect(
        &mut failures,
        required(body, "event_date").and_then(|v| require_date(v, "Event date")),
    );
    let city = collect(&mut failures, required(body, "city").and_then(parse_city));
    let price = collect(&mut failures, required(body, "ticket_price").and_then(parse_price));
    let capacity = collect(&mut failures, field(body, "capacity").map(parse_capacity).transpose());
    let status = collect(&mut failures, field(body, "status").map(parse_status).transpose());
    let event_type = collect(&mut failures, optional_string(body, "event_type", "Event type", 100));
    let venue_name = collect(&mut failures, optional_string(body, "venue_name", "Venue name", 200));
    let requested_slug = collect(&mut failures, optional_string(body, "event_slug", "Event slug", 200));

    let (
        Some(event_name),
        Some(event_date),
        Some(city),
        Some(ticket_price),
        Some(capacity),
        Some(status),
        Some(event_type),
        Some(venue_name),
        Some(requested_slug),
    ) = (name, date, city, price, capacity, status, event_type, venue_name, requested_slug)
    else {
        return Err(ServiceError::invalid_fields(failures));
    };

    let event = NewEvent {
        event_name,
        event_slug: String::new(),
        event_date,
        event_type,
        city,
        venue_name,
        capacity,
        ticket_price,
        status: status.unwrap_or_default(),
    };
    Ok((event, requested_slug))
}

pub async fn create_event(repo: &dyn FullRepository, body: &Record) -> ServiceResult<Event> {
    let (mut event, requested_slug) = parse_new_event(body)?;
    let base = requested_slug.unwrap_or_else(|| event.event_name.clone());
    event.event_slug =
        unique_slug(&base, "event", |candidate| async move { repo.event_slug_exists(&candidate).await })
            .await?;

    let created = repo.insert_event(event).await.map_err(|e| match ServiceError::from(e) {
        ServiceError::Conflict(_) => ServiceError::conflict("An event with this slug already exists"),
        other => other,
    })?;
    log::info!("Created event {} ({})", created.id, created.event_slug);
    Ok(created)
}

fn parse_changes(body: &Record) -> ServiceResult<EventChanges> {
    let mut failures = Vec::new();
    let changes = EventChanges {
        event_name: collect(&mut failures, provided(body, "event_name", parse_name)).flatten(),
        event_date: collect(
            &mut failures,
            provided(body, "event_date", |v| require_date(v, "Event date")),
        )
        .flatten(),
        event_type: collect(
            &mut failures,
            nullable(body, "event_type", |v| require_string(v, "Event type", 1, 100)),
        )
        .flatten(),
        city: collect(&mut failures, provided(body, "city", parse_city)).flatten(),
        venue_name: collect(
            &mut failures,
            nullable(body, "venue_name", |v| require_string(v, "Venue name", 1, 200)),
        )
        .flatten(),
        capacity: collect(&mut failures, nullable(body, "capacity", parse_capacity)).flatten(),
        ticket_price: collect(&mut failures, provided(body, "ticket_price", parse_price)).flatten(),
        status: collect(&mut failures, provided(body, "status", parse_status)).flatten(),
    };
    if failures.is_empty() {
        Ok(changes)
    } else {
        Err(ServiceError::invalid_fields(failures))
    }
}

/// Apply the fields present in `body`; the slug never changes.
pub async fn update_event(repo: &dyn FullRepository, id: EventId, body: &Record) -> ServiceResult<Event> {
    let changes = parse_changes(body)?;
    if changes.is_empty() {
        return get_event(repo, id).await;
    }
    repo.update_event(id, &changes)
        .await?
        .ok_or_else(|| ServiceError::not_found("Event not found"))
}

/// Delete an event that no sale references; returns the removed event.
pub async fn delete_event(repo: &dyn FullRepository, id: EventId) -> ServiceResult<Event> {
    let event = get_event(repo, id).await?;
    if repo.event_has_sales(id).await? {
        return Err(ServiceError::conflict(
            "Cannot delete an event that has registered sales",
        ));
    }
    if !repo.delete_event(id).await? {
        return Err(ServiceError::not_found("Event not found"));
    }
    log::info!("Deleted event {} ({})", id, event.event_slug);
    Ok(event)
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

    fn summer_fest() -> Record {
        body(json!({
            "event_name": "Año Nuevo Fest",
            "event_date": "2026-12-31",
            "city": "Cochabamba",
            "ticket_price": "120.5",
            "capacity": 800
        }))
    }

    #[tokio::test]
    async fn test_create_event_derives_slug_and_defaults() {
        let repo = LocalRepository::new();
        let event = create_event(&repo, &summer_fest()).await.unwrap();

        assert_eq!(event.event_slug, "ano-nuevo-fest");
        assert_eq!(event.status, EventStatus::Activo);
        assert_eq!(event.event_date, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert_eq!(event.capacity, Some(800));
        assert_eq!(event.ticket_price, 120.5);
    }

    #[tokio::test]
    async fn test_taken_slug_gets_suffix() {
        let repo = LocalRepository::new();
        let first = create_event(&repo, &summer_fest()).await.unwrap();
        let second = create_event(&repo, &summer_fest()).await.unwrap();

        assert_ne!(first.event_slug, second.event_slug);
        assert!(second.event_slug.starts_with("ano-nuevo-fest-"));

        let mut symbols = summer_fest();
        symbols.insert("event_name".to_string(), json!("¡¿?!"));
        assert_eq!(create_event(&repo, &symbols).await.unwrap().event_slug, "event");
    }

    #[tokio::test]
    async fn test_create_reports_every_invalid_field() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        let err = create_event(
            &repo,
            &body(json!({"event_name": "Fest", "event_date": "31/12/2026", "ticket_price": 0, "status": "open"})),
        )
        .await
        .unwrap_err();

        let ServiceError::Validation { message, details } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(message, "Validation failed");
        assert_eq!(
            details,
            vec![
                "Event date has an invalid format (expected YYYY-MM-DD)".to_string(),
                "Field 'city' is required".to_string(),
                "Ticket price must be greater than 0".to_string(),
                "Status must be one of: activo, planificacion, finalizado, cancelado".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_update() {
        let repo = LocalRepository::new();
        let created = create_event(&repo, &summer_fest()).await.unwrap();

        let updated = update_event(
            &repo,
            created.id,
            &body(json!({"city": "Sucre", "capacity": null, "status": "finalizado"})),
        )
        .await
        .unwrap();
        assert_eq!(updated.city, "Sucre");
        assert_eq!(updated.capacity, None);
        assert_eq!(updated.status, EventStatus::Finalizado);
        assert_eq!(updated.event_name, created.event_name);
        assert_eq!(updated.event_slug, created.event_slug);

        let unchanged = update_event(&repo, created.id, &body(json!({}))).await.unwrap();
        assert_eq!(unchanged, updated);

        assert!(matches!(
            update_event(&repo, created.id, &body(json!({"city": ""}))).await,
            Err(ServiceError::Validation { .. })
        ));
        assert!(matches!(
            update_event(&repo, EventId::new(99), &body(json!({"city": "Tarija"}))).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_refused_while_sales_reference_event() {
        let repo = LocalRepository::new();
        let sold = create_event(&repo, &summer_fest()).await.unwrap();
        let spare = create_event(&repo, &summer_fest()).await.unwrap();

        let sale = repo
            .insert_sale(NewSale {
                sale_type: SaleType::Individual,
                package_id: None,
                customer_name: "Ana".to_string(),
                customer_phone: None,
                customer_email: None,
                ticket_quantity: 1,
                unit_price: 120.5,
                total_amount: 120.5,
                team_leader: None,
                rrpp_name: None,
                payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
                payment_status: PaymentStatus::Pendiente,
                city: None,
                receipt_filename: None,
            })
            .await
            .unwrap();
        repo.link_sale_events(sale.id, &[sold.id]).await.unwrap();

        assert!(matches!(delete_event(&repo, sold.id).await, Err(ServiceError::Conflict(_))));
        assert_eq!(delete_event(&repo, spare.id).await.unwrap().id, spare.id);
        assert!(matches!(delete_event(&repo, spare.id).await, Err(ServiceError::NotFound(_))));
        assert_eq!(repo.event_count(), 1);
        assert!(repo.get_event(sold.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = LocalRepository::new();
        create_event(&repo, &summer_fest()).await.unwrap();
        let mut planned = summer_fest();
        planned.insert("status".to_string(), json!("planificacion"));
        planned.insert("city".to_string(), json!("Tarija"));
        create_event(&repo, &planned).await.unwrap();

        let active = parse_filter(&body(json!({"active_only": "true"}))).unwrap();
        assert_eq!(list_events(&repo, &active).await.unwrap().len(), 1);

        let in_tarija = parse_filter(&body(json!({"city": "Tarija"}))).unwrap();
        assert_eq!(list_events(&repo, &in_tarija).await.unwrap()[0].city, "Tarija");

        assert!(parse_filter(&body(json!({"status": "closed"}))).is_err());
    }
}
