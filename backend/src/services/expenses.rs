//! Expense categories and expense records.

use chrono::{NaiveDate, Utc};

use crate::api::*;
use crate::db::repository::FullRepository;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::validators::*;
use crate::services::{list_limit, receipts, Submission};
use crate::storage::ObjectStorage;

pub const DEFAULT_LIST_LIMIT: usize = 100;

pub async fn list_categories(repo: &dyn FullRepository) -> ServiceResult<Vec<ExpenseCategory>> {
    Ok(repo.list_categories().await?)
}

pub fn parse_filter(query: &Record) -> ValidationResult<ExpenseFilter> {
    Ok(ExpenseFilter {
        category_id: field(query, "category_id")
            .map(|v| require_id(v, "category_id").map(CategoryId::new))
            .transpose()?,
        status: field(query, "status")
            .map(|v| require_choice::<ExpenseStatus>(v, "status", &ExpenseStatus::labels()))
            .transpose()?,
        event_id: field(query, "event_id")
            .map(|v| require_id(v, "event_id").map(EventId::new))
            .transpose()?,
        limit: Some(list_limit(query, DEFAULT_LIST_LIMIT)?),
    })
}

fn with_receipt_url(storage: &dyn ObjectStorage, mut details: ExpenseDetails) -> ExpenseDetails {
    details.receipt_url =
        receipts::public_url(storage, details.expense.receipt_filename.as_deref());
    details
}

pub async fn list_expenses(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    filter: &ExpenseFilter,
) -> ServiceResult<Vec<ExpenseDetails>> {
    let expenses = repo.list_expenses(filter).await?;
    Ok(expenses
        .into_iter()
        .map(|d| with_receipt_url(storage, d))
        .collect())
}

pub async fn get_expense(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    id: ExpenseId,
) -> ServiceResult<ExpenseDetails> {
    let details = repo
        .get_expense(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Expense not found"))?;
    Ok(with_receipt_url(storage, details))
}

struct ExpenseRequest {
    event_id: Option<EventId>,
    category_id: CategoryId,
    subcategory_id: SubcategoryId,
    description: String,
    amount: f64,
    quantity: i32,
    vendor_name: Option<String>,
    invoice_number: Option<String>,
    expense_date: NaiveDate,
}

fn parse_request(body: &Record) -> ValidationResult<ExpenseRequest> {
    require_fields(body, &["category_id", "subcategory_id", "description", "amount"])?;

    let category_id = CategoryId::new(require_id(required(body, "category_id")?, "category_id")?);
    let subcategory_id =
        SubcategoryId::new(require_id(required(body, "subcategory_id")?, "subcategory_id")?);
    let description = require_string(required(body, "description")?, "Description", 3, 500)?;
    let amount = require_positive_number(required(body, "amount")?, "Amount")?;
    let quantity = field(body, "quantity").map_or(Ok(1), |v| require_positive_integer(v, "Quantity"))?;
    let expense_date = field(body, "expense_date")
        .map(|v| require_date(v, "Expense date"))
        .transpose()?
        .unwrap_or_else(|| Utc::now().date_naive());

    Ok(ExpenseRequest {
        event_id: field(body, "event_id")
            .map(|v| require_id(v, "event_id").map(EventId::new))
            .transpose()?,
        category_id,
        subcategory_id,
        description,
        amount,
        quantity,
        vendor_name: optional_string(body, "vendor_name", "Vendor name", 200)?,
        invoice_number: optional_string(body, "invoice_number", "Invoice number", 100)?,
        expense_date,
    })
}

/// Record a new expense awaiting approval.
pub async fn create_expense(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    submission: Submission,
    max_upload_bytes: usize,
) -> ServiceResult<ExpenseDetails> {
    let Submission { fields: body, receipt } = submission;
    let request = parse_request(&body)?;
    if let Some(upload) = &receipt {
        receipts::check(upload, max_upload_bytes)?;
    }

    repo.get_category(request.category_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Category not found"))?;
    let subcategory = repo
        .get_subcategory(request.subcategory_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Subcategory not found"))?;
    if subcategory.category_id != request.category_id {
        return Err(ServiceError::validation(
            "Subcategory does not belong to the selected category",
        ));
    }
    if let Some(event_id) = request.event_id {
        repo.get_event(event_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event not found"))?;
    }

    let receipt_key = match receipt {
        Some(upload) => Some(receipts::store(storage, upload).await?),
        None => None,
    };

    let new_expense = NewExpense {
        event_id: request.event_id,
        category_id: request.category_id,
        subcategory_id: request.subcategory_id,
        description: request.description,
        amount: request.amount,
        quantity: request.quantity,
        unit_price: request.amount / f64::from(request.quantity),
        vendor_name: request.vendor_name,
        invoice_number: request.invoice_number,
        receipt_filename: receipt_key.clone(),
        status: ExpenseStatus::Pendiente,
        expense_date: request.expense_date,
    };
    let expense = match repo.insert_expense(new_expense).await {
        Ok(expense) => expense,
        Err(e) => {
            if let Some(key) = &receipt_key {
                receipts::discard(storage, key).await;
            }
            return Err(e.into());
        }
    };
    log::info!("Recorded expense {} for {:.2}", expense.id, expense.amount);

    let details = repo
        .get_expense(expense.id)
        .await?
        .unwrap_or_else(|| ExpenseDetails::new(expense));
    Ok(with_receipt_url(storage, details))
}

/// Move an expense through the approval workflow. Approval stamps today's
/// date as the payment date; other transitions keep the stored one.
pub async fn set_status(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    id: ExpenseId,
    body: &Record,
) -> ServiceResult<ExpenseDetails> {
    let labels = ExpenseStatus::labels();
    let invalid = || ValidationFailure::InvalidChoice {
        label: "Status".to_string(),
        allowed: labels.join(", "),
    };
    let status = field(body, "status")
        .ok_or_else(invalid)
        .and_then(|v| require_choice::<ExpenseStatus>(v, "Status", &labels))?;
    let payment_date = (status == ExpenseStatus::Aprobado).then(|| Utc::now().date_naive());

    let expense = repo
        .set_expense_status(id, status, payment_date)
        .await?
        .ok_or_else(|| ServiceError::not_found("Expense not found"))?;
    let details = repo
        .get_expense(id)
        .await?
        .unwrap_or_else(|| ExpenseDetails::new(expense));
    Ok(with_receipt_url(storage, details))
}

/// Delete an expense, then its receipt.
pub async fn delete_expense(
    repo: &dyn FullRepository,
    storage: &dyn ObjectStorage,
    id: ExpenseId,
) -> ServiceResult<()> {
    let removed = repo
        .delete_expense(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Expense not found"))?;
    if let Some(key) = &removed.receipt_filename {
        receipts::discard(storage, key).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::ExpenseRepository;
    use crate::services::validators::MAX_UPLOAD_BYTES;
    use crate::storage::{LocalStorage, Upload};
    use serde_json::{json, Value};

    fn body(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    /// Repository with two categories; returns (repo, cat_a, sub_a, sub_b).
    async fn seeded() -> (LocalRepository, CategoryId, SubcategoryId, SubcategoryId) {
        let repo = LocalRepository::new();
        let a = repo.seed_category("Producción", Some("🎛️"), &["Sonido", "Luces"]);
        let b = repo.seed_category("Marketing", None, &["Redes"]);
        let categories = repo.list_categories().await.unwrap();
        let first_sub = |id: CategoryId| {
            categories.iter().find(|c| c.id == id).unwrap().subcategories[0].id
        };
        let (sub_a, sub_b) = (first_sub(a), first_sub(b));
        (repo, a, sub_a, sub_b)
    }

    fn request(category: CategoryId, subcategory: SubcategoryId) -> Record {
        body(json!({
            "category_id": category.value(),
            "subcategory_id": subcategory.value().to_string(),
            "description": "Line array rental",
            "amount": "900",
            "quantity": 3
        }))
    }

    #[tokio::test]
    async fn test_create_expense_defaults() {
        let (repo, cat, sub, _) = seeded().await;
        let storage = LocalStorage::new();

        let created = create_expense(&repo, &storage, Submission::new(request(cat, sub)), MAX_UPLOAD_BYTES)
            .await
            .unwrap();

        assert_eq!(created.expense.unit_price, 300.0);
        assert_eq!(created.expense.status, ExpenseStatus::Pendiente);
        assert_eq!(created.expense.expense_date, Utc::now().date_naive());
        assert_eq!(created.category_name.as_deref(), Some("Producción"));
        assert_eq!(created.subcategory_name.as_deref(), Some("Sonido"));
        assert!(created.receipt_url.is_none());
    }

    #[tokio::test]
    async fn test_subcategory_must_belong_to_category() {
        let (repo, cat, _, foreign) = seeded().await;
        let storage = LocalStorage::new();
        let upload = Upload {
            file_name: "factura.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1, 2],
        };

        let err = create_expense(
            &repo,
            &storage,
            Submission::new(request(cat, foreign)).with_receipt(upload),
            MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Subcategory does not belong to the selected category");
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_references_are_not_found() {
        let (repo, cat, sub, _) = seeded().await;
        let storage = LocalStorage::new();

        let mut unknown_category = request(CategoryId::new(99), sub);
        assert!(matches!(
            create_expense(&repo, &storage, Submission::new(unknown_category.clone()), MAX_UPLOAD_BYTES).await,
            Err(ServiceError::NotFound(m)) if m == "Category not found"
        ));

        unknown_category.insert("category_id".to_string(), json!(cat.value()));
        unknown_category.insert("subcategory_id".to_string(), json!(99));
        assert!(matches!(
            create_expense(&repo, &storage, Submission::new(unknown_category), MAX_UPLOAD_BYTES).await,
            Err(ServiceError::NotFound(m)) if m == "Subcategory not found"
        ));

        let mut with_event = request(cat, sub);
        with_event.insert("event_id".to_string(), json!(5));
        assert!(matches!(
            create_expense(&repo, &storage, Submission::new(with_event), MAX_UPLOAD_BYTES).await,
            Err(ServiceError::NotFound(m)) if m == "Event not found"
        ));
    }

    #[tokio::test]
    async fn test_field_validation() {
        let repo = LocalRepository::new();
        let storage = LocalStorage::new();
        let cases = vec![
            (json!({"category_id": 1, "subcategory_id": 1, "description": "Luz"}), "Field 'amount' is required"),
            (
                json!({"category_id": 1, "subcategory_id": 1, "description": "ab", "amount": 5}),
                "Description must be at least 3 characters",
            ),
            (
                json!({"category_id": 1, "subcategory_id": 1, "description": "Luces", "amount": 5, "quantity": 0}),
                "Quantity must be greater than 0",
            ),
            (
                json!({"category_id": 1, "subcategory_id": 1, "description": "Luces", "amount": 5, "expense_date": "5/1/2026"}),
                "Expense date has an invalid format (expected YYYY-MM-DD)",
            ),
        ];
        for (request, message) in cases {
            let err = create_expense(&repo, &storage, Submission::new(body(request)), MAX_UPLOAD_BYTES)
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[tokio::test]
    async fn test_status_workflow_and_delete() {
        let (repo, cat, sub, _) = seeded().await;
        let storage = LocalStorage::new();
        let upload = Upload {
            file_name: "factura.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1],
        };
        let created = create_expense(
            &repo,
            &storage,
            Submission::new(request(cat, sub)).with_receipt(upload),
            MAX_UPLOAD_BYTES,
        )
        .await
        .unwrap();
        let id = created.expense.id;
        assert!(created.receipt_url.is_some());

        let approved = set_status(&repo, &storage, id, &body(json!({"status": "aprobado"})))
            .await
            .unwrap();
        assert_eq!(approved.expense.status, ExpenseStatus::Aprobado);
        assert_eq!(approved.expense.payment_date, Some(Utc::now().date_naive()));

        let rejected = set_status(&repo, &storage, id, &body(json!({"status": "rechazado"})))
            .await
            .unwrap();
        assert_eq!(rejected.expense.payment_date, approved.expense.payment_date);

        assert_eq!(
            set_status(&repo, &storage, id, &body(json!({"status": "pagado"})))
                .await
                .unwrap_err()
                .to_string(),
            "Status must be one of: pendiente, aprobado, rechazado"
        );

        let filter = parse_filter(&body(json!({"status": "rechazado"}))).unwrap();
        assert_eq!(list_expenses(&repo, &storage, &filter).await.unwrap().len(), 1);

        delete_expense(&repo, &storage, id).await.unwrap();
        assert_eq!(storage.object_count(), 0);
        assert!(matches!(
            get_expense(&repo, &storage, id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
