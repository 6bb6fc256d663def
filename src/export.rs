use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::constants::*;
use crate::database::Db;
use crate::error::AppError;
use crate::expenses::query_expenses;
use crate::models::{Expense, ExpenseFilter, ExportQuery, ExportResponse};
use crate::utils::format_date;

const FILENAME_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// Writes expenses in the import format: `date,amount,category,description,user`.
pub fn expenses_to_csv(expenses: &[Expense]) -> Result<String, AppError> {
    let csv_error = |e: csv::Error| AppError::Database(format!("failed to write CSV: {e}"));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER).map_err(csv_error)?;
    for expense in expenses {
        writer
            .write_record([
                format_date(expense.date)?,
                expense.amount.to_string(),
                expense.category.name.clone(),
                expense.description.clone().unwrap_or_default(),
                expense.user.name.clone(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Database(format!("failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::Database(format!("CSV is not UTF-8: {e}")))
}

pub fn export_filename(now: OffsetDateTime) -> Result<String, AppError> {
    let stamp = now
        .format(FILENAME_TIMESTAMP_FORMAT)
        .map_err(|e| AppError::Database(format!("failed to format export time: {e}")))?;
    Ok(format!("expenses_{stamp}.csv"))
}

pub async fn export_csv(
    State(db): State<Db>,
    Query(query): Query<ExportQuery>,
) -> Result<(StatusCode, Json<ExportResponse>), AppError> {
    let filter = ExpenseFilter {
        user_id: query.user_id,
        category_id: query.category_id,
        start_date: query.start_date,
        end_date: query.end_date,
        offset: 0,
        limit: Some(EXPORT_ROW_LIMIT),
    };

    let expenses = query_expenses(&db, &filter).await?;
    let csv_content = expenses_to_csv(&expenses)?;
    let filename = export_filename(OffsetDateTime::now_utc())?;

    tracing::info!(rows = expenses.len(), %filename, "Exported expenses");
    Ok((
        StatusCode::OK,
        Json(ExportResponse {
            csv_content,
            filename,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, User};
    use time::macros::{date, datetime};

    fn expense(amount: f64, description: Option<&str>) -> Expense {
        Expense {
            id: "e1".to_string(),
            amount,
            description: description.map(str::to_string),
            date: date!(2025 - 04 - 07),
            user_id: "u1".to_string(),
            category_id: "c1".to_string(),
            created_at: 0,
            updated_at: None,
            user: User {
                id: "u1".to_string(),
                name: "Alice".to_string(),
                color: DEFAULT_COLOR.to_string(),
                created_at: 0,
            },
            category: Category {
                id: "c1".to_string(),
                name: "Food".to_string(),
                color: DEFAULT_COLOR.to_string(),
                is_default: true,
                created_at: 0,
            },
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let csv = expenses_to_csv(&[
            expense(12.5, Some("Lunch, with team")),
            expense(3.0, None),
        ])
        .unwrap();

        assert_eq!(
            csv,
            "date,amount,category,description,user\n\
             2025-04-07,12.5,Food,\"Lunch, with team\",Alice\n\
             2025-04-07,3,Food,,Alice\n"
        );
    }

    #[test]
    fn empty_export_has_only_the_header() {
        assert_eq!(
            expenses_to_csv(&[]).unwrap(),
            "date,amount,category,description,user\n"
        );
    }

    #[test]
    fn filename_uses_compact_timestamp() {
        let filename = export_filename(datetime!(2025-04-07 09:05:03 UTC)).unwrap();

        assert_eq!(filename, "expenses_20250407_090503.csv");
    }
}
