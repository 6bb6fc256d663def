//! Monthly spending summaries.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use time::{Date, Month, OffsetDateTime};

use crate::constants::DAILY_AVERAGE_DIVISOR;
use crate::database::Db;
use crate::error::AppError;
use crate::expenses::query_expenses;
use crate::models::{CategorySummary, Expense, ExpenseFilter, MonthlySummary, UserSummary};

/// Returns the first and last day of the given month.
pub fn month_bounds(year: i32, month: u8) -> Result<(Date, Date), AppError> {
    let month = Month::try_from(month)
        .map_err(|_| AppError::BadRequest("Month must be between 1 and 12".to_string()))?;
    let invalid_year = || AppError::BadRequest(format!("Year {year} is out of range"));

    let first = Date::from_calendar_date(year, month, 1).map_err(|_| invalid_year())?;
    let last = Date::from_calendar_date(year, month, month.length(year))
        .map_err(|_| invalid_year())?;
    Ok((first, last))
}

fn percentage_of(amount: f64, total: f64) -> f64 {
    if total > 0.0 { amount / total * 100.0 } else { 0.0 }
}

/// Subtotal and count per group, in order of first appearance.
struct Groups<K> {
    index: HashMap<String, usize>,
    entries: Vec<(K, f64, usize)>,
}

impl<K> Groups<K> {
    fn new() -> Self {
        Groups {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn add(&mut self, id: &str, amount: f64, key: impl FnOnce() -> K) {
        match self.index.get(id) {
            Some(&position) => {
                let entry = &mut self.entries[position];
                entry.1 += amount;
                entry.2 += 1;
            }
            None => {
                self.index.insert(id.to_string(), self.entries.len());
                self.entries.push((key(), amount, 1));
            }
        }
    }
}

/// Aggregates the expenses of one month.
///
/// `expenses` must already be restricted to the month. The daily average
/// always divides by 30, whatever the length of the month.
pub fn summarize(year: i32, month: u8, expenses: &[Expense]) -> MonthlySummary {
    let total_amount: f64 = expenses.iter().map(|e| e.amount).sum();
    let expense_count = expenses.len();
    let daily_average = if expense_count > 0 {
        total_amount / DAILY_AVERAGE_DIVISOR
    } else {
        0.0
    };

    let mut by_category = Groups::new();
    let mut by_user = Groups::new();
    for expense in expenses {
        by_category.add(&expense.category_id, expense.amount, || {
            (
                expense.category_id.clone(),
                expense.category.name.clone(),
                expense.category.color.clone(),
            )
        });
        by_user.add(&expense.user_id, expense.amount, || {
            (
                expense.user_id.clone(),
                expense.user.name.clone(),
                expense.user.color.clone(),
            )
        });
    }

    let categories = by_category
        .entries
        .into_iter()
        .map(|((id, name, color), subtotal, count)| CategorySummary {
            category_id: id,
            category_name: name,
            category_color: color,
            total_amount: subtotal,
            expense_count: count,
            percentage: percentage_of(subtotal, total_amount),
        })
        .collect();

    let users = by_user
        .entries
        .into_iter()
        .map(|((id, name, color), subtotal, count)| UserSummary {
            user_id: id,
            user_name: name,
            user_color: color,
            total_amount: subtotal,
            expense_count: count,
            percentage: percentage_of(subtotal, total_amount),
        })
        .collect();

    MonthlySummary {
        year,
        month,
        total_amount,
        expense_count,
        daily_average,
        categories,
        users,
    }
}

pub async fn monthly_summary(db: &Db, year: i32, month: u8) -> Result<MonthlySummary, AppError> {
    let (first, last) = month_bounds(year, month)?;
    let filter = ExpenseFilter {
        start_date: Some(first),
        end_date: Some(last),
        ..ExpenseFilter::default()
    };

    let expenses = query_expenses(db, &filter).await?;
    Ok(summarize(year, month, &expenses))
}

pub async fn get_monthly_summary(
    State(db): State<Db>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<(StatusCode, Json<MonthlySummary>), AppError> {
    let summary = monthly_summary(&db, year, month).await?;
    Ok((StatusCode::OK, Json(summary)))
}

pub async fn get_current_month_summary(
    State(db): State<Db>,
) -> Result<(StatusCode, Json<MonthlySummary>), AppError> {
    let today = OffsetDateTime::now_utc().date();
    let summary = monthly_summary(&db, today.year(), today.month() as u8).await?;
    Ok((StatusCode::OK, Json(summary)))
}
