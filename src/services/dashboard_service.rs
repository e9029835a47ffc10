//! Dashboard figures for delivered orders.
//!
//! Query results are sparse: a day or month without deliveries has no row.
//! Charts want fixed-length series, so rows are spread into arrays with
//! `None` wherever nothing was delivered.

use chrono::{Datelike, Duration, NaiveDate};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveEnum, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, Statement, Value,
};
use uuid::Uuid;

use crate::{
    dto::dashboard::{DashboardData, DeliveryStats, ProductDeliveries},
    entity::{
        OrderState,
        orders::{Column as OrderCol, Entity as Orders},
        products::Model as ProductModel,
    },
    error::{AppError, AppResult},
    models::Product,
    response::ApiResponse,
    routes::params::DashboardQuery,
    services::order_service::today,
    state::AppState,
};

/// Years covered by the sales matrix, the requested one included.
pub const SALES_YEARS: usize = 3;

/// Spreads `(1-based slot, value)` pairs over `length` slots, `None` where no row exists.
pub fn flatten_and_replace_missing_with_null(length: usize, rows: &[(i32, i64)]) -> Vec<Option<i64>> {
    let mut counts = vec![None; length];
    for &(slot, value) in rows {
        match usize::try_from(slot) {
            Ok(slot) if (1..=length).contains(&slot) => counts[slot - 1] = Some(value),
            _ => tracing::debug!(slot, length, "dropping out of range dashboard slot"),
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromQueryResult)]
pub struct MonthlySales {
    pub year: i32,
    pub month: i32,
    pub total: i64,
}

/// Builds the `SALES_YEARS` x 12 matrix, row 0 being `year`.
///
/// The requested month is left empty since it is still in progress.
pub fn sales_per_month(year: i32, month: u32, rows: &[MonthlySales]) -> Vec<Vec<Option<i64>>> {
    let mut matrix = vec![vec![None; 12]; SALES_YEARS];
    for row in rows {
        let (Ok(y), Ok(m)) = (usize::try_from(year - row.year), usize::try_from(row.month - 1)) else {
            continue;
        };
        if y >= SALES_YEARS || m >= 12 {
            continue;
        }
        if y == 0 && m + 1 == month as usize {
            continue;
        }
        matrix[y][m] = Some(row.total);
    }
    matrix
}

/// First day of the month and first day of the following month.
pub fn month_bounds(year: i32, month: u32) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::BadRequest(format!("Invalid month {month}/{year}"));
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

pub fn days_in_month(year: i32, month: u32) -> AppResult<usize> {
    let (start, end) = month_bounds(year, month)?;
    Ok((end - start).num_days() as usize)
}

fn year_bounds(first_year: i32, last_year: i32) -> AppResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(first_year, 1, 1);
    let end = NaiveDate::from_ymd_opt(last_year + 1, 1, 1);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::BadRequest(format!("Invalid year {last_year}"))),
    }
}

pub async fn delivery_stats<C: ConnectionTrait>(db: &C, today: NaiveDate) -> AppResult<DeliveryStats> {
    let tomorrow = today + Duration::days(1);
    let due_on = |date: NaiveDate| Orders::find().filter(OrderCol::DueDate.eq(date));

    Ok(DeliveryStats {
        due_today: due_on(today).count(db).await?,
        due_tomorrow: due_on(tomorrow).count(db).await?,
        delivered_today: due_on(today)
            .filter(OrderCol::State.eq(OrderState::Delivered))
            .count(db)
            .await?,
        not_available_today: due_on(today)
            .filter(OrderCol::State.is_in(OrderState::not_available()))
            .count(db)
            .await?,
        new_orders: Orders::find()
            .filter(OrderCol::State.eq(OrderState::New))
            .count(db)
            .await?,
    })
}

/// Bind values for `state = $1 AND due_date >= $2 AND due_date < $3`.
fn delivered_between(start: NaiveDate, end: NaiveDate) -> Vec<Value> {
    vec![
        OrderState::Delivered.to_value().into(),
        start.into(),
        end.into(),
    ]
}

#[derive(Debug, FromQueryResult)]
struct SlotCount {
    slot: i32,
    value: i64,
}

async fn delivered_per_slot<C: ConnectionTrait>(
    db: &C,
    unit: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<(i32, i64)>> {
    let sql = format!(
        r#"
        SELECT EXTRACT({unit} FROM o.due_date)::int AS slot, COUNT(*)::bigint AS value
        FROM orders o
        WHERE o.state = $1 AND o.due_date >= $2 AND o.due_date < $3
        GROUP BY 1
        ORDER BY 1
        "#
    );
    let rows = SlotCount::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        delivered_between(start, end),
    ))
    .all(db)
    .await?;
    Ok(rows.into_iter().map(|row| (row.slot, row.value)).collect())
}

pub async fn deliveries_per_day<C: ConnectionTrait>(
    db: &C,
    month: u32,
    year: i32,
) -> AppResult<Vec<Option<i64>>> {
    let (start, end) = month_bounds(year, month)?;
    let rows = delivered_per_slot(db, "DAY", start, end).await?;
    Ok(flatten_and_replace_missing_with_null(days_in_month(year, month)?, &rows))
}

pub async fn deliveries_per_month<C: ConnectionTrait>(db: &C, year: i32) -> AppResult<Vec<Option<i64>>> {
    let (start, end) = year_bounds(year, year)?;
    let rows = delivered_per_slot(db, "MONTH", start, end).await?;
    Ok(flatten_and_replace_missing_with_null(12, &rows))
}

pub async fn sum_per_month_last_three_years<C: ConnectionTrait>(
    db: &C,
    year: i32,
) -> AppResult<Vec<MonthlySales>> {
    let (start, end) = year_bounds(year - (SALES_YEARS as i32 - 1), year)?;
    let rows = MonthlySales::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"
        SELECT EXTRACT(YEAR FROM o.due_date)::int AS year,
               EXTRACT(MONTH FROM o.due_date)::int AS month,
               SUM(oi.quantity * p.price)::bigint AS total
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id
        JOIN products p ON p.id = oi.product_id
        WHERE o.state = $1 AND o.due_date >= $2 AND o.due_date < $3
        GROUP BY 1, 2
        ORDER BY 1 DESC, 2
        "#,
        delivered_between(start, end),
    ))
    .all(db)
    .await?;
    Ok(rows)
}

#[derive(Debug, FromQueryResult)]
struct ProductCountRow {
    id: Uuid,
    name: String,
    price: i64,
    created_at: DateTimeWithTimeZone,
    count: i64,
}

pub async fn count_per_product<C: ConnectionTrait>(
    db: &C,
    month: u32,
    year: i32,
) -> AppResult<Vec<ProductDeliveries>> {
    let (start, end) = month_bounds(year, month)?;
    let rows = ProductCountRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"
        SELECT p.id, p.name, p.price, p.created_at, SUM(oi.quantity)::bigint AS count
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id
        JOIN products p ON p.id = oi.product_id
        WHERE o.state = $1 AND o.due_date >= $2 AND o.due_date < $3
        GROUP BY p.id, p.name, p.price, p.created_at
        ORDER BY p.name
        "#,
        delivered_between(start, end),
    ))
    .all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ProductDeliveries {
            product: Product::from(ProductModel {
                id: row.id,
                name: row.name,
                price: row.price,
                created_at: row.created_at,
            }),
            count: row.count,
        })
        .collect())
}

pub async fn dashboard_data_for<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
    month: u32,
    year: i32,
) -> AppResult<DashboardData> {
    month_bounds(year, month)?;

    let delivery_stats = delivery_stats(db, today).await?;
    let deliveries_this_month = deliveries_per_day(db, month, year).await?;
    let deliveries_this_year = deliveries_per_month(db, year).await?;
    let sales = sum_per_month_last_three_years(db, year).await?;
    let product_deliveries = count_per_product(db, month, year).await?;

    Ok(DashboardData {
        month,
        year,
        delivery_stats,
        deliveries_this_month,
        deliveries_this_year,
        sales_per_month: sales_per_month(year, month, &sales),
        product_deliveries,
    })
}

pub async fn get_dashboard_data(
    state: &AppState,
    query: DashboardQuery,
) -> AppResult<ApiResponse<DashboardData>> {
    let today = today();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());
    // Reject bad input before touching the database.
    month_bounds(year, month)?;

    let data = dashboard_data_for(&state.orm, today, month, year).await?;
    Ok(ApiResponse::single("Dashboard", data))
}
