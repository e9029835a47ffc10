use std::collections::{HashMap, HashSet};

use chrono::{Local, NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        AddCommentRequest, ChangeStateRequest, OrderDetails, OrderDraft, OrderList,
        OrderSummaryList, SaveOrderRequest,
    },
    entity::{
        OrderState,
        customers::{ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers},
        history_items::{ActiveModel as HistoryActive, Column as HistoryCol, Entity as HistoryItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        pickup_locations::{Column as LocationCol, Entity as PickupLocations},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderSummary},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, PageRequest, like_pattern, text_filter},
    services::pickup_location_service,
    state::AppState,
};

pub const ORDER_PLACED: &str = "Order placed";
pub const ORDER_EDITED: &str = "Order edited";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Pickup time proposed for new orders.
pub fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default()
}

fn matching_after_due_date(filter: Option<&str>, due_after: Option<NaiveDate>) -> Select<Orders> {
    let finder = Orders::find();
    match (filter, due_after) {
        (Some(filter), Some(date)) => finder
            .inner_join(Customers)
            .filter(Expr::col((Customers, CustomerCol::FullName)).ilike(like_pattern(filter)))
            .filter(OrderCol::DueDate.gt(date)),
        (Some(filter), None) => finder
            .inner_join(Customers)
            .filter(Expr::col((Customers, CustomerCol::FullName)).ilike(like_pattern(filter))),
        (None, Some(date)) => finder.filter(OrderCol::DueDate.gt(date)),
        (None, None) => finder,
    }
}

pub async fn find_any_matching_after_due_date<C: ConnectionTrait>(
    db: &C,
    filter: Option<&str>,
    due_after: Option<NaiveDate>,
    page: PageRequest,
) -> AppResult<Vec<OrderModel>> {
    let orders = matching_after_due_date(filter, due_after)
        .order_by_asc(OrderCol::DueDate)
        .order_by_asc(OrderCol::DueTime)
        .limit(page.limit())
        .offset(page.offset())
        .all(db)
        .await?;
    Ok(orders)
}

pub async fn count_any_matching_after_due_date<C: ConnectionTrait>(
    db: &C,
    filter: Option<&str>,
    due_after: Option<NaiveDate>,
) -> AppResult<u64> {
    Ok(matching_after_due_date(filter, due_after).count(db).await?)
}

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    id: Uuid,
    state: OrderState,
    due_date: NaiveDate,
    due_time: NaiveTime,
    customer_name: String,
    pickup_location: String,
}

#[derive(Debug, FromQueryResult)]
struct OrderTotalRow {
    order_id: Uuid,
    total: i64,
}

pub async fn find_any_matching_starting_today<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
) -> AppResult<Vec<OrderSummary>> {
    let rows = Orders::find()
        .select_only()
        .column(OrderCol::Id)
        .column(OrderCol::State)
        .column(OrderCol::DueDate)
        .column(OrderCol::DueTime)
        .column_as(CustomerCol::FullName, "customer_name")
        .column_as(LocationCol::Name, "pickup_location")
        .inner_join(Customers)
        .inner_join(PickupLocations)
        .filter(OrderCol::DueDate.gte(today))
        .order_by_asc(OrderCol::DueDate)
        .order_by_asc(OrderCol::DueTime)
        .into_model::<SummaryRow>()
        .all(db)
        .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let totals: HashMap<Uuid, i64> = OrderItems::find()
        .select_only()
        .column(OrderItemCol::OrderId)
        .column_as(Expr::cust("SUM(order_items.total_price)::bigint"), "total")
        .filter(OrderItemCol::OrderId.is_in(rows.iter().map(|row| row.id)))
        .group_by(OrderItemCol::OrderId)
        .into_model::<OrderTotalRow>()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.order_id, row.total))
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| OrderSummary {
            total_price: totals.get(&row.id).copied().unwrap_or(0),
            id: row.id,
            state: row.state,
            due_date: row.due_date,
            due_time: row.due_time,
            customer_name: row.customer_name,
            pickup_location: row.pickup_location,
        })
        .collect())
}

pub async fn load_details<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<OrderDetails> {
    let order = Orders::find_by_id(id).one(db).await?.ok_or(AppError::NotFound)?;

    let customer = Customers::find_by_id(order.customer_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order {id} has no customer")))?;
    let pickup_location = PickupLocations::find_by_id(order.pickup_location_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order {id} has no pickup location")))?;
    let items: Vec<_> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .order_by_asc(OrderItemCol::Id)
        .all(db)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    let history = HistoryItems::find()
        .filter(HistoryCol::OrderId.eq(id))
        .order_by_asc(HistoryCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let total_price = items.iter().map(|item| item.total_price).sum();
    Ok(OrderDetails {
        order: order.into(),
        customer: customer.into(),
        pickup_location: pickup_location.into(),
        items,
        history,
        total_price,
    })
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let page = query.page_request();
    let filter = text_filter(query.q.as_deref());
    let due_after = query.effective_due_after(today());

    let total = count_any_matching_after_due_date(&state.orm, filter, due_after).await?;
    let items = find_any_matching_after_due_date(&state.orm, filter, due_after, page)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::for_page(&page, total)),
    ))
}

pub async fn list_upcoming(state: &AppState) -> AppResult<ApiResponse<OrderSummaryList>> {
    let items = find_any_matching_starting_today(&state.orm, today()).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Upcoming orders",
        OrderSummaryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderDetails>> {
    let details = load_details(&state.orm, id).await?;
    Ok(ApiResponse::single("Order", details))
}

pub async fn create_new(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderDraft>> {
    let pickup_location = pickup_location_service::find_default(&state.orm)
        .await?
        .map(Into::into);
    Ok(ApiResponse::single(
        "New order",
        OrderDraft {
            state: OrderState::New,
            due_date: today(),
            due_time: default_due_time(),
            pickup_location,
            created_by: user.user_id,
        },
    ))
}

fn validate_order(payload: &SaveOrderRequest) -> AppResult<()> {
    if payload.customer.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("Customer name must not be empty".into()));
    }
    if payload.customer.phone_number.trim().is_empty() {
        return Err(AppError::BadRequest("Customer phone number must not be empty".into()));
    }
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("An order needs at least one item".into()));
    }
    if let Some(item) = payload.items.iter().find(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest(format!(
            "Quantity for product {} must be positive",
            item.product_id
        )));
    }
    Ok(())
}

/// History entry written when an existing order is saved.
pub fn history_for_update(previous: OrderState, next: OrderState) -> (String, Option<OrderState>) {
    if previous == next {
        (ORDER_EDITED.to_string(), Some(next))
    } else {
        (state_change_message(next), Some(next))
    }
}

/// Price of an order line in cents.
pub fn item_total(unit_price: i64, quantity: i32) -> AppResult<i64> {
    unit_price.checked_mul(i64::from(quantity)).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Total for {quantity} items at {unit_price} cents is out of range"
        ))
    })
}

pub fn state_change_message(state: OrderState) -> String {
    format!("Order {}", state.label())
}

async fn add_history(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    user: &AuthUser,
    message: String,
    new_state: Option<OrderState>,
) -> AppResult<()> {
    HistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        message: Set(message),
        new_state: Set(new_state),
        created_by: Set(Some(user.user_id)),
        created_at: NotSet,
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn unit_prices(
    txn: &DatabaseTransaction,
    payload: &SaveOrderRequest,
) -> AppResult<HashMap<Uuid, i64>> {
    let ids: HashSet<Uuid> = payload.items.iter().map(|item| item.product_id).collect();
    let prices: HashMap<Uuid, i64> = Products::find()
        .filter(ProdCol::Id.is_in(ids.iter().copied()))
        .all(txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product.price))
        .collect();

    if let Some(missing) = ids.iter().find(|id| !prices.contains_key(id)) {
        return Err(AppError::BadRequest(format!("Unknown product {missing}")));
    }
    Ok(prices)
}

pub async fn save_order(
    state: &AppState,
    user: &AuthUser,
    id: Option<Uuid>,
    payload: SaveOrderRequest,
) -> AppResult<ApiResponse<OrderDetails>> {
    validate_order(&payload)?;
    let txn = state.orm.begin().await?;

    if PickupLocations::find_by_id(payload.pickup_location_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "Unknown pickup location {}",
            payload.pickup_location_id
        )));
    }
    let prices = unit_prices(&txn, &payload).await?;
    let now = Utc::now();

    let order = match id {
        None => {
            let customer = CustomerActive {
                id: Set(Uuid::new_v4()),
                full_name: Set(payload.customer.full_name.trim().to_string()),
                phone_number: Set(payload.customer.phone_number.trim().to_string()),
                details: Set(payload.customer.details.clone()),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;

            let initial_state = payload.state.unwrap_or(OrderState::New);
            let order = OrderActive {
                id: Set(Uuid::new_v4()),
                state: Set(initial_state),
                due_date: Set(payload.due_date),
                due_time: Set(payload.due_time),
                pickup_location_id: Set(payload.pickup_location_id),
                customer_id: Set(customer.id),
                paid: Set(payload.paid),
                created_by: Set(Some(user.user_id)),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&txn)
            .await?;

            add_history(&txn, order.id, user, ORDER_PLACED.to_string(), Some(initial_state)).await?;
            order
        }
        Some(id) => {
            let existing = Orders::find_by_id(id)
                .lock(LockType::Update)
                .one(&txn)
                .await?
                .ok_or(AppError::NotFound)?;

            let customer = Customers::find_by_id(existing.customer_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order {id} has no customer")))?;
            let mut customer: CustomerActive = customer.into();
            customer.full_name = Set(payload.customer.full_name.trim().to_string());
            customer.phone_number = Set(payload.customer.phone_number.trim().to_string());
            customer.details = Set(payload.customer.details.clone());
            customer.update(&txn).await?;

            let previous_state = existing.state;
            let next_state = payload.state.unwrap_or(previous_state);

            let mut active: OrderActive = existing.into();
            active.state = Set(next_state);
            active.due_date = Set(payload.due_date);
            active.due_time = Set(payload.due_time);
            active.pickup_location_id = Set(payload.pickup_location_id);
            active.paid = Set(payload.paid);
            active.updated_at = Set(now.into());
            let order = active.update(&txn).await?;

            OrderItems::delete_many()
                .filter(OrderItemCol::OrderId.eq(order.id))
                .exec(&txn)
                .await?;

            let (message, new_state) = history_for_update(previous_state, next_state);
            add_history(&txn, order.id, user, message, new_state).await?;
            order
        }
    };

    for item in &payload.items {
        let unit_price = prices.get(&item.product_id).copied().unwrap_or_default();
        let total_price = item_total(unit_price, item.quantity)?;
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            comment: Set(item.comment.clone().filter(|c| !c.trim().is_empty())),
            total_price: Set(total_price),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    let created = id.is_none();
    tracing::info!(order_id = %order.id, created, "order saved");
    audit::record(
        &state.pool,
        user.user_id,
        if created { "order_create" } else { "order_update" },
        "orders",
        serde_json::json!({ "order_id": order.id, "state": order.state }),
    )
    .await;

    let details = load_details(&state.orm, order.id).await?;
    Ok(ApiResponse::single(
        if created { "Order created" } else { "Order updated" },
        details,
    ))
}

pub async fn add_comment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddCommentRequest,
) -> AppResult<ApiResponse<OrderDetails>> {
    let comment = payload.comment.trim();
    if comment.is_empty() {
        return Err(AppError::BadRequest("Comment must not be empty".into()));
    }

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    add_history(&txn, order.id, user, comment.to_string(), Some(order.state)).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_comment",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    let details = load_details(&state.orm, id).await?;
    Ok(ApiResponse::single("Comment added", details))
}

pub async fn change_state(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ChangeStateRequest,
) -> AppResult<ApiResponse<OrderDetails>> {
    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.state != payload.state {
        let previous = order.state;
        let mut active: OrderActive = order.into();
        active.state = Set(payload.state);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
        add_history(&txn, id, user, state_change_message(payload.state), Some(payload.state)).await?;
        txn.commit().await?;

        tracing::info!(order_id = %id, from = previous.label(), to = payload.state.label(), "order state changed");
        audit::record(
            &state.pool,
            user.user_id,
            "order_state_change",
            "orders",
            serde_json::json!({ "order_id": id, "state": payload.state }),
        )
        .await;
    } else {
        txn.commit().await?;
    }

    let details = load_details(&state.orm, id).await?;
    Ok(ApiResponse::single("Order state", details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::{CustomerInput, OrderItemInput};
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn line_totals_reject_overflow() {
        assert_eq!(item_total(450, 3).unwrap(), 1350);
        assert!(matches!(
            item_total(200_000_000_000_000_000, 100),
            Err(AppError::BadRequest(_))
        ));
    }

    fn sql(filter: Option<&str>, due_after: Option<NaiveDate>) -> String {
        matching_after_due_date(filter, due_after)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn name_and_date_filter() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let sql = sql(Some("ann"), Some(date));
        assert!(sql.contains("INNER JOIN \"customers\""), "{sql}");
        assert!(sql.contains("\"customers\".\"full_name\" ILIKE '%ann%'"), "{sql}");
        assert!(sql.contains("\"orders\".\"due_date\" > '2024-05-01'"), "{sql}");
    }

    #[test]
    fn name_only_filter() {
        let sql = sql(Some("ann"), None);
        assert!(sql.contains("ILIKE '%ann%'"), "{sql}");
        assert!(!sql.contains("due_date\" >"), "{sql}");
    }

    #[test]
    fn date_only_filter_skips_customer_join() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let sql = sql(None, Some(date));
        assert!(!sql.contains("JOIN"), "{sql}");
        assert!(sql.contains("\"orders\".\"due_date\" > '2024-05-01'"), "{sql}");
    }

    #[test]
    fn no_filter_selects_all_orders() {
        let sql = sql(None, None);
        assert!(!sql.contains("WHERE"), "{sql}");
    }

    #[test]
    fn update_history_messages() {
        assert_eq!(
            history_for_update(OrderState::New, OrderState::New),
            (ORDER_EDITED.to_string(), Some(OrderState::New))
        );
        assert_eq!(
            history_for_update(OrderState::Ready, OrderState::Delivered),
            ("Order delivered".to_string(), Some(OrderState::Delivered))
        );
    }

    #[test]
    fn new_orders_are_due_at_four() {
        assert_eq!(default_due_time(), NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }

    fn request(items: Vec<OrderItemInput>) -> SaveOrderRequest {
        SaveOrderRequest {
            customer: CustomerInput {
                full_name: "Ann Baker".into(),
                phone_number: "+358 555 0101".into(),
                details: None,
            },
            pickup_location_id: Uuid::new_v4(),
            due_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            due_time: default_due_time(),
            state: None,
            paid: false,
            items,
        }
    }

    #[test]
    fn orders_need_positive_items() {
        assert!(matches!(
            validate_order(&request(vec![])),
            Err(AppError::BadRequest(_))
        ));
        let zero = OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
            comment: None,
        };
        assert!(matches!(
            validate_order(&request(vec![zero])),
            Err(AppError::BadRequest(_))
        ));
        let ok = OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity: 2,
            comment: Some("no nuts".into()),
        };
        assert!(validate_order(&request(vec![ok])).is_ok());
    }

    #[test]
    fn orders_need_a_customer_name() {
        let mut payload = request(vec![OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
            comment: None,
        }]);
        payload.customer.full_name = "  ".into();
        assert!(matches!(validate_order(&payload), Err(AppError::BadRequest(_))));
    }
}
