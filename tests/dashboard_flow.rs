use bakery_admin_api::{
    db::{create_pool, run_migrations},
    dto::{
        orders::{CustomerInput, OrderItemInput, SaveOrderRequest},
        pickup_locations::CreatePickupLocationRequest,
        products::CreateProductRequest,
    },
    entity::{OrderState, users::ActiveModel as UserActive},
    middleware::auth::{AuthUser, role},
    services::{dashboard_service, order_service, pickup_location_service, product_service},
    state::AppState,
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, SqlxPostgresConnector, Statement};
use uuid::Uuid;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

// Delivered orders spread over three years feed every dashboard series;
// other states only show up in the delivery stats.
#[tokio::test]
async fn dashboard_series_and_stats_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let admin = create_admin(&state).await?;

    let bread = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Rye Bread".into(),
            price: 100,
        },
    )
    .await?
    .data
    .unwrap();
    let pie = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Apple Pie".into(),
            price: 200,
        },
    )
    .await?
    .data
    .unwrap();
    let store = pickup_location_service::create_pickup_location(
        &state,
        &admin,
        CreatePickupLocationRequest {
            name: "Store".into(),
        },
    )
    .await?
    .data
    .unwrap()
    .id;

    let today = date(2023, 6, 15);
    let orders = [
        (today, OrderState::Delivered, bread.id, 1),
        (today, OrderState::Confirmed, bread.id, 1),
        (today, OrderState::Ready, pie.id, 1),
        (date(2023, 6, 16), OrderState::New, bread.id, 1),
        (date(2023, 6, 3), OrderState::Delivered, bread.id, 2),
        (date(2023, 2, 10), OrderState::Delivered, bread.id, 5),
        (date(2023, 3, 1), OrderState::Cancelled, bread.id, 9),
        (date(2022, 7, 1), OrderState::Delivered, bread.id, 1),
        (date(2021, 1, 20), OrderState::Delivered, pie.id, 2),
        (date(2020, 5, 5), OrderState::Delivered, pie.id, 3),
    ];
    for (due_date, order_state, product_id, quantity) in orders {
        order_service::save_order(
            &state,
            &admin,
            None,
            SaveOrderRequest {
                customer: CustomerInput {
                    full_name: "Ken Tanaka".into(),
                    phone_number: "+1-555-0190".into(),
                    details: None,
                },
                pickup_location_id: store,
                due_date,
                due_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                state: Some(order_state),
                paid: false,
                items: vec![OrderItemInput {
                    product_id,
                    quantity,
                    comment: None,
                }],
            },
        )
        .await?;
    }

    let data = dashboard_service::dashboard_data_for(&state.orm, today, 6, 2023).await?;

    let stats = &data.delivery_stats;
    assert_eq!(stats.due_today, 3);
    assert_eq!(stats.due_tomorrow, 1);
    assert_eq!(stats.delivered_today, 1);
    assert_eq!(stats.not_available_today, 1);
    assert_eq!(stats.new_orders, 1);

    let mut month = vec![None; 30];
    month[2] = Some(1);
    month[14] = Some(1);
    assert_eq!(data.deliveries_this_month, month);

    let mut year = vec![None; 12];
    year[1] = Some(1);
    year[5] = Some(2);
    assert_eq!(data.deliveries_this_year, year);

    // The requested month stays empty even though it has deliveries.
    let mut sales = vec![vec![None; 12]; 3];
    sales[0][1] = Some(500);
    sales[1][6] = Some(100);
    sales[2][0] = Some(400);
    assert_eq!(data.sales_per_month, sales);

    assert_eq!(data.product_deliveries.len(), 1);
    assert_eq!(data.product_deliveries[0].product.name, "Rye Bread");
    assert_eq!(data.product_deliveries[0].count, 3);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, history_items, order_items, orders, customers, products, pickup_locations, users CASCADE",
    ))
    .await?;

    Ok(AppState::new(pool, orm, "test-secret", 1))
}

async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set("admin@vaadin.com".into()),
        password_hash: Set("dummy".into()),
        first_name: Set("Göran".into()),
        last_name: Set("Rich".into()),
        role: Set(role::ADMIN.into()),
        locked: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}
