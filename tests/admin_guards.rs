use bakery_admin_api::{
    db::{create_pool, run_migrations},
    dto::{
        orders::{CustomerInput, OrderItemInput, SaveOrderRequest},
        pickup_locations::CreatePickupLocationRequest,
        products::CreateProductRequest,
        users::{CreateUserRequest, UpdateUserRequest},
    },
    entity::{AuditLogs, audit_logs, users::ActiveModel as UserActive},
    error::AppError,
    middleware::auth::{AuthUser, role},
    routes::params::SearchQuery,
    services::{order_service, pickup_location_service, product_service, user_service},
    state::AppState,
};
use chrono::NaiveTime;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    SqlxPostgresConnector, Statement,
};
use uuid::Uuid;

fn assert_user_friendly<T: std::fmt::Debug>(result: Result<T, AppError>, expected: &str) {
    match result {
        Err(AppError::UserFriendly(message)) => assert_eq!(message, expected),
        other => panic!("expected user-friendly error '{expected}', got {other:?}"),
    }
}

// Integration flow: constraint violations and account guards surface as
// user-friendly conflicts instead of raw database errors.
#[tokio::test]
async fn admin_guards_flow() -> anyhow::Result<()> {
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
    let admin = create_user(&state, "admin@vaadin.com", false).await?;
    let locked = create_user(&state, "peter@vaadin.com", true).await?;

    let cake = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Blueberry Cheese Cake".into(),
            price: 1250,
        },
    )
    .await?
    .data
    .unwrap();
    assert_user_friendly(
        product_service::create_product(
            &state,
            &admin,
            CreateProductRequest {
                name: "Blueberry Cheese Cake".into(),
                price: 990,
            },
        )
        .await,
        product_service::DUPLICATE_NAME,
    );

    let store = pickup_location_service::create_pickup_location(
        &state,
        &admin,
        CreatePickupLocationRequest {
            name: "Bakery".into(),
        },
    )
    .await?
    .data
    .unwrap();

    order_service::save_order(
        &state,
        &admin,
        None,
        SaveOrderRequest {
            customer: CustomerInput {
                full_name: "Maria Gomez".into(),
                phone_number: "+1-555-0172".into(),
                details: Some("Birthday".into()),
            },
            pickup_location_id: store.id,
            due_date: order_service::today(),
            due_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            state: None,
            paid: true,
            items: vec![OrderItemInput {
                product_id: cake.id,
                quantity: 1,
                comment: Some("Candles".into()),
            }],
        },
    )
    .await?;

    // Referenced rows cannot be removed.
    assert_user_friendly(
        product_service::delete_product(&state, &admin, cake.id).await,
        product_service::PRODUCT_IN_USE,
    );
    assert_user_friendly(
        pickup_location_service::delete_pickup_location(&state, &admin, store.id).await,
        pickup_location_service::LOCATION_IN_USE,
    );

    assert_user_friendly(
        user_service::delete_user(&state, &admin, admin.user_id).await,
        user_service::DELETING_SELF_NOT_PERMITTED,
    );
    assert_user_friendly(
        user_service::update_user(
            &state,
            &admin,
            locked.user_id,
            UpdateUserRequest {
                first_name: Some("Pete".into()),
                ..Default::default()
            },
        )
        .await,
        user_service::MODIFY_LOCKED_USER_NOT_PERMITTED,
    );
    assert_user_friendly(
        user_service::delete_user(&state, &admin, locked.user_id).await,
        user_service::MODIFY_LOCKED_USER_NOT_PERMITTED,
    );

    // Accounts created through the API stay editable.
    let barista = user_service::create_user(
        &state,
        &admin,
        CreateUserRequest {
            email: "barista@vaadin.com".into(),
            password: "barista1".into(),
            first_name: "Malin".into(),
            last_name: "Castro".into(),
            role: role::BARISTA.into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(!barista.locked);
    for first_name in ["Mal", "Malin"] {
        let updated = user_service::update_user(
            &state,
            &admin,
            barista.id,
            UpdateUserRequest {
                first_name: Some(first_name.into()),
                ..Default::default()
            },
        )
        .await?
        .data
        .unwrap();
        assert_eq!(updated.first_name, first_name);
        assert!(!updated.locked);
    }

    let found = user_service::list_users(
        &state,
        &admin,
        SearchQuery {
            q: Some("PETER".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(found.meta.unwrap().total, Some(1));

    // Only the successful product insert was audited.
    let audited = AuditLogs::find()
        .filter(audit_logs::Column::Action.eq("product_create"))
        .count(&state.orm)
        .await?;
    assert_eq!(audited, 1);

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

async fn create_user(state: &AppState, email: &str, locked: bool) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        first_name: Set("Test".into()),
        last_name: Set("Admin".into()),
        role: Set(role::ADMIN.into()),
        locked: Set(locked),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}
