use bakery_admin_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    middleware::auth::role,
    services::auth_service::hash_password,
};
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use sea_orm::SqlxPostgresConnector;
use uuid::Uuid;

const PRODUCTS: &[(&str, i64)] = &[
    ("Strawberry Bun", 450),
    ("Blueberry Cheese Cake", 1250),
    ("Raspberry Cupcake", 390),
    ("Vanilla Cracker", 250),
    ("Chocolate Donut", 320),
    ("Apple Pie", 1800),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Laura Arnaud", "+1-555-0101"),
    ("Jacob Smith", "+1-555-0134"),
    ("Maria Gomez", "+1-555-0172"),
    ("Ken Tanaka", "+1-555-0190"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&pool, "admin@vaadin.com", "Göran", "Rich", role::ADMIN, "admin", false).await?;
    ensure_user(&pool, "baker@vaadin.com", "Heidi", "Carter", role::BAKER, "baker", false).await?;
    ensure_user(&pool, "barista@vaadin.com", "Malin", "Castro", role::BARISTA, "barista", false).await?;
    // Locked accounts cannot be edited or deleted through the API.
    ensure_user(&pool, "peter@vaadin.com", "Peter", "Bush", role::ADMIN, "peter", true).await?;

    let products = seed_products(&pool).await?;
    let locations = seed_pickup_locations(&pool).await?;
    let orders = seed_orders(&pool, admin_id, &products, &locations).await?;

    println!("Seed completed. Admin ID: {admin_id}, orders created: {orders}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
    user_role: &str,
    password: &str,
    locked: bool,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, role, locked)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, locked = EXCLUDED.locked
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(last_name)
    .bind(user_role)
    .bind(locked)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<Vec<(Uuid, i64)>> {
    let mut ids = Vec::with_capacity(PRODUCTS.len());
    for (name, price) in PRODUCTS {
        let row: (Uuid, i64) = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET price = EXCLUDED.price
            RETURNING id, price
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .fetch_one(pool)
        .await?;
        ids.push(row);
    }

    println!("Seeded products");
    Ok(ids)
}

async fn seed_pickup_locations(pool: &sqlx::PgPool) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::new();
    for name in ["Store", "Bakery"] {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO pickup_locations (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(pool)
        .await?;
        ids.push(row.0);
    }

    println!("Seeded pickup locations");
    Ok(ids)
}

async fn seed_orders(
    pool: &sqlx::PgPool,
    created_by: Uuid,
    products: &[(Uuid, i64)],
    locations: &[Uuid],
) -> anyhow::Result<usize> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 || products.is_empty() || locations.is_empty() {
        println!("Orders already present, skipping");
        return Ok(0);
    }

    let today = Local::now().date_naive();
    let mut created = 0;
    // Spread orders over the past year and the coming week so every dashboard chart has data.
    for offset in -360..=7_i64 {
        if offset % 3 != 0 && offset < 0 {
            continue;
        }
        let due_date = today + Duration::days(offset);
        let state = state_for(offset);
        let index = offset.unsigned_abs() as usize;
        let (full_name, phone) = CUSTOMERS[index % CUSTOMERS.len()];
        let location = locations[index % locations.len()];
        let due_time = NaiveTime::from_hms_opt(8 + (index % 10) as u32, 0, 0).unwrap_or_default();

        insert_order(
            pool,
            created_by,
            due_date,
            due_time,
            state,
            full_name,
            phone,
            location,
            &[products[index % products.len()], products[(index + 2) % products.len()]],
            1 + (index % 4) as i32,
        )
        .await?;
        created += 1;
    }

    println!("Seeded orders");
    Ok(created)
}

fn state_for(offset: i64) -> &'static str {
    match offset {
        o if o < 0 && o % 29 == 0 => "cancelled",
        o if o < 0 => "delivered",
        0 => "ready",
        1 | 2 => "confirmed",
        3 => "problem",
        _ => "new",
    }
}

#[allow(clippy::too_many_arguments)]
async fn insert_order(
    pool: &sqlx::PgPool,
    created_by: Uuid,
    due_date: NaiveDate,
    due_time: NaiveTime,
    state: &str,
    full_name: &str,
    phone: &str,
    location: Uuid,
    products: &[(Uuid, i64)],
    quantity: i32,
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    let customer_id = Uuid::new_v4();
    sqlx::query("INSERT INTO customers (id, full_name, phone_number) VALUES ($1, $2, $3)")
        .bind(customer_id)
        .bind(full_name)
        .bind(phone)
        .execute(&mut *tx)
        .await?;

    let order_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO orders (id, state, due_date, due_time, pickup_location_id, customer_id, paid, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(order_id)
    .bind(state)
    .bind(due_date)
    .bind(due_time)
    .bind(location)
    .bind(customer_id)
    .bind(state == "delivered")
    .bind(created_by)
    .execute(&mut *tx)
    .await?;

    for (product_id, price) in products {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, total_price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price * i64::from(quantity))
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO history_items (id, order_id, message, new_state, created_by)
        VALUES ($1, $2, 'Order placed', 'new', $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(created_by)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
