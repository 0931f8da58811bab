use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_shop_portal::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "storeadmin", "admin@example.com", "admin123", true).await?;
    let user_id = ensure_user(&pool, "demouser", "user@example.com", "user123", false).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch its id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    grant_role(pool, user_id, "user").await?;
    if admin {
        grant_role(pool, user_id, "admin").await?;
    }

    println!("Ensured user {username} (admin={admin})");
    Ok(user_id)
}

async fn grant_role(pool: &sqlx::PgPool, user_id: Uuid, role: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        SELECT $1, id FROM roles WHERE name = $2
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await?;
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("2x Multiplier", "Doubles down on every coin you make", "19.99", 50),
        ("Text Reverser", "Feed it text, get it back mirrored", "4.99", 200),
        ("Word Counter", "Counts the words in anything you paste", "2.49", 200),
        ("Golden Hoodie", "Pure swagger, no effect", "59.99", 25),
    ];

    for (name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price.parse::<Decimal>()?)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
