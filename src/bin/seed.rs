use grocery_storefront_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    models::{ProductUnit, Role},
    services::auth_service::hash_password,
    slug,
};
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    unit: ProductUnit,
    subcategory: Option<&'static str>,
    featured: bool,
    stock: i32,
}

struct SeedCategory {
    name: &'static str,
    description: &'static str,
    subcategories: &'static [&'static str],
    products: &'static [SeedProduct],
}

const CATALOGUE: &[SeedCategory] = &[
    SeedCategory {
        name: "Frutas y Verduras",
        description: "Fruta de temporada y verdura fresca",
        subcategories: &["Frutas", "Verduras"],
        products: &[
            SeedProduct {
                name: "Plátano de Canarias",
                description: "Plátanos maduros de Canarias",
                price: 239,
                unit: ProductUnit::Kg,
                subcategory: Some("Frutas"),
                featured: true,
                stock: 120,
            },
            SeedProduct {
                name: "Manzana Golden",
                description: "Manzana dulce y crujiente",
                price: 199,
                unit: ProductUnit::Kg,
                subcategory: Some("Frutas"),
                featured: false,
                stock: 80,
            },
            SeedProduct {
                name: "Tomate Rama",
                description: "Tomate en rama para ensalada",
                price: 289,
                unit: ProductUnit::Kg,
                subcategory: Some("Verduras"),
                featured: false,
                stock: 6,
            },
        ],
    },
    SeedCategory {
        name: "Lácteos y Huevos",
        description: "Leche, yogures, quesos y huevos",
        subcategories: &["Leche", "Huevos", "Quesos"],
        products: &[
            SeedProduct {
                name: "Leche Entera",
                description: "Leche entera de vaca, brik de 1 litro",
                price: 109,
                unit: ProductUnit::L,
                subcategory: Some("Leche"),
                featured: true,
                stock: 200,
            },
            SeedProduct {
                name: "Huevos Camperos",
                description: "Huevos de gallinas camperas, talla L",
                price: 329,
                unit: ProductUnit::Dozen,
                subcategory: Some("Huevos"),
                featured: true,
                stock: 40,
            },
            SeedProduct {
                name: "Queso Manchego Curado",
                description: "Cuña de queso manchego curado",
                price: 749,
                unit: ProductUnit::Unit,
                subcategory: Some("Quesos"),
                featured: false,
                stock: 3,
            },
        ],
    },
    SeedCategory {
        name: "Panadería",
        description: "Pan del día y bollería",
        subcategories: &["Pan", "Bollería"],
        products: &[
            SeedProduct {
                name: "Barra de Pan",
                description: "Barra de pan horneada cada mañana",
                price: 95,
                unit: ProductUnit::Unit,
                subcategory: Some("Pan"),
                featured: false,
                stock: 60,
            },
            SeedProduct {
                name: "Croissants de Mantequilla",
                description: "Paquete de cuatro croissants",
                price: 259,
                unit: ProductUnit::Pack,
                subcategory: Some("Bollería"),
                featured: true,
                stock: 25,
            },
        ],
    },
    SeedCategory {
        name: "Despensa",
        description: "Aceite, arroz, legumbres y conservas",
        subcategories: &[],
        products: &[SeedProduct {
            name: "Aceite de Oliva Virgen Extra",
            description: "Botella de 750 ml",
            price: 899,
            unit: ProductUnit::Unit,
            subcategory: None,
            featured: false,
            stock: 35,
        }],
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", "Admin", Role::Admin).await?;
    let customer_id =
        ensure_user(&pool, "cliente@example.com", "cliente12345", "Cliente", Role::Customer).await?;

    let mut products = 0;
    for (position, category) in CATALOGUE.iter().enumerate() {
        products += seed_category(&pool, category, position as i32).await?;
    }

    println!(
        "Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}, {} categories, {products} products",
        CATALOGUE.len()
    );
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    first_name: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, 'Demo', $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(first_name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_category(pool: &DbPool, category: &SeedCategory, position: i32) -> anyhow::Result<usize> {
    let (category_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug, description, sort_order)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(category.name)
    .bind(slug::normalize(category.name))
    .bind(category.description)
    .bind(position)
    .fetch_one(pool)
    .await?;

    let mut subcategory_ids = Vec::with_capacity(category.subcategories.len());
    for (position, name) in category.subcategories.iter().enumerate() {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO subcategories (id, category_id, name, slug, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (category_id, slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_id)
        .bind(*name)
        .bind(slug::normalize(name))
        .bind(position as i32)
        .fetch_one(pool)
        .await?;
        subcategory_ids.push((*name, id));
    }

    let mut inserted = 0;
    for product in category.products {
        let product_slug = slug::normalize(product.name);
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE slug = $1 AND category_id = $2")
                .bind(&product_slug)
                .bind(category_id)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        let subcategory_id = product.subcategory.and_then(|wanted| {
            subcategory_ids
                .iter()
                .find(|(name, _)| *name == wanted)
                .map(|(_, id)| *id)
        });

        let mut tx = pool.begin().await?;
        let product_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO products (id, name, slug, description, price, unit, category_id, subcategory_id, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product_id)
        .bind(product.name)
        .bind(&product_slug)
        .bind(product.description)
        .bind(product.price)
        .bind(product.unit.as_str())
        .bind(category_id)
        .bind(subcategory_id)
        .bind(product.featured)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO inventory (product_id, quantity) VALUES ($1, $2)")
            .bind(product_id)
            .bind(product.stock)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        inserted += 1;
    }

    Ok(inserted)
}
