use crate::Db;
use crate::impls::BIND_CHUNK;
use sqlx::Row as _;
use vp_core::models::Product;
use vp_core::ports::CatalogRepository;

fn row_to_product(row: &sqlx::postgres::PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        sku: row.try_get("sku")?,
        brand: row.try_get("brand")?,
        category: row.try_get("category")?,
        item_name: row.try_get("item_name")?,
        size: row.try_get("size")?,
    })
}

impl CatalogRepository for Db {
    async fn upsert_products(&self, products: &[Product]) -> Result<u64, Self::Error> {
        if products.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        for chunk in products.chunks(BIND_CHUNK) {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
                "insert into products (sku, brand, category, item_name, size) ",
            );
            builder.push_values(chunk, |mut b, product| {
                b.push_bind(&product.sku)
                    .push_bind(&product.brand)
                    .push_bind(&product.category)
                    .push_bind(&product.item_name)
                    .push_bind(&product.size);
            });
            builder.push(
                " on conflict (sku) do update set \
                 brand = excluded.brand, \
                 category = excluded.category, \
                 item_name = excluded.item_name, \
                 size = excluded.size",
            );

            let result = builder.build().execute(&self.pool).await?;
            written += result.rows_affected();
        }

        Ok(written)
    }

    async fn create_product(&self, product: &Product) -> Result<(), Self::Error> {
        sqlx::query(
            "insert into products (sku, brand, category, item_name, size) \
             values ($1, $2, $3, $4, $5)",
        )
        .bind(&product.sku)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(&product.item_name)
        .bind(&product.size)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, sku: &str) -> Result<Option<Product>, Self::Error> {
        let row = sqlx::query(
            "select sku, brand, category, item_name, size from products where sku = $1",
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }
}
