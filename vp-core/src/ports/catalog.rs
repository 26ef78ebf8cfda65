use crate::models::Product;

/// Repository interface for the canonical product catalog.
pub trait CatalogRepository: super::Repository {
    /// Insert or update products in bulk, keyed by SKU.
    ///
    /// Returns the number of rows written. Existing products are
    /// refreshed with the incoming descriptive fields; products are
    /// never deleted by ingestion.
    fn upsert_products(
        &self,
        products: &[Product],
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Insert a single product. Fails on a duplicate SKU.
    fn create_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Fetch one product by SKU.
    fn get_product(
        &self,
        sku: &str,
    ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send;
}
