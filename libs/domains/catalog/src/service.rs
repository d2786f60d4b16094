use std::sync::Arc;
use tracing::instrument;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    DeletedTree, Image, ImageInput, NewImage, NewProduct, Product, ProductDetails, ProductInput,
};
use crate::projection::Projection;
use crate::repository::CatalogRepository;
use crate::validator::{ImageValidator, ProductValidator};

/// Service layer for catalog business logic.
///
/// Writes are checked in a fixed order: fields, then references, then the
/// existence of the record being replaced.
pub struct CatalogService<R: CatalogRepository> {
    repository: Arc<R>,
    products: ProductValidator<R>,
    images: ImageValidator<R>,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repository: R) -> Self {
        let repository = Arc::new(repository);
        Self {
            products: ProductValidator::new(Arc::clone(&repository)),
            images: ImageValidator::new(Arc::clone(&repository)),
            repository,
        }
    }

    async fn validate_product(&self, input: ProductInput) -> CatalogResult<NewProduct> {
        if !self.products.has_valid_fields(&input) {
            return Err(CatalogError::EmptyFields);
        }
        if !self.products.has_valid_parent(&input).await? {
            return Err(CatalogError::UnknownParent);
        }

        Ok(NewProduct {
            name: input.name.ok_or(CatalogError::EmptyFields)?,
            description: input.description.ok_or(CatalogError::EmptyFields)?,
            parent_id: input.parent.and_then(|p| p.id),
        })
    }

    async fn validate_image(&self, input: ImageInput) -> CatalogResult<NewImage> {
        if !self.images.has_valid_fields(&input) {
            return Err(CatalogError::EmptyFields);
        }
        if !self.images.has_valid_product(&input).await? {
            return Err(CatalogError::UnknownProduct);
        }

        Ok(NewImage {
            image_type: input.image_type.ok_or(CatalogError::EmptyFields)?,
            product_id: input
                .product
                .and_then(|p| p.id)
                .ok_or(CatalogError::UnknownProduct)?,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: ProductInput) -> CatalogResult<Product> {
        let product = self.validate_product(input).await?;
        self.repository.insert_product(product).await
    }

    async fn find_details(&self, id: i64) -> CatalogResult<ProductDetails> {
        self.repository
            .find_product(id)
            .await?
            .ok_or(CatalogError::UnknownProduct)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i64, projection: Projection) -> CatalogResult<ProductDetails> {
        let details = self.find_details(id).await?;
        Ok(projection.apply(details))
    }

    /// Every product in ascending id order, each with its direct children and images.
    #[instrument(skip(self))]
    pub async fn get_all_products(&self, projection: Projection) -> CatalogResult<Vec<ProductDetails>> {
        let details = self.repository.find_all_products().await?;
        Ok(projection.apply_all(details))
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: i64, input: ProductInput) -> CatalogResult<Product> {
        let product = self.validate_product(input).await?;
        self.repository
            .replace_product(id, product)
            .await?
            .ok_or(CatalogError::UnknownProduct)
    }

    /// Remove the product, its whole subtree and every image attached to it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> CatalogResult<DeletedTree> {
        self.repository
            .delete_product_tree(id)
            .await?
            .ok_or(CatalogError::UnknownProduct)
    }

    #[instrument(skip(self))]
    pub async fn get_product_children(&self, id: i64) -> CatalogResult<Vec<Product>> {
        Ok(self.find_details(id).await?.children)
    }

    #[instrument(skip(self))]
    pub async fn get_product_images(&self, id: i64) -> CatalogResult<Vec<Image>> {
        Ok(self.find_details(id).await?.images)
    }

    #[instrument(skip(self, input))]
    pub async fn create_image(&self, input: ImageInput) -> CatalogResult<Image> {
        let image = self.validate_image(input).await?;
        self.repository.insert_image(image).await
    }

    #[instrument(skip(self))]
    pub async fn get_image(&self, id: i64) -> CatalogResult<Image> {
        self.repository
            .find_image(id)
            .await?
            .ok_or(CatalogError::UnknownImage)
    }

    #[instrument(skip(self, input))]
    pub async fn update_image(&self, id: i64, input: ImageInput) -> CatalogResult<Image> {
        let image = self.validate_image(input).await?;
        self.repository
            .replace_image(id, image)
            .await?
            .ok_or(CatalogError::UnknownImage)
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: i64) -> CatalogResult<()> {
        if self.repository.delete_image(id).await? {
            Ok(())
        } else {
            Err(CatalogError::UnknownImage)
        }
    }
}
