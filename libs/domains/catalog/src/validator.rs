//! Request validators.
//!
//! Each check answers yes/no; the service decides which error a failed
//! check turns into. Field checks are pure, reference checks hit the
//! repository.

use std::sync::Arc;

use validator::Validate;

use crate::error::CatalogResult;
use crate::models::{ImageInput, ProductInput};
use crate::repository::CatalogRepository;

pub struct ProductValidator<R: CatalogRepository> {
    repository: Arc<R>,
}

impl<R: CatalogRepository> ProductValidator<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// `name` and `description` are present and non-empty.
    pub fn has_valid_fields(&self, input: &ProductInput) -> bool {
        input.validate().is_ok()
    }

    /// A missing parent is valid (root product). A parent object without
    /// an id, or with an id that isn't stored, is not.
    pub async fn has_valid_parent(&self, input: &ProductInput) -> CatalogResult<bool> {
        match input.parent {
            None => Ok(true),
            Some(parent) => match parent.id {
                None => Ok(false),
                Some(id) => self.repository.product_exists(id).await,
            },
        }
    }
}

pub struct ImageValidator<R: CatalogRepository> {
    repository: Arc<R>,
}

impl<R: CatalogRepository> ImageValidator<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn has_valid_fields(&self, input: &ImageInput) -> bool {
        input.validate().is_ok()
    }

    /// The image must reference a stored product.
    pub async fn has_valid_product(&self, input: &ImageInput) -> CatalogResult<bool> {
        match input.product.and_then(|p| p.id) {
            None => Ok(false),
            Some(id) => self.repository.product_exists(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageType, ReferenceInput};
    use crate::repository::MockCatalogRepository;
    use mockall::predicate::eq;

    fn product_validator(mock: MockCatalogRepository) -> ProductValidator<MockCatalogRepository> {
        ProductValidator::new(Arc::new(mock))
    }

    fn image_validator(mock: MockCatalogRepository) -> ImageValidator<MockCatalogRepository> {
        ImageValidator::new(Arc::new(mock))
    }

    #[test]
    fn test_product_fields() {
        let validator = product_validator(MockCatalogRepository::new());

        assert!(validator.has_valid_fields(&ProductInput::new("Camaro", "Car")));
        assert!(!validator.has_valid_fields(&ProductInput::new("Camaro", "")));
        assert!(!validator.has_valid_fields(&ProductInput::default()));
    }

    #[tokio::test]
    async fn test_root_product_needs_no_lookup() {
        // No expectations: any repository call would panic
        let validator = product_validator(MockCatalogRepository::new());

        let valid = validator
            .has_valid_parent(&ProductInput::new("Camaro", "Car"))
            .await
            .unwrap();

        assert!(valid);
    }

    #[tokio::test]
    async fn test_parent_without_id_is_invalid() {
        let validator = product_validator(MockCatalogRepository::new());
        let mut input = ProductInput::new("Wheel", "Wheel");
        input.parent = Some(ReferenceInput { id: None });

        assert!(!validator.has_valid_parent(&input).await.unwrap());
    }

    #[tokio::test]
    async fn test_parent_lookup() {
        let mut mock = MockCatalogRepository::new();
        mock.expect_product_exists()
            .with(eq(1))
            .returning(|_| Ok(true));
        mock.expect_product_exists()
            .with(eq(-1))
            .returning(|_| Ok(false));
        let validator = product_validator(mock);

        let known = ProductInput::new("Wheel", "Wheel").with_parent(1);
        let unknown = ProductInput::new("Wheel", "Wheel").with_parent(-1);

        assert!(validator.has_valid_parent(&known).await.unwrap());
        assert!(!validator.has_valid_parent(&unknown).await.unwrap());
    }

    #[test]
    fn test_image_fields() {
        let validator = image_validator(MockCatalogRepository::new());

        assert!(validator.has_valid_fields(&ImageInput::new(ImageType::Png, 1)));
        assert!(!validator.has_valid_fields(&ImageInput::default()));
    }

    #[tokio::test]
    async fn test_image_product() {
        let mut mock = MockCatalogRepository::new();
        mock.expect_product_exists()
            .with(eq(7))
            .times(1)
            .returning(|_| Ok(true));
        let validator = image_validator(mock);

        assert!(validator
            .has_valid_product(&ImageInput::new(ImageType::Gif, 7))
            .await
            .unwrap());
        assert!(!validator
            .has_valid_product(&ImageInput::default())
            .await
            .unwrap());
    }
}
