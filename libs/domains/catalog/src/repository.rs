use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    DeletedTree, Image, NewImage, NewProduct, Product, ProductDetails, ProductRef,
};

/// Repository trait for catalog persistence.
///
/// Listing methods return records in ascending id order. Reads of a product
/// and its relations see a single consistent state. Writes re-check
/// the references they store so that a reference deleted after validation
/// still surfaces as `UnknownParent` / `UnknownProduct`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn product_exists(&self, id: i64) -> CatalogResult<bool>;

    /// Product `id` with its direct children and its images.
    async fn find_product(&self, id: i64) -> CatalogResult<Option<ProductDetails>>;

    /// Every product with its direct children and its images.
    async fn find_all_products(&self) -> CatalogResult<Vec<ProductDetails>>;

    async fn insert_product(&self, input: NewProduct) -> CatalogResult<Product>;

    /// Overwrite every field of product `id`. `Ok(None)` when it doesn't exist.
    ///
    /// Fails with `ParentCycle` when the new parent is the product itself or
    /// one of its descendants.
    async fn replace_product(&self, id: i64, input: NewProduct) -> CatalogResult<Option<Product>>;

    /// Delete the product, all its descendants and all their images as one
    /// unit. `Ok(None)` when the product doesn't exist.
    async fn delete_product_tree(&self, id: i64) -> CatalogResult<Option<DeletedTree>>;

    async fn find_image(&self, id: i64) -> CatalogResult<Option<Image>>;

    async fn insert_image(&self, input: NewImage) -> CatalogResult<Image>;

    async fn replace_image(&self, id: i64, input: NewImage) -> CatalogResult<Option<Image>>;

    async fn delete_image(&self, id: i64) -> CatalogResult<bool>;
}

#[derive(Debug, Default)]
struct CatalogState {
    products: BTreeMap<i64, Product>,
    images: BTreeMap<i64, Image>,
    last_product_id: i64,
    last_image_id: i64,
}

impl CatalogState {
    fn next_product_id(&mut self) -> i64 {
        self.last_product_id += 1;
        self.last_product_id
    }

    fn next_image_id(&mut self) -> i64 {
        self.last_image_id += 1;
        self.last_image_id
    }

    /// Walk up from `parent_id` and fail if `id` shows up on the way.
    fn check_ancestry(&self, id: i64, parent_id: i64) -> CatalogResult<()> {
        let mut seen = HashSet::new();
        let mut current = Some(parent_id);

        while let Some(cur) = current {
            if cur == id {
                return Err(CatalogError::ParentCycle(id));
            }
            if !seen.insert(cur) {
                break;
            }
            current = match self.products.get(&cur) {
                Some(product) => product.parent_id(),
                None => return Err(CatalogError::UnknownParent),
            };
        }

        Ok(())
    }

    /// `root` and every descendant, collected breadth-first.
    fn subtree(&self, root: i64) -> HashSet<i64> {
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for product in self.products.values() {
            if let Some(parent) = product.parent_id() {
                children.entry(parent).or_default().push(product.id);
            }
        }

        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(id) = queue.pop_front() {
            for &child in children.get(&id).into_iter().flatten() {
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        seen
    }
}

/// In-memory implementation of CatalogRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogRepository {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn product_exists(&self, id: i64) -> CatalogResult<bool> {
        let state = self.state.read().await;
        Ok(state.products.contains_key(&id))
    }

    async fn find_product(&self, id: i64) -> CatalogResult<Option<ProductDetails>> {
        let state = self.state.read().await;

        let Some(product) = state.products.get(&id).cloned() else {
            return Ok(None);
        };
        let children = state
            .products
            .values()
            .filter(|p| p.parent_id() == Some(id))
            .cloned()
            .collect();
        let images = state
            .images
            .values()
            .filter(|i| i.product.id == id)
            .copied()
            .collect();

        Ok(Some(ProductDetails::assemble(product, children, images)))
    }

    async fn find_all_products(&self) -> CatalogResult<Vec<ProductDetails>> {
        let state = self.state.read().await;
        Ok(ProductDetails::assemble_all(
            state.products.values().cloned().collect(),
            state.images.values().copied().collect(),
        ))
    }

    async fn insert_product(&self, input: NewProduct) -> CatalogResult<Product> {
        let mut state = self.state.write().await;

        if let Some(parent_id) = input.parent_id {
            if !state.products.contains_key(&parent_id) {
                return Err(CatalogError::UnknownParent);
            }
        }

        let product = Product {
            id: state.next_product_id(),
            name: input.name,
            description: input.description,
            parent: input.parent_id.map(ProductRef::from),
        };
        state.products.insert(product.id, product.clone());

        tracing::info!(product_id = product.id, "Created product");
        Ok(product)
    }

    async fn replace_product(&self, id: i64, input: NewProduct) -> CatalogResult<Option<Product>> {
        let mut state = self.state.write().await;

        if !state.products.contains_key(&id) {
            return Ok(None);
        }
        if let Some(parent_id) = input.parent_id {
            state.check_ancestry(id, parent_id)?;
        }

        let product = Product {
            id,
            name: input.name,
            description: input.description,
            parent: input.parent_id.map(ProductRef::from),
        };
        state.products.insert(id, product.clone());

        tracing::info!(product_id = id, "Updated product");
        Ok(Some(product))
    }

    async fn delete_product_tree(&self, id: i64) -> CatalogResult<Option<DeletedTree>> {
        let mut state = self.state.write().await;

        if !state.products.contains_key(&id) {
            return Ok(None);
        }

        let doomed = state.subtree(id);

        let images_before = state.images.len();
        state
            .images
            .retain(|_, image| !doomed.contains(&image.product.id));
        let images = images_before - state.images.len();
        state.products.retain(|pid, _| !doomed.contains(pid));

        let deleted = DeletedTree {
            products: doomed.len() as u64,
            images: images as u64,
        };
        tracing::info!(
            product_id = id,
            products = deleted.products,
            images = deleted.images,
            "Deleted product tree"
        );
        Ok(Some(deleted))
    }

    async fn find_image(&self, id: i64) -> CatalogResult<Option<Image>> {
        let state = self.state.read().await;
        Ok(state.images.get(&id).copied())
    }

    async fn insert_image(&self, input: NewImage) -> CatalogResult<Image> {
        let mut state = self.state.write().await;

        if !state.products.contains_key(&input.product_id) {
            return Err(CatalogError::UnknownProduct);
        }

        let image = Image {
            id: state.next_image_id(),
            image_type: input.image_type,
            product: ProductRef::from(input.product_id),
        };
        state.images.insert(image.id, image);

        tracing::info!(image_id = image.id, product_id = input.product_id, "Created image");
        Ok(image)
    }

    async fn replace_image(&self, id: i64, input: NewImage) -> CatalogResult<Option<Image>> {
        let mut state = self.state.write().await;

        if !state.images.contains_key(&id) {
            return Ok(None);
        }
        if !state.products.contains_key(&input.product_id) {
            return Err(CatalogError::UnknownProduct);
        }

        let image = Image {
            id,
            image_type: input.image_type,
            product: ProductRef::from(input.product_id),
        };
        state.images.insert(id, image);

        tracing::info!(image_id = id, "Updated image");
        Ok(Some(image))
    }

    async fn delete_image(&self, id: i64) -> CatalogResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.images.remove(&id).is_some();

        if removed {
            tracing::info!(image_id = id, "Deleted image");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageType;

    fn new_product(name: &str, parent_id: Option<i64>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: format!("{name} description"),
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_record_kind() {
        let repo = InMemoryCatalogRepository::new();

        let first = repo.insert_product(new_product("Camaro", None)).await.unwrap();
        let second = repo.insert_product(new_product("Mustang", None)).await.unwrap();
        let image = repo
            .insert_image(NewImage {
                image_type: ImageType::Png,
                product_id: first.id,
            })
            .await
            .unwrap();

        assert_eq!((first.id, second.id, image.id), (1, 2, 1));
    }

    #[tokio::test]
    async fn test_insert_rejects_missing_references() {
        let repo = InMemoryCatalogRepository::new();

        let err = repo
            .insert_product(new_product("Wheel", Some(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownParent));

        let err = repo
            .insert_image(NewImage {
                image_type: ImageType::Raw,
                product_id: -1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownProduct));
    }

    #[tokio::test]
    async fn test_replace_detects_cycles() {
        let repo = InMemoryCatalogRepository::new();
        let root = repo.insert_product(new_product("Car", None)).await.unwrap();
        let mid = repo
            .insert_product(new_product("Axle", Some(root.id)))
            .await
            .unwrap();
        let leaf = repo
            .insert_product(new_product("Wheel", Some(mid.id)))
            .await
            .unwrap();

        let self_parent = repo
            .replace_product(root.id, new_product("Car", Some(root.id)))
            .await
            .unwrap_err();
        assert!(matches!(self_parent, CatalogError::ParentCycle(_)));

        let under_descendant = repo
            .replace_product(root.id, new_product("Car", Some(leaf.id)))
            .await
            .unwrap_err();
        assert!(matches!(under_descendant, CatalogError::ParentCycle(_)));

        let moved = repo
            .replace_product(leaf.id, new_product("Wheel", Some(root.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.parent_id(), Some(root.id));
    }

    #[tokio::test]
    async fn test_replace_missing_returns_none() {
        let repo = InMemoryCatalogRepository::new();

        let product = repo.replace_product(-1, new_product("Ghost", None)).await.unwrap();
        let image = repo
            .replace_image(
                -1,
                NewImage {
                    image_type: ImageType::Bmp,
                    product_id: 1,
                },
            )
            .await
            .unwrap();

        assert!(product.is_none());
        assert!(image.is_none());
    }

    #[tokio::test]
    async fn test_delete_tree_removes_descendants_and_images_only() {
        let repo = InMemoryCatalogRepository::new();
        let car = repo.insert_product(new_product("Car", None)).await.unwrap();
        let axle = repo
            .insert_product(new_product("Axle", Some(car.id)))
            .await
            .unwrap();
        let wheel = repo
            .insert_product(new_product("Wheel", Some(axle.id)))
            .await
            .unwrap();
        let bike = repo.insert_product(new_product("Bike", None)).await.unwrap();

        for product_id in [car.id, wheel.id, bike.id] {
            repo.insert_image(NewImage {
                image_type: ImageType::Jpeg,
                product_id,
            })
            .await
            .unwrap();
        }

        let deleted = repo.delete_product_tree(car.id).await.unwrap().unwrap();
        assert_eq!(deleted, DeletedTree { products: 3, images: 2 });

        let remaining = repo.find_all_products().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, bike.id);
        assert_eq!(remaining[0].images.len(), 1);
        assert!(repo.delete_product_tree(car.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_children_and_images_are_scoped_to_product() {
        let repo = InMemoryCatalogRepository::new();
        let car = repo.insert_product(new_product("Car", None)).await.unwrap();
        let wheel = repo
            .insert_product(new_product("Wheel", Some(car.id)))
            .await
            .unwrap();
        repo.insert_image(NewImage {
            image_type: ImageType::Exif,
            product_id: wheel.id,
        })
        .await
        .unwrap();

        let car_details = repo.find_product(car.id).await.unwrap().unwrap();
        assert_eq!(car_details.children, vec![wheel.clone()]);
        assert!(car_details.images.is_empty());

        let wheel_details = repo.find_product(wheel.id).await.unwrap().unwrap();
        assert!(wheel_details.children.is_empty());
        assert_eq!(wheel_details.images.len(), 1);
        assert_eq!(wheel_details.parent, Some(ProductRef::from(car.id)));

        assert!(repo.find_product(-1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_image() {
        let repo = InMemoryCatalogRepository::new();
        let car = repo.insert_product(new_product("Car", None)).await.unwrap();
        let image = repo
            .insert_image(NewImage {
                image_type: ImageType::Gif,
                product_id: car.id,
            })
            .await
            .unwrap();

        assert!(repo.delete_image(image.id).await.unwrap());
        assert!(!repo.delete_image(image.id).await.unwrap());
        assert!(repo.product_exists(car.id).await.unwrap());
    }
}
