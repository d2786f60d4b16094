use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use std::collections::HashSet;

use crate::{
    entity::{images, products},
    error::{CatalogError, CatalogResult},
    models::{DeletedTree, Image, NewImage, NewProduct, Product, ProductDetails},
    repository::CatalogRepository,
};

/// Postgres-backed catalog.
///
/// Foreign keys are `ON DELETE RESTRICT`; the cascade is performed by
/// [`CatalogRepository::delete_product_tree`] inside one transaction.
#[derive(Clone)]
pub struct PgCatalogRepository {
    db: DatabaseConnection,
}

impl PgCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Snapshot for reads that span several tables.
    async fn read_snapshot(&self) -> CatalogResult<DatabaseTransaction> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?;
        Ok(txn)
    }
}

/// A foreign key violation on write means the referenced row vanished
/// between validation and the write.
fn reference_error(err: DbErr, missing: CatalogError) -> CatalogError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => missing,
        _ => CatalogError::from(err),
    }
}

/// Lock the ancestors of `parent_id` and make sure `id` is not one of them.
async fn check_ancestry<C: ConnectionTrait>(conn: &C, id: i64, parent_id: i64) -> CatalogResult<()> {
    let mut seen = HashSet::new();
    let mut current = Some(parent_id);

    while let Some(cur) = current {
        if cur == id {
            return Err(CatalogError::ParentCycle(id));
        }
        if !seen.insert(cur) {
            break;
        }
        current = products::Entity::find_by_id(cur)
            .lock_shared()
            .one(conn)
            .await?
            .ok_or(CatalogError::UnknownParent)?
            .parent_id;
    }

    Ok(())
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn product_exists(&self, id: i64) -> CatalogResult<bool> {
        let count = products::Entity::find_by_id(id).count(&self.db).await?;
        Ok(count > 0)
    }

    async fn find_product(&self, id: i64) -> CatalogResult<Option<ProductDetails>> {
        let txn = self.read_snapshot().await?;

        let Some(model) = products::Entity::find_by_id(id).one(&txn).await? else {
            txn.commit().await?;
            return Ok(None);
        };
        let children = products::Entity::find()
            .filter(products::Column::ParentId.eq(id))
            .order_by_asc(products::Column::Id)
            .all(&txn)
            .await?;
        let images = images::Entity::find()
            .filter(images::Column::ProductId.eq(id))
            .order_by_asc(images::Column::Id)
            .all(&txn)
            .await?;

        txn.commit().await?;

        Ok(Some(ProductDetails::assemble(
            model.into(),
            children.into_iter().map(Product::from).collect(),
            images.into_iter().map(Image::from).collect(),
        )))
    }

    async fn find_all_products(&self) -> CatalogResult<Vec<ProductDetails>> {
        let txn = self.read_snapshot().await?;

        let products = products::Entity::find()
            .order_by_asc(products::Column::Id)
            .all(&txn)
            .await?;
        let images = images::Entity::find()
            .order_by_asc(images::Column::Id)
            .all(&txn)
            .await?;

        txn.commit().await?;

        Ok(ProductDetails::assemble_all(
            products.into_iter().map(Product::from).collect(),
            images.into_iter().map(Image::from).collect(),
        ))
    }

    async fn insert_product(&self, input: NewProduct) -> CatalogResult<Product> {
        let model = products::ActiveModel {
            id: NotSet,
            name: Set(input.name),
            description: Set(input.description),
            parent_id: Set(input.parent_id),
        }
        .insert(&self.db)
        .await
        .map_err(|e| reference_error(e, CatalogError::UnknownParent))?;

        tracing::info!(product_id = model.id, "Created product");
        Ok(model.into())
    }

    async fn replace_product(&self, id: i64, input: NewProduct) -> CatalogResult<Option<Product>> {
        let txn = self.db.begin().await?;

        let existing = products::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?;
        if existing.is_none() {
            return Ok(None);
        }
        if let Some(parent_id) = input.parent_id {
            check_ancestry(&txn, id, parent_id).await?;
        }

        let model = products::ActiveModel {
            id: Unchanged(id),
            name: Set(input.name),
            description: Set(input.description),
            parent_id: Set(input.parent_id),
        }
        .update(&txn)
        .await
        .map_err(|e| reference_error(e, CatalogError::UnknownParent))?;

        txn.commit().await?;

        tracing::info!(product_id = id, "Updated product");
        Ok(Some(model.into()))
    }

    async fn delete_product_tree(&self, id: i64) -> CatalogResult<Option<DeletedTree>> {
        let txn = self.db.begin().await?;

        let root = products::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?;
        if root.is_none() {
            return Ok(None);
        }

        // Breadth-first, one query per depth. Locked rows block concurrent
        // inserts that would reference them.
        let mut levels: Vec<Vec<i64>> = vec![vec![id]];
        let mut seen = HashSet::from([id]);
        loop {
            let frontier = levels.last().cloned().unwrap_or_default();
            let children: Vec<i64> = products::Entity::find()
                .select_only()
                .column(products::Column::Id)
                .filter(products::Column::ParentId.is_in(frontier))
                .lock_exclusive()
                .into_tuple()
                .all(&txn)
                .await?;

            let next: Vec<i64> = children.into_iter().filter(|c| seen.insert(*c)).collect();
            if next.is_empty() {
                break;
            }
            levels.push(next);
        }

        let images = images::Entity::delete_many()
            .filter(images::Column::ProductId.is_in(seen.iter().copied()))
            .exec(&txn)
            .await?
            .rows_affected;

        let mut products_deleted = 0;
        for level in levels.into_iter().rev() {
            products_deleted += products::Entity::delete_many()
                .filter(products::Column::Id.is_in(level))
                .exec(&txn)
                .await?
                .rows_affected;
        }

        txn.commit().await?;

        let deleted = DeletedTree {
            products: products_deleted,
            images,
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
        let model = images::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Image::from))
    }

    async fn insert_image(&self, input: NewImage) -> CatalogResult<Image> {
        let model = images::ActiveModel {
            id: NotSet,
            image_type: Set(input.image_type),
            product_id: Set(input.product_id),
        }
        .insert(&self.db)
        .await
        .map_err(|e| reference_error(e, CatalogError::UnknownProduct))?;

        tracing::info!(image_id = model.id, product_id = model.product_id, "Created image");
        Ok(model.into())
    }

    async fn replace_image(&self, id: i64, input: NewImage) -> CatalogResult<Option<Image>> {
        let result = images::ActiveModel {
            id: Unchanged(id),
            image_type: Set(input.image_type),
            product_id: Set(input.product_id),
        }
        .update(&self.db)
        .await;

        match result {
            Ok(model) => {
                tracing::info!(image_id = id, "Updated image");
                Ok(Some(model.into()))
            }
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(reference_error(e, CatalogError::UnknownProduct)),
        }
    }

    async fn delete_image(&self, id: i64) -> CatalogResult<bool> {
        let result = images::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(image_id = id, "Deleted image");
        }
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageType, ProductRef};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn product_row(id: i64, parent_id: Option<i64>) -> products::Model {
        products::Model {
            id,
            name: format!("product-{id}"),
            description: "description".to_string(),
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_find_product_reads_relations_in_one_transaction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![product_row(2, Some(1))], vec![product_row(3, Some(2))]])
            .append_query_results([vec![images::Model {
                id: 7,
                image_type: ImageType::Png,
                product_id: 2,
            }]])
            .into_connection();
        let repo = PgCatalogRepository::new(db);

        let details = repo.find_product(2).await.unwrap().unwrap();

        assert_eq!(details.parent, Some(ProductRef { id: 1 }));
        assert_eq!(details.children, vec![Product::from(product_row(3, Some(2)))]);
        assert_eq!(details.images.len(), 1);
        assert_eq!(details.images[0].image_type, ImageType::Png);

        // Three selects recorded as one transaction
        let log = repo.db.into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_product_skips_relations() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<products::Model>::new()])
            .into_connection();
        let repo = PgCatalogRepository::new(db);

        assert!(repo.find_product(-1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_image_maps_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![images::Model {
                id: 5,
                image_type: ImageType::Bat,
                product_id: 1,
            }]])
            .into_connection();
        let repo = PgCatalogRepository::new(db);

        let image = repo.find_image(5).await.unwrap().unwrap();

        assert_eq!(image.image_type, ImageType::Bat);
        assert_eq!(image.product.id, 1);
    }

    #[tokio::test]
    async fn test_delete_image_reports_missing_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgCatalogRepository::new(db);

        assert!(!repo.delete_image(-1).await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_missing_product_returns_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<products::Model>::new()])
            .into_connection();
        let repo = PgCatalogRepository::new(db);

        let input = NewProduct {
            name: "Ghost".into(),
            description: "Ghost".into(),
            parent_id: None,
        };

        assert!(repo.replace_product(-1, input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_under_own_descendant_is_a_cycle() {
        // Lock on 1, then ancestry walk: 3 -> 2 -> 1
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![product_row(1, None)],
                vec![product_row(3, Some(2))],
                vec![product_row(2, Some(1))],
            ])
            .into_connection();
        let repo = PgCatalogRepository::new(db);

        let input = NewProduct {
            name: "Car".into(),
            description: "Car".into(),
            parent_id: Some(3),
        };
        let err = repo.replace_product(1, input).await.unwrap_err();

        assert!(matches!(err, CatalogError::ParentCycle(1)));
    }
}
