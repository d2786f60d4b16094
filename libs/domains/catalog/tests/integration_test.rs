//! Postgres integration tests for the catalog repository
//!
//! Each test starts its own PostgreSQL container with migrations applied.
//! Run with `cargo test -- --ignored` on a machine with Docker.

use domain_catalog::*;
use test_utils::{TestDataBuilder, TestDatabase};

fn new_product(builder: &TestDataBuilder, suffix: &str, parent_id: Option<i64>) -> NewProduct {
    NewProduct {
        name: builder.name("product", suffix),
        description: builder.description(suffix),
        parent_id,
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_create_and_read_product_tree() {
    let db = TestDatabase::new().await;
    let service = CatalogService::new(PgCatalogRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("pg_create_and_read");

    let car = service
        .create_product(ProductInput::new(
            builder.name("product", "car"),
            builder.description("car"),
        ))
        .await
        .unwrap();
    let wheel = service
        .create_product(
            ProductInput::new(builder.name("product", "wheel"), builder.description("wheel"))
                .with_parent(car.id),
        )
        .await
        .unwrap();
    service
        .create_image(ImageInput::new(ImageType::Png, car.id))
        .await
        .unwrap();

    let details = service
        .get_product(car.id, Projection::default())
        .await
        .unwrap();
    assert_eq!(details.children, vec![wheel.clone()]);
    assert_eq!(details.images.len(), 1);
    assert_eq!(details.images[0].image_type, ImageType::Png);

    let all = service.get_all_products(Projection::default()).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![car.id, wheel.id]);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_foreign_keys_surface_as_reference_errors() {
    let db = TestDatabase::new().await;
    let repo = PgCatalogRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_foreign_keys");

    // Bypass the validators to hit the constraint directly
    let err = repo
        .insert_product(new_product(&builder, "orphan", Some(builder.missing_id())))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownParent));

    let err = repo
        .insert_image(NewImage {
            image_type: ImageType::Gif,
            product_id: builder.missing_id(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownProduct));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_delete_tree_in_one_transaction() {
    let db = TestDatabase::new().await;
    let repo = PgCatalogRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_delete_tree");

    let car = repo.insert_product(new_product(&builder, "car", None)).await.unwrap();
    let axle = repo
        .insert_product(new_product(&builder, "axle", Some(car.id)))
        .await
        .unwrap();
    let wheel = repo
        .insert_product(new_product(&builder, "wheel", Some(axle.id)))
        .await
        .unwrap();
    let bike = repo.insert_product(new_product(&builder, "bike", None)).await.unwrap();
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
    assert!(remaining[0].images.iter().all(|i| i.product.id == bike.id));
    assert!(repo.delete_product_tree(car.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_replace_product_and_image() {
    let db = TestDatabase::new().await;
    let repo = PgCatalogRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("pg_replace");

    let car = repo.insert_product(new_product(&builder, "car", None)).await.unwrap();
    let wheel = repo
        .insert_product(new_product(&builder, "wheel", Some(car.id)))
        .await
        .unwrap();

    let err = repo
        .replace_product(car.id, new_product(&builder, "car", Some(wheel.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ParentCycle(_)));

    let moved = repo
        .replace_product(wheel.id, new_product(&builder, "spare", None))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.parent, None);
    let car_details = repo.find_product(car.id).await.unwrap().unwrap();
    assert!(car_details.children.is_empty());

    let image = repo
        .insert_image(NewImage {
            image_type: ImageType::Bmp,
            product_id: car.id,
        })
        .await
        .unwrap();
    let replaced = repo
        .replace_image(
            image.id,
            NewImage {
                image_type: ImageType::Exif,
                product_id: wheel.id,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.image_type, ImageType::Exif);
    assert_eq!(replaced.product.id, wheel.id);

    let missing = repo
        .replace_image(
            builder.missing_id(),
            NewImage {
                image_type: ImageType::Exif,
                product_id: wheel.id,
            },
        )
        .await
        .unwrap();
    assert!(missing.is_none());
}
