use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, IdPath, JsonBody, QueryParams,
    errors::handlers::method_not_allowed,
    errors::responses::{
        BadRequestIdResponse, BadRequestValidationResponse, ConflictResponse,
        DatabaseUnavailableResponse, InternalServerErrorResponse, NotFoundResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CatalogResult;
use crate::models::{
    Image, ImageInput, ImageType, Product, ProductDetails, ProductInput, ProductRef,
    ReferenceInput,
};
use crate::projection::Projection;
use crate::repository::CatalogRepository;
use crate::service::CatalogService;

pub const PRODUCT_TAG: &str = "product";
pub const IMAGE_TAG: &str = "image";

/// OpenAPI documentation for the catalog API
#[derive(OpenApi)]
#[openapi(
    paths(
        create_product,
        list_products,
        get_product,
        update_product,
        delete_product,
        get_product_children,
        get_product_images,
        create_image,
        get_image,
        update_image,
        delete_image,
    ),
    components(
        schemas(
            Product,
            ProductDetails,
            ProductInput,
            ProductRef,
            ReferenceInput,
            Image,
            ImageInput,
            ImageType
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            ConflictResponse,
            InternalServerErrorResponse,
            DatabaseUnavailableResponse
        )
    ),
    tags(
        (name = PRODUCT_TAG, description = "Product hierarchy endpoints"),
        (name = IMAGE_TAG, description = "Product image endpoints")
    )
)]
pub struct ApiDoc;

/// Create the catalog router. Mount it at `/product`.
pub fn router<R: CatalogRepository + 'static>(service: CatalogService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", post(create_product))
        .route("/all", get(list_products))
        .route("/image", post(create_image))
        .route(
            "/image/{id}",
            get(get_image).put(update_image).delete(delete_image),
        )
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/children", get(get_product_children))
        .route("/{id}/image", get(get_product_images))
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(shared_service)
}

fn audit(action: &str, resource: String, headers: &HeaderMap) -> AuditEvent {
    AuditEvent::new(action, Some(resource), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
}

/// Create a product, optionally under a parent
#[utoipa::path(
    post,
    path = "",
    tag = PRODUCT_TAG,
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn create_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<ProductInput>,
) -> CatalogResult<impl IntoResponse> {
    let product = service.create_product(input).await?;

    audit("product.create", format!("product:{}", product.id), &headers)
        .with_details(json!({
            "name": product.name,
            "parent_id": product.parent_id(),
        }))
        .log();

    Ok((StatusCode::CREATED, Json(product)))
}

/// List every product in id order
#[utoipa::path(
    get,
    path = "/all",
    tag = PRODUCT_TAG,
    params(Projection),
    responses(
        (status = 200, description = "All products", body = Vec<ProductDetails>),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn list_products<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    QueryParams(projection): QueryParams<Projection>,
) -> CatalogResult<Json<Vec<ProductDetails>>> {
    let products = service.get_all_products(projection).await?;
    Ok(Json(products))
}

/// Get a product with its children and images
#[utoipa::path(
    get,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = i64, Path, description = "Product ID"),
        Projection
    ),
    responses(
        (status = 200, description = "Product found", body = ProductDetails),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn get_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    IdPath(id): IdPath,
    QueryParams(projection): QueryParams<Projection>,
) -> CatalogResult<Json<ProductDetails>> {
    let product = service.get_product(id, projection).await?;
    Ok(Json(product))
}

/// Replace every field of a product
#[utoipa::path(
    put,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn update_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    headers: HeaderMap,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<ProductInput>,
) -> CatalogResult<StatusCode> {
    let product = service.update_product(id, input).await?;

    audit("product.update", format!("product:{}", id), &headers)
        .with_details(json!({
            "name": product.name,
            "parent_id": product.parent_id(),
        }))
        .log();

    Ok(StatusCode::OK)
}

/// Delete a product with all descendants and their images
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product tree deleted"),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn delete_product<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> CatalogResult<StatusCode> {
    let deleted = service.delete_product(id).await?;

    audit("product.delete", format!("product:{}", id), &headers)
        .with_details(json!({
            "products_removed": deleted.products,
            "images_removed": deleted.images,
        }))
        .log();

    Ok(StatusCode::OK)
}

/// Direct children of a product
#[utoipa::path(
    get,
    path = "/{id}/children",
    tag = PRODUCT_TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Child products", body = Vec<Product>),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn get_product_children<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    IdPath(id): IdPath,
) -> CatalogResult<Json<Vec<Product>>> {
    let children = service.get_product_children(id).await?;
    Ok(Json(children))
}

/// Images attached to a product
#[utoipa::path(
    get,
    path = "/{id}/image",
    tag = IMAGE_TAG,
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product images", body = Vec<Image>),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn get_product_images<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    IdPath(id): IdPath,
) -> CatalogResult<Json<Vec<Image>>> {
    let images = service.get_product_images(id).await?;
    Ok(Json(images))
}

/// Attach an image to a product
#[utoipa::path(
    post,
    path = "/image",
    tag = IMAGE_TAG,
    request_body = ImageInput,
    responses(
        (status = 201, description = "Image created", body = Image),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn create_image<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<ImageInput>,
) -> CatalogResult<impl IntoResponse> {
    let image = service.create_image(input).await?;

    audit("image.create", format!("image:{}", image.id), &headers)
        .with_details(json!({
            "type": image.image_type,
            "product_id": image.product.id,
        }))
        .log();

    Ok((StatusCode::CREATED, Json(image)))
}

#[utoipa::path(
    get,
    path = "/image/{id}",
    tag = IMAGE_TAG,
    params(
        ("id" = i64, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image found", body = Image),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn get_image<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    IdPath(id): IdPath,
) -> CatalogResult<Json<Image>> {
    let image = service.get_image(id).await?;
    Ok(Json(image))
}

#[utoipa::path(
    put,
    path = "/image/{id}",
    tag = IMAGE_TAG,
    params(
        ("id" = i64, Path, description = "Image ID")
    ),
    request_body = ImageInput,
    responses(
        (status = 200, description = "Image updated"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn update_image<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    headers: HeaderMap,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<ImageInput>,
) -> CatalogResult<StatusCode> {
    let image = service.update_image(id, input).await?;

    audit("image.update", format!("image:{}", id), &headers)
        .with_details(json!({
            "type": image.image_type,
            "product_id": image.product.id,
        }))
        .log();

    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/image/{id}",
    tag = IMAGE_TAG,
    params(
        ("id" = i64, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = DatabaseUnavailableResponse)
    )
)]
async fn delete_image<R: CatalogRepository>(
    State(service): State<Arc<CatalogService<R>>>,
    headers: HeaderMap,
    IdPath(id): IdPath,
) -> CatalogResult<StatusCode> {
    service.delete_image(id).await?;

    audit("image.delete", format!("image:{}", id), &headers).log();

    Ok(StatusCode::OK)
}
