use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Hierarchical product catalog with product images"
    ),
    nest(
        (path = crate::api::PRODUCT_PATH, api = domain_catalog::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
