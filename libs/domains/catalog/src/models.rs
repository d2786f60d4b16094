use sea_orm::sea_query::StringLen;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

/// Supported image encodings
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ImageType {
    #[sea_orm(string_value = "BAT")]
    Bat,
    #[sea_orm(string_value = "BMP")]
    Bmp,
    #[sea_orm(string_value = "EXIF")]
    Exif,
    #[sea_orm(string_value = "GIF")]
    Gif,
    #[sea_orm(string_value = "JPEG")]
    Jpeg,
    #[sea_orm(string_value = "PNG")]
    Png,
    #[sea_orm(string_value = "RAW")]
    Raw,
}

/// Resolved reference to a stored product, as returned by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct ProductRef {
    pub id: i64,
}

impl From<i64> for ProductRef {
    fn from(id: i64) -> Self {
        Self { id }
    }
}

/// Reference as written by a client; `id` may be missing or null
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceInput {
    #[serde(default)]
    pub id: Option<i64>,
}

/// Flat product record. `children` and `images` are never embedded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// `null` for a root product
    pub parent: Option<ProductRef>,
}

impl Product {
    pub fn parent_id(&self) -> Option<i64> {
        self.parent.map(|p| p.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Image {
    pub id: i64,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    pub product: ProductRef,
}

/// Product together with its direct children and its images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetails {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub parent: Option<ProductRef>,
    pub children: Vec<Product>,
    pub images: Vec<Image>,
}

impl ProductDetails {
    pub fn assemble(product: Product, children: Vec<Product>, images: Vec<Image>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            parent: product.parent,
            children,
            images,
        }
    }

    /// Attach to each product its direct children and images. Input order is
    /// kept at every level.
    pub fn assemble_all(products: Vec<Product>, images: Vec<Image>) -> Vec<Self> {
        let mut children: HashMap<i64, Vec<Product>> = HashMap::new();
        for product in &products {
            if let Some(parent_id) = product.parent_id() {
                children.entry(parent_id).or_default().push(product.clone());
            }
        }

        let mut images_by_product: HashMap<i64, Vec<Image>> = HashMap::new();
        for image in images {
            images_by_product.entry(image.product.id).or_default().push(image);
        }

        products
            .into_iter()
            .map(|product| {
                let kids = children.remove(&product.id).unwrap_or_default();
                let imgs = images_by_product.remove(&product.id).unwrap_or_default();
                Self::assemble(product, kids, imgs)
            })
            .collect()
    }
}

/// Body of `POST /product` and `PUT /product/{id}`.
///
/// Every field is optional on the wire so that the service, not the JSON
/// decoder, decides how an incomplete product is rejected. An `id` in the
/// body is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductInput {
    #[serde(default, skip_serializing)]
    #[schema(read_only)]
    pub id: Option<i64>,

    #[validate(required, length(min = 1))]
    #[serde(default)]
    pub name: Option<String>,

    #[validate(required, length(min = 1))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parent: Option<ReferenceInput>,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent = Some(ReferenceInput {
            id: Some(parent_id),
        });
        self
    }
}

/// Body of `POST /product/image` and `PUT /product/image/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImageInput {
    #[serde(default, skip_serializing)]
    #[schema(read_only)]
    pub id: Option<i64>,

    #[validate(required)]
    #[serde(default, rename = "type")]
    pub image_type: Option<ImageType>,

    #[serde(default)]
    pub product: Option<ReferenceInput>,
}

impl ImageInput {
    pub fn new(image_type: ImageType, product_id: i64) -> Self {
        Self {
            id: None,
            image_type: Some(image_type),
            product: Some(ReferenceInput {
                id: Some(product_id),
            }),
        }
    }
}

/// Product fields after validation, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewImage {
    pub image_type: ImageType,
    pub product_id: i64,
}

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletedTree {
    pub products: u64,
    pub images: u64,
}
