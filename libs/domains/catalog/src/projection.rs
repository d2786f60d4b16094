use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use utoipa::IntoParams;

use crate::models::ProductDetails;

/// Query flags that blank out the nested collections of a product view.
///
/// Only the response is affected; stored data is untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct Projection {
    /// Return `children` as an empty list
    #[serde(deserialize_with = "lenient_flag")]
    pub exclude_children: bool,
    /// Return `images` as an empty list
    #[serde(deserialize_with = "lenient_flag")]
    pub exclude_images: bool,
}

/// Reads a query flag: `true` in any letter case is set, every other value
/// (including an empty one) is unset.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean flag")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            Ok(value.trim().eq_ignore_ascii_case("true"))
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

impl Projection {
    pub fn new(exclude_children: bool, exclude_images: bool) -> Self {
        Self {
            exclude_children,
            exclude_images,
        }
    }

    pub fn apply(&self, mut details: ProductDetails) -> ProductDetails {
        if self.exclude_children {
            details.children.clear();
        }
        if self.exclude_images {
            details.images.clear();
        }
        details
    }

    pub fn apply_all(&self, details: Vec<ProductDetails>) -> Vec<ProductDetails> {
        details.into_iter().map(|d| self.apply(d)).collect()
    }
}
