//! Catalog entities.
//!
//! Products own their images, dimensions, reviews and tag associations; categories,
//! brands and tags are shared lookup rows resolved by name.

pub mod brand;
pub mod category;
pub mod product;
pub mod product_dimension;
pub mod product_image;
pub mod product_tag;
pub mod review;
pub mod tag;

pub use brand::{Entity as Brand, Model as BrandModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_dimension::{Entity as ProductDimension, Model as ProductDimensionModel};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_tag::{Entity as ProductTag, Model as ProductTagModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use tag::{Entity as Tag, Model as TagModel};
