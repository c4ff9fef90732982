use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Physical dimensions; at most one row per product.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_dimensions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub product_id: i32,

    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub width: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub height: Option<Decimal>,

    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub depth: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
