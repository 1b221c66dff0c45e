//! `SeaORM` Entity for placement_billings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "placement_billings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub placement_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub bill_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub overtime_bill_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub pay_rate: Decimal,
    pub effective_from: Date,
    pub effective_to: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::placements::Entity",
        from = "Column::PlacementId",
        to = "super::placements::Column::Id"
    )]
    Placements,
}

impl Related<super::placements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Placements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
