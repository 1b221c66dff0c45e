//! `SeaORM` Entity for approval_settings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub approval_module: i16,
    pub is_global: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::approval_levels::Entity")]
    ApprovalLevels,
}

impl Related<super::approval_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalLevels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
