//! `SeaORM` Entity for approval_levels table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_levels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub approval_setting_id: Uuid,
    pub rank: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_settings::Entity",
        from = "Column::ApprovalSettingId",
        to = "super::approval_settings::Column::Id"
    )]
    ApprovalSettings,
    #[sea_orm(has_many = "super::approval_users::Entity")]
    ApprovalUsers,
}

impl Related<super::approval_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSettings.def()
    }
}

impl Related<super::approval_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
