//! `SeaORM` Entity for approval_users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub approval_level_id: Uuid,
    pub approver_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_levels::Entity",
        from = "Column::ApprovalLevelId",
        to = "super::approval_levels::Column::Id"
    )]
    ApprovalLevels,
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::ApproverId",
        to = "super::employees::Column::Id"
    )]
    Employees,
}

impl Related<super::approval_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalLevels.def()
    }
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
