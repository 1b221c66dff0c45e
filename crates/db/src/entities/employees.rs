//! `SeaORM` Entity for employees table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employment_type_id: i16,
    pub status: String,
    pub joining_date: Date,
    pub relieving_date: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub offboarding_reason: Option<String>,
    pub rejoin_count: i32,
    pub is_tenant_owner: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id"
    )]
    Tenants,
    #[sea_orm(has_many = "super::employee_documents::Entity")]
    EmployeeDocuments,
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::approval_users::Entity")]
    ApprovalUsers,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenants.def()
    }
}

impl Related<super::employee_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmployeeDocuments.def()
    }
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::approval_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
