//! `SeaORM` Entity for placements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "placements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub reference_id: String,
    pub employee_id: Uuid,
    pub client_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub end_client_id: Option<Uuid>,
    pub job_title: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub timesheet_approval_config_type: i16,
    pub timesheet_approval_id: Option<Uuid>,
    pub invoice_approval_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::EmployeeId",
        to = "super::employees::Column::Id"
    )]
    Employees,
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::ClientId",
        to = "super::companies::Column::Id"
    )]
    Client,
    #[sea_orm(has_many = "super::placement_billings::Entity")]
    PlacementBillings,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employees.def()
    }
}

impl Related<super::placement_billings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlacementBillings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
