//! Database seeder for StaffDesk development and testing.
//!
//! Seeds a tenant with its owner, a few internal approvers, consultants,
//! a client with timesheet and invoice approvals, and one placement with
//! billing. Prints an access token for the owner.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

use staffdesk_core::approval::{
    ApprovalConfigInput, ApprovalConfigType, ApprovalLevelInput, ApprovalModule,
};
use staffdesk_core::company::{CompanyType, TimesheetCycle};
use staffdesk_core::employee::EmploymentType;
use staffdesk_core::placement::BillingRates;
use staffdesk_db::entities::{employees, tenants};
use staffdesk_db::repositories::{
    CreateBillingInput, CreateCompanyInput, CreateEmployeeInput, CreatePlacementInput,
    TimesheetConfigInput,
};
use staffdesk_db::{
    ApprovalRepository, CompanyRepository, EmployeeRepository, PlacementRepository,
    SessionRepository,
};
use staffdesk_shared::{AppConfig, JwtService, TokenKind};

/// Seed tenant ID (consistent for all seeds)
const SEED_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database.url.clone());

    println!("Connecting to database...");
    let db = staffdesk_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let tenant_id = Uuid::parse_str(SEED_TENANT_ID)?;
    if tenants::Entity::find_by_id(tenant_id).one(&db).await?.is_some() {
        println!("Seed tenant already exists, skipping.");
        return Ok(());
    }

    println!("Seeding tenant...");
    seed_tenant(&db, tenant_id).await?;

    println!("Seeding employees...");
    let owner = seed_employee(&db, tenant_id, "Olivia", "Owner", EmploymentType::Internal).await?;
    let mut owner_model = owner.clone().into_active_model();
    owner_model.is_tenant_owner = Set(true);
    owner_model.update(&db).await?;

    let recruiter = seed_employee(&db, tenant_id, "Riya", "Recruiter", EmploymentType::Internal).await?;
    let manager = seed_employee(&db, tenant_id, "Marco", "Manager", EmploymentType::Internal).await?;
    let consultant = seed_employee(&db, tenant_id, "Chen", "Consultant", EmploymentType::Consultant).await?;

    println!("Seeding global approval settings...");
    let approvals = ApprovalRepository::new(db.clone());
    for module in [ApprovalModule::Timesheet, ApprovalModule::Invoice] {
        approvals
            .store_global_config(
                tenant_id,
                module,
                &ApprovalConfigInput {
                    approvals: vec![ApprovalLevelInput::new(1, vec![owner.id])],
                    ..ApprovalConfigInput::default()
                },
            )
            .await?;
    }

    println!("Seeding companies...");
    let companies = CompanyRepository::new(db.clone());
    let client = companies
        .create(
            tenant_id,
            CreateCompanyInput {
                name: "Globex Corporation".to_string(),
                company_type: CompanyType::Client,
                email: Some("ap@globex.example".to_string()),
                phone: None,
                timesheet: Some(TimesheetConfigInput {
                    cycle: Some(TimesheetCycle::Weekly),
                    approvals: ApprovalConfigInput {
                        approvals: vec![
                            ApprovalLevelInput::new(1, vec![recruiter.id, manager.id]),
                            ApprovalLevelInput::new(2, vec![owner.id]),
                        ],
                        ..ApprovalConfigInput::default()
                    },
                }),
                invoice: Some(ApprovalConfigInput {
                    approvals: vec![ApprovalLevelInput::new(1, vec![manager.id])],
                    ..ApprovalConfigInput::default()
                }),
            },
        )
        .await?;
    let vendor = companies
        .create(
            tenant_id,
            CreateCompanyInput {
                name: "Initech Staffing".to_string(),
                company_type: CompanyType::Vendor,
                email: None,
                phone: None,
                timesheet: None,
                invoice: None,
            },
        )
        .await?;
    println!(
        "  Created {} and {}",
        client.company.reference_id, vendor.company.reference_id
    );

    println!("Seeding placement...");
    let placements = PlacementRepository::new(db.clone());
    let start = Utc::now().date_naive() - Duration::days(90);
    let placement = placements
        .create(
            tenant_id,
            CreatePlacementInput {
                employee_id: consultant.id,
                client_id: client.company.id,
                vendor_id: Some(vendor.company.id),
                end_client_id: None,
                job_title: "Senior Data Engineer".to_string(),
                start_date: start,
                end_date: None,
                timesheet_config_type: ApprovalConfigType::InheritClient,
                timesheet_approvals: Vec::new(),
                invoice: None,
            },
        )
        .await?;
    for (offset, bill, pay) in [(0, 9500, 6000), (60, 10_000, 6300)] {
        placements
            .add_billing(
                tenant_id,
                placement.placement.id,
                CreateBillingInput {
                    rates: BillingRates {
                        bill_rate: Decimal::new(bill, 2),
                        overtime_bill_rate: Decimal::new(bill * 3 / 2, 2),
                        pay_rate: Decimal::new(pay, 2),
                    },
                    effective_from: start + Duration::days(offset),
                },
            )
            .await?;
    }
    println!("  Created {}", placement.placement.reference_id);

    let jwt = JwtService::new(&config.jwt);
    let access = jwt.issue(TokenKind::Access, owner.id, tenant_id, "owner")?;
    let refresh = jwt.issue(TokenKind::Refresh, owner.id, tenant_id, "owner")?;
    SessionRepository::new(db.clone())
        .create(
            owner.id,
            tenant_id,
            &refresh,
            jwt.expires_at(TokenKind::Refresh)?,
            Some("seeder"),
        )
        .await?;

    println!("Seeding complete!");
    println!("Owner access token:\n{access}");
    Ok(())
}

/// Seeds the development tenant.
async fn seed_tenant(db: &DatabaseConnection, tenant_id: Uuid) -> anyhow::Result<()> {
    let now = Utc::now().fixed_offset();
    tenants::ActiveModel {
        id: Set(tenant_id),
        name: Set("Acme Consulting".to_string()),
        slug: Set("acme-consulting".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_employee(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    first_name: &str,
    last_name: &str,
    employment_type: EmploymentType,
) -> anyhow::Result<employees::Model> {
    let employee = EmployeeRepository::new(db.clone())
        .create(
            tenant_id,
            CreateEmployeeInput {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: format!(
                    "{}.{}@acme.example",
                    first_name.to_lowercase(),
                    last_name.to_lowercase()
                ),
                phone: None,
                employment_type,
                joining_date: NaiveDate::from_ymd_opt(2024, 1, 2).context("joining date")?,
            },
        )
        .await?;
    println!("  Created {} {}", employee.reference_id, employee.first_name);
    Ok(employee)
}
