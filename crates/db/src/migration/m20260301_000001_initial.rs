//! Initial database migration.
//!
//! Creates tenants, employees, companies, approval settings, placements,
//! billings and employee documents.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANTS & EMPLOYEES
        // ============================================================
        db.execute_unprepared(TENANTS_SQL).await?;
        db.execute_unprepared(EMPLOYEES_SQL).await?;
        db.execute_unprepared(EMPLOYEE_DOCUMENTS_SQL).await?;

        // ============================================================
        // PART 2: APPROVAL CONFIGURATION
        // ============================================================
        db.execute_unprepared(APPROVAL_SETTINGS_SQL).await?;
        db.execute_unprepared(APPROVAL_LEVELS_SQL).await?;
        db.execute_unprepared(APPROVAL_USERS_SQL).await?;

        // ============================================================
        // PART 3: COMPANIES & PLACEMENTS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(PLACEMENTS_SQL).await?;
        db.execute_unprepared(PLACEMENT_BILLINGS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const TENANTS_SQL: &str = r"
CREATE TABLE tenants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    slug VARCHAR(100) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const EMPLOYEES_SQL: &str = r"
CREATE TABLE employees (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    reference_id VARCHAR(20) NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL,
    phone VARCHAR(30),
    employment_type_id SMALLINT NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'active',
    joining_date DATE NOT NULL,
    relieving_date DATE,
    offboarding_reason TEXT,
    rejoin_count INTEGER NOT NULL DEFAULT 0,
    is_tenant_owner BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_employment_type CHECK (employment_type_id IN (1, 2)),
    CONSTRAINT chk_employee_status CHECK (status IN ('active', 'inactive')),
    CONSTRAINT chk_relieving_after_joining CHECK (relieving_date IS NULL OR relieving_date >= joining_date)
);

CREATE UNIQUE INDEX uq_employees_reference ON employees(tenant_id, reference_id);
CREATE UNIQUE INDEX uq_employees_email ON employees(tenant_id, lower(email)) WHERE deleted_at IS NULL;
CREATE INDEX idx_employees_status ON employees(tenant_id, status) WHERE deleted_at IS NULL;
";

const EMPLOYEE_DOCUMENTS_SQL: &str = r"
CREATE TABLE employee_documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    document_type VARCHAR(20) NOT NULL,
    document_number VARCHAR(50) NOT NULL,
    issuing_country VARCHAR(100) NOT NULL,
    visa_type VARCHAR(50),
    issued_on DATE NOT NULL,
    expires_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_document_type CHECK (document_type IN ('passport', 'visa')),
    CONSTRAINT chk_document_dates CHECK (expires_on > issued_on)
);

CREATE INDEX idx_employee_documents_employee ON employee_documents(employee_id) WHERE deleted_at IS NULL;
";

const APPROVAL_SETTINGS_SQL: &str = r"
CREATE TABLE approval_settings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    approval_module SMALLINT NOT NULL,
    is_global BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_approval_module CHECK (approval_module IN (1, 2))
);

CREATE UNIQUE INDEX uq_approval_settings_global
    ON approval_settings(tenant_id, approval_module)
    WHERE is_global AND deleted_at IS NULL;
";

// No unique (setting, rank) index: re-ranking swaps levels in one transaction.
const APPROVAL_LEVELS_SQL: &str = r"
CREATE TABLE approval_levels (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    approval_setting_id UUID NOT NULL REFERENCES approval_settings(id) ON DELETE CASCADE,
    rank INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_rank_positive CHECK (rank > 0)
);

CREATE INDEX idx_approval_levels_setting ON approval_levels(approval_setting_id, rank) WHERE deleted_at IS NULL;
";

const APPROVAL_USERS_SQL: &str = r"
CREATE TABLE approval_users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    approval_level_id UUID NOT NULL REFERENCES approval_levels(id) ON DELETE CASCADE,
    approver_id UUID NOT NULL REFERENCES employees(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX uq_approval_users_active
    ON approval_users(approval_level_id, approver_id)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_approval_users_approver ON approval_users(approver_id) WHERE deleted_at IS NULL;
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    reference_id VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    company_type VARCHAR(20) NOT NULL,
    email VARCHAR(255),
    phone VARCHAR(30),
    timesheet_cycle VARCHAR(20),
    timesheet_approval_id UUID REFERENCES approval_settings(id),
    invoice_approval_id UUID REFERENCES approval_settings(id),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_company_type CHECK (company_type IN ('client', 'vendor', 'end_client')),
    CONSTRAINT chk_timesheet_cycle CHECK (
        timesheet_cycle IS NULL
        OR timesheet_cycle IN ('weekly', 'bi_weekly', 'semi_monthly', 'monthly')
    )
);

CREATE UNIQUE INDEX uq_companies_reference ON companies(tenant_id, reference_id);
CREATE INDEX idx_companies_type ON companies(tenant_id, company_type) WHERE deleted_at IS NULL;
";

const PLACEMENTS_SQL: &str = r"
CREATE TABLE placements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    reference_id VARCHAR(20) NOT NULL,
    employee_id UUID NOT NULL REFERENCES employees(id),
    client_id UUID NOT NULL REFERENCES companies(id),
    vendor_id UUID REFERENCES companies(id),
    end_client_id UUID REFERENCES companies(id),
    job_title VARCHAR(255) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE,
    timesheet_approval_config_type SMALLINT NOT NULL DEFAULT 1,
    timesheet_approval_id UUID REFERENCES approval_settings(id),
    invoice_approval_id UUID REFERENCES approval_settings(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_config_type CHECK (timesheet_approval_config_type IN (1, 2, 3)),
    CONSTRAINT chk_placement_dates CHECK (end_date IS NULL OR end_date >= start_date)
);

CREATE UNIQUE INDEX uq_placements_reference ON placements(tenant_id, reference_id);
CREATE INDEX idx_placements_employee ON placements(employee_id) WHERE deleted_at IS NULL;
CREATE INDEX idx_placements_client ON placements(client_id) WHERE deleted_at IS NULL;
";

const PLACEMENT_BILLINGS_SQL: &str = r"
CREATE TABLE placement_billings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    placement_id UUID NOT NULL REFERENCES placements(id) ON DELETE CASCADE,
    bill_rate NUMERIC(12, 2) NOT NULL,
    overtime_bill_rate NUMERIC(12, 2) NOT NULL DEFAULT 0,
    pay_rate NUMERIC(12, 2) NOT NULL,
    effective_from DATE NOT NULL,
    effective_to DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_rates_positive CHECK (bill_rate > 0 AND pay_rate > 0 AND overtime_bill_rate >= 0),
    CONSTRAINT chk_pay_not_above_bill CHECK (pay_rate <= bill_rate),
    CONSTRAINT chk_billing_period CHECK (effective_to IS NULL OR effective_to >= effective_from)
);

CREATE INDEX idx_placement_billings_placement
    ON placement_billings(placement_id, effective_from DESC)
    WHERE deleted_at IS NULL;
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at() RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_employees_updated_at BEFORE UPDATE ON employees
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_employee_documents_updated_at BEFORE UPDATE ON employee_documents
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_approval_settings_updated_at BEFORE UPDATE ON approval_settings
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_approval_levels_updated_at BEFORE UPDATE ON approval_levels
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_approval_users_updated_at BEFORE UPDATE ON approval_users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_companies_updated_at BEFORE UPDATE ON companies
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_placements_updated_at BEFORE UPDATE ON placements
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_placement_billings_updated_at BEFORE UPDATE ON placement_billings
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS placement_billings CASCADE;
DROP TABLE IF EXISTS placements CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
DROP TABLE IF EXISTS approval_users CASCADE;
DROP TABLE IF EXISTS approval_levels CASCADE;
DROP TABLE IF EXISTS approval_settings CASCADE;
DROP TABLE IF EXISTS employee_documents CASCADE;
DROP TABLE IF EXISTS employees CASCADE;
DROP TABLE IF EXISTS tenants CASCADE;
DROP FUNCTION IF EXISTS set_updated_at() CASCADE;
";
