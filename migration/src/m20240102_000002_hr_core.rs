use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

use crate::m20240101_000001_identity::Users;

#[derive(DeriveIden)]
enum EmployeeProfiles {
    Table,
    Id,
    UserId,
    FirstName,
    LastName,
    Phone,
    Address,
    DateOfBirth,
    ProfilePicture,
    Department,
    Position,
    HireDate,
    EmploymentType,
    Documents,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Attendance {
    Table,
    Id,
    UserId,
    Date,
    CheckIn,
    CheckOut,
    Status,
    TotalHours,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum LeaveRequests {
    Table,
    Id,
    UserId,
    LeaveType,
    StartDate,
    EndDate,
    TotalDays,
    Remarks,
    Status,
    AdminComments,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payroll {
    Table,
    Id,
    UserId,
    BaseSalaryCents,
    AllowancesCents,
    DeductionsCents,
    NetSalaryCents,
    Currency,
    PayPeriodStart,
    PayPeriodEnd,
    Notes,
    EffectiveFrom,
    EffectiveTo,
    CreatedAt,
    UpdatedAt,
}

// Partial indexes are not expressible through the index builder; both
// Postgres and SQLite accept this form.
const ACTIVE_PAYROLL_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS ux_payroll_active \
     ON payroll (user_id) WHERE effective_to IS NULL";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmployeeProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmployeeProfiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmployeeProfiles::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(EmployeeProfiles::FirstName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployeeProfiles::LastName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmployeeProfiles::Phone).string_len(20))
                    .col(ColumnDef::new(EmployeeProfiles::Address).text())
                    .col(ColumnDef::new(EmployeeProfiles::DateOfBirth).date())
                    .col(ColumnDef::new(EmployeeProfiles::ProfilePicture).string_len(255))
                    .col(ColumnDef::new(EmployeeProfiles::Department).string_len(100))
                    .col(ColumnDef::new(EmployeeProfiles::Position).string_len(100))
                    .col(ColumnDef::new(EmployeeProfiles::HireDate).date())
                    .col(ColumnDef::new(EmployeeProfiles::EmploymentType).string_len(50))
                    .col(ColumnDef::new(EmployeeProfiles::Documents).text())
                    .col(
                        ColumnDef::new(EmployeeProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EmployeeProfiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_profiles_user")
                            .from(EmployeeProfiles::Table, EmployeeProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("ux_employee_profiles_user")
                    .table(EmployeeProfiles::Table)
                    .col(EmployeeProfiles::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Attendance::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Attendance::UserId).uuid().not_null())
                    .col(ColumnDef::new(Attendance::Date).date().not_null())
                    .col(ColumnDef::new(Attendance::CheckIn).timestamp_with_time_zone())
                    .col(ColumnDef::new(Attendance::CheckOut).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Attendance::Status)
                            .string_len(20)
                            .not_null()
                            .default("absent"),
                    )
                    .col(
                        ColumnDef::new(Attendance::TotalHours)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Attendance::Notes).text())
                    .col(
                        ColumnDef::new(Attendance::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendance_user")
                            .from(Attendance::Table, Attendance::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("unique_user_date")
                    .table(Attendance::Table)
                    .col(Attendance::UserId)
                    .col(Attendance::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveRequests::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(LeaveRequests::LeaveType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LeaveRequests::StartDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::EndDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequests::TotalDays).integer().not_null())
                    .col(ColumnDef::new(LeaveRequests::Remarks).text())
                    .col(
                        ColumnDef::new(LeaveRequests::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(LeaveRequests::AdminComments).text())
                    .col(ColumnDef::new(LeaveRequests::ReviewedBy).uuid())
                    .col(ColumnDef::new(LeaveRequests::ReviewedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(LeaveRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(LeaveRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(
                        Expr::col(LeaveRequests::EndDate)
                            .gte(Expr::col(LeaveRequests::StartDate)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_user")
                            .from(LeaveRequests::Table, LeaveRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leave_requests_reviewer")
                            .from(LeaveRequests::Table, LeaveRequests::ReviewedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_leave_requests_user_status")
                    .table(LeaveRequests::Table)
                    .col(LeaveRequests::UserId)
                    .col(LeaveRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payroll::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payroll::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Payroll::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Payroll::BaseSalaryCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payroll::AllowancesCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Payroll::DeductionsCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Payroll::NetSalaryCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payroll::Currency)
                            .string_len(10)
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Payroll::PayPeriodStart).date())
                    .col(ColumnDef::new(Payroll::PayPeriodEnd).date())
                    .col(ColumnDef::new(Payroll::Notes).text())
                    .col(ColumnDef::new(Payroll::EffectiveFrom).date().not_null())
                    .col(ColumnDef::new(Payroll::EffectiveTo).date())
                    .col(
                        ColumnDef::new(Payroll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Payroll::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payroll_user")
                            .from(Payroll::Table, Payroll::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payroll_user_effective")
                    .table(Payroll::Table)
                    .col(Payroll::UserId)
                    .col(Payroll::EffectiveFrom)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(ACTIVE_PAYROLL_INDEX)
            .await
            .map(|_| ())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS ux_payroll_active")
            .await?;
        manager
            .drop_table(Table::drop().table(Payroll::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LeaveRequests::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attendance::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(EmployeeProfiles::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
