use async_graphql::{Enum, ID, InputObject, SimpleObject};
use chrono::NaiveDate;
use entity::{attendance, employee_profiles, leave_requests, payroll, users};
use products_hr::attendance::DailySummary;
use products_hr::leave::Decision;
use products_hr::payroll::PayrollChange;
use products_hr::profile::{EmployeeRecord, ProfileDetails, ProfileUpdate};
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoleKind {
    #[graphql(name = "ADMIN")]
    Admin,
    #[graphql(name = "EMPLOYEE")]
    Employee,
}

impl From<users::Role> for RoleKind {
    fn from(value: users::Role) -> Self {
        match value {
            users::Role::Admin => RoleKind::Admin,
            users::Role::Employee => RoleKind::Employee,
        }
    }
}

impl From<RoleKind> for users::Role {
    fn from(value: RoleKind) -> Self {
        match value {
            RoleKind::Admin => users::Role::Admin,
            RoleKind::Employee => users::Role::Employee,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum AttendanceStatus {
    #[graphql(name = "PRESENT")]
    Present,
    #[graphql(name = "ABSENT")]
    Absent,
    #[graphql(name = "HALF_DAY")]
    HalfDay,
    #[graphql(name = "LEAVE")]
    Leave,
}

impl From<attendance::Status> for AttendanceStatus {
    fn from(value: attendance::Status) -> Self {
        match value {
            attendance::Status::Present => AttendanceStatus::Present,
            attendance::Status::Absent => AttendanceStatus::Absent,
            attendance::Status::HalfDay => AttendanceStatus::HalfDay,
            attendance::Status::Leave => AttendanceStatus::Leave,
        }
    }
}

impl From<AttendanceStatus> for attendance::Status {
    fn from(value: AttendanceStatus) -> Self {
        match value {
            AttendanceStatus::Present => attendance::Status::Present,
            AttendanceStatus::Absent => attendance::Status::Absent,
            AttendanceStatus::HalfDay => attendance::Status::HalfDay,
            AttendanceStatus::Leave => attendance::Status::Leave,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum LeaveKind {
    #[graphql(name = "PAID")]
    Paid,
    #[graphql(name = "SICK")]
    Sick,
    #[graphql(name = "UNPAID")]
    Unpaid,
}

impl From<leave_requests::LeaveType> for LeaveKind {
    fn from(value: leave_requests::LeaveType) -> Self {
        match value {
            leave_requests::LeaveType::Paid => LeaveKind::Paid,
            leave_requests::LeaveType::Sick => LeaveKind::Sick,
            leave_requests::LeaveType::Unpaid => LeaveKind::Unpaid,
        }
    }
}

impl From<LeaveKind> for leave_requests::LeaveType {
    fn from(value: LeaveKind) -> Self {
        match value {
            LeaveKind::Paid => leave_requests::LeaveType::Paid,
            LeaveKind::Sick => leave_requests::LeaveType::Sick,
            LeaveKind::Unpaid => leave_requests::LeaveType::Unpaid,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum LeaveStatus {
    #[graphql(name = "PENDING")]
    Pending,
    #[graphql(name = "APPROVED")]
    Approved,
    #[graphql(name = "REJECTED")]
    Rejected,
}

impl From<leave_requests::Status> for LeaveStatus {
    fn from(value: leave_requests::Status) -> Self {
        match value {
            leave_requests::Status::Pending => LeaveStatus::Pending,
            leave_requests::Status::Approved => LeaveStatus::Approved,
            leave_requests::Status::Rejected => LeaveStatus::Rejected,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum LeaveDecision {
    #[graphql(name = "APPROVE")]
    Approve,
    #[graphql(name = "REJECT")]
    Reject,
}

impl From<LeaveDecision> for Decision {
    fn from(value: LeaveDecision) -> Self {
        match value {
            LeaveDecision::Approve => Decision::Approve,
            LeaveDecision::Reject => Decision::Reject,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum EmploymentKind {
    #[graphql(name = "FULL_TIME")]
    FullTime,
    #[graphql(name = "PART_TIME")]
    PartTime,
    #[graphql(name = "CONTRACT")]
    Contract,
}

impl From<employee_profiles::EmploymentType> for EmploymentKind {
    fn from(value: employee_profiles::EmploymentType) -> Self {
        match value {
            employee_profiles::EmploymentType::FullTime => EmploymentKind::FullTime,
            employee_profiles::EmploymentType::PartTime => EmploymentKind::PartTime,
            employee_profiles::EmploymentType::Contract => EmploymentKind::Contract,
        }
    }
}

impl From<EmploymentKind> for employee_profiles::EmploymentType {
    fn from(value: EmploymentKind) -> Self {
        match value {
            EmploymentKind::FullTime => employee_profiles::EmploymentType::FullTime,
            EmploymentKind::PartTime => employee_profiles::EmploymentType::PartTime,
            EmploymentKind::Contract => employee_profiles::EmploymentType::Contract,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct IdentityNode {
    pub id: ID,
    #[graphql(name = "employeeCode")]
    pub employee_code: String,
    pub email: String,
    pub role: RoleKind,
    #[graphql(name = "createdAt")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<users::Model> for IdentityNode {
    fn from(model: users::Model) -> Self {
        Self {
            id: ID(model.id.to_string()),
            employee_code: model.employee_code,
            email: model.email,
            role: model.role.into(),
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ProfileNode {
    pub id: ID,
    #[graphql(name = "userId")]
    pub user_id: ID,
    #[graphql(name = "firstName")]
    pub first_name: String,
    #[graphql(name = "lastName")]
    pub last_name: String,
    #[graphql(name = "fullName")]
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[graphql(name = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
    #[graphql(name = "profilePicture")]
    pub profile_picture: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[graphql(name = "hireDate")]
    pub hire_date: Option<NaiveDate>,
    #[graphql(name = "employmentType")]
    pub employment_type: Option<EmploymentKind>,
    pub documents: Option<String>,
    #[graphql(name = "updatedAt")]
    pub updated_at: DateTimeWithTimeZone,
}

impl From<employee_profiles::Model> for ProfileNode {
    fn from(model: employee_profiles::Model) -> Self {
        Self {
            id: ID(model.id.to_string()),
            user_id: ID(model.user_id.to_string()),
            full_name: model.full_name(),
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            address: model.address,
            date_of_birth: model.date_of_birth,
            profile_picture: model.profile_picture,
            department: model.department,
            position: model.position,
            hire_date: model.hire_date,
            employment_type: model.employment_type.map(Into::into),
            documents: model.documents,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct EmployeeNode {
    pub identity: IdentityNode,
    pub profile: Option<ProfileNode>,
}

impl From<EmployeeRecord> for EmployeeNode {
    fn from(record: EmployeeRecord) -> Self {
        Self {
            identity: record.identity.into(),
            profile: record.profile.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct AttendanceNode {
    pub id: ID,
    #[graphql(name = "userId")]
    pub user_id: ID,
    pub date: NaiveDate,
    #[graphql(name = "checkIn")]
    pub check_in: Option<DateTimeWithTimeZone>,
    #[graphql(name = "checkOut")]
    pub check_out: Option<DateTimeWithTimeZone>,
    pub status: AttendanceStatus,
    #[graphql(name = "totalHours")]
    pub total_hours: f64,
    pub notes: Option<String>,
}

impl From<attendance::Model> for AttendanceNode {
    fn from(model: attendance::Model) -> Self {
        Self {
            id: ID(model.id.to_string()),
            user_id: ID(model.user_id.to_string()),
            date: model.date,
            check_in: model.check_in,
            check_out: model.check_out,
            status: model.status.into(),
            total_hours: model.total_hours,
            notes: model.notes,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct DailySummaryNode {
    pub date: Option<NaiveDate>,
    pub present: u64,
    pub absent: u64,
    #[graphql(name = "halfDay")]
    pub half_day: u64,
    #[graphql(name = "onLeave")]
    pub on_leave: u64,
    #[graphql(name = "notRecorded")]
    pub not_recorded: u64,
}

impl From<DailySummary> for DailySummaryNode {
    fn from(summary: DailySummary) -> Self {
        Self {
            date: summary.date,
            present: summary.present,
            absent: summary.absent,
            half_day: summary.half_day,
            on_leave: summary.on_leave,
            not_recorded: summary.not_recorded,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct LeaveRequestNode {
    pub id: ID,
    #[graphql(name = "userId")]
    pub user_id: ID,
    #[graphql(name = "leaveType")]
    pub leave_type: LeaveKind,
    #[graphql(name = "startDate")]
    pub start_date: NaiveDate,
    #[graphql(name = "endDate")]
    pub end_date: NaiveDate,
    #[graphql(name = "totalDays")]
    pub total_days: i32,
    pub remarks: Option<String>,
    pub status: LeaveStatus,
    #[graphql(name = "adminComments")]
    pub admin_comments: Option<String>,
    #[graphql(name = "reviewedBy")]
    pub reviewed_by: Option<ID>,
    #[graphql(name = "reviewedAt")]
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    #[graphql(name = "createdAt")]
    pub created_at: DateTimeWithTimeZone,
}

impl From<leave_requests::Model> for LeaveRequestNode {
    fn from(model: leave_requests::Model) -> Self {
        Self {
            id: ID(model.id.to_string()),
            user_id: ID(model.user_id.to_string()),
            leave_type: model.leave_type.into(),
            start_date: model.start_date,
            end_date: model.end_date,
            total_days: model.total_days,
            remarks: model.remarks,
            status: model.status.into(),
            admin_comments: model.admin_comments,
            reviewed_by: model.reviewed_by.map(|id| ID(id.to_string())),
            reviewed_at: model.reviewed_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct PayrollNode {
    pub id: ID,
    #[graphql(name = "userId")]
    pub user_id: ID,
    #[graphql(name = "baseSalaryCents")]
    pub base_salary_cents: i64,
    #[graphql(name = "allowancesCents")]
    pub allowances_cents: i64,
    #[graphql(name = "deductionsCents")]
    pub deductions_cents: i64,
    #[graphql(name = "netSalaryCents")]
    pub net_salary_cents: i64,
    pub currency: String,
    #[graphql(name = "payPeriodStart")]
    pub pay_period_start: Option<NaiveDate>,
    #[graphql(name = "payPeriodEnd")]
    pub pay_period_end: Option<NaiveDate>,
    pub notes: Option<String>,
    #[graphql(name = "effectiveFrom")]
    pub effective_from: NaiveDate,
    #[graphql(name = "effectiveTo")]
    pub effective_to: Option<NaiveDate>,
    pub active: bool,
}

impl From<payroll::Model> for PayrollNode {
    fn from(model: payroll::Model) -> Self {
        Self {
            id: ID(model.id.to_string()),
            user_id: ID(model.user_id.to_string()),
            active: model.is_active(),
            base_salary_cents: model.base_salary_cents,
            allowances_cents: model.allowances_cents,
            deductions_cents: model.deductions_cents,
            net_salary_cents: model.net_salary_cents,
            currency: model.currency,
            pay_period_start: model.pay_period_start,
            pay_period_end: model.pay_period_end,
            notes: model.notes,
            effective_from: model.effective_from,
            effective_to: model.effective_to,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct PayrollChangePayload {
    pub created: PayrollNode,
    pub closed: Option<PayrollNode>,
}

impl From<PayrollChange> for PayrollChangePayload {
    fn from(change: PayrollChange) -> Self {
        Self {
            created: change.created.into(),
            closed: change.closed.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, InputObject)]
pub struct RecordAttendanceInput {
    #[graphql(name = "userId")]
    pub user_id: ID,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[graphql(name = "checkIn")]
    pub check_in: Option<DateTimeWithTimeZone>,
    #[graphql(name = "checkOut")]
    pub check_out: Option<DateTimeWithTimeZone>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
pub struct SubmitLeaveInput {
    #[graphql(name = "leaveType")]
    pub leave_type: LeaveKind,
    #[graphql(name = "startDate")]
    pub start_date: NaiveDate,
    #[graphql(name = "endDate")]
    pub end_date: NaiveDate,
    #[graphql(name = "totalDays")]
    pub total_days: Option<i32>,
    pub remarks: Option<String>,
}

#[derive(Clone, Debug, InputObject)]
pub struct CreatePayrollInput {
    #[graphql(name = "userId")]
    pub user_id: ID,
    #[graphql(name = "baseSalaryCents")]
    pub base_salary_cents: i64,
    #[graphql(name = "allowancesCents", default)]
    pub allowances_cents: i64,
    #[graphql(name = "deductionsCents", default)]
    pub deductions_cents: i64,
    #[graphql(name = "netSalaryCents")]
    pub net_salary_cents: Option<i64>,
    pub currency: Option<String>,
    #[graphql(name = "payPeriodStart")]
    pub pay_period_start: Option<NaiveDate>,
    #[graphql(name = "payPeriodEnd")]
    pub pay_period_end: Option<NaiveDate>,
    pub notes: Option<String>,
    #[graphql(name = "effectiveFrom")]
    pub effective_from: NaiveDate,
}

#[derive(Clone, Debug, InputObject)]
pub struct OnboardEmployeeInput {
    #[graphql(name = "employeeCode")]
    pub employee_code: String,
    pub email: String,
    pub password: String,
    pub role: RoleKind,
    #[graphql(name = "firstName")]
    pub first_name: String,
    #[graphql(name = "lastName")]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[graphql(name = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[graphql(name = "hireDate")]
    pub hire_date: Option<NaiveDate>,
    #[graphql(name = "employmentType")]
    pub employment_type: Option<EmploymentKind>,
}

impl OnboardEmployeeInput {
    pub fn profile_details(&self) -> ProfileDetails {
        ProfileDetails {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            date_of_birth: self.date_of_birth,
            department: self.department.clone(),
            position: self.position.clone(),
            hire_date: self.hire_date,
            employment_type: self.employment_type.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct UpdateProfileInput {
    pub phone: Option<String>,
    pub address: Option<String>,
    #[graphql(name = "profilePicture")]
    pub profile_picture: Option<String>,
    #[graphql(name = "firstName")]
    pub first_name: Option<String>,
    #[graphql(name = "lastName")]
    pub last_name: Option<String>,
    #[graphql(name = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[graphql(name = "hireDate")]
    pub hire_date: Option<NaiveDate>,
    #[graphql(name = "employmentType")]
    pub employment_type: Option<EmploymentKind>,
    pub documents: Option<String>,
}

impl From<UpdateProfileInput> for ProfileUpdate {
    fn from(input: UpdateProfileInput) -> Self {
        Self {
            phone: input.phone,
            address: input.address,
            profile_picture: input.profile_picture,
            first_name: input.first_name,
            last_name: input.last_name,
            date_of_birth: input.date_of_birth,
            department: input.department,
            position: input.position,
            hire_date: input.hire_date,
            employment_type: input.employment_type.map(Into::into),
            documents: input.documents,
        }
    }
}
