mod me;
mod types;

use async_graphql::{
    Context, EmptySubscription, Error, ErrorExtensions, ID, Object, Schema, SimpleObject,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use platform_api::ApiError;
use platform_db::DbPool;
use products_hr::{
    AuthContext, HrError, HrResult,
    attendance::{self, ManualAttendance},
    identity,
    leave::{self, NewLeaveRequest},
    payroll::{self, NewPayroll, SalaryFigures},
    profile::{self, EmployeeRecord, NewEmployee},
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use me::MePayload;
use types::{
    AttendanceNode, CreatePayrollInput, DailySummaryNode, EmployeeNode, LeaveDecision,
    LeaveRequestNode, OnboardEmployeeInput, PayrollChangePayload, PayrollNode, ProfileNode,
    RecordAttendanceInput, SubmitLeaveInput, UpdateProfileInput,
};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Wall clock used for check-in/out stamps and "today".
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    offset: FixedOffset,
}

impl Clock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

pub fn build_schema(pool: DbPool, clock: Clock) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(pool)
        .data(clock)
        .finish()
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> HealthPayload {
        HealthPayload { ok: true }
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    #[instrument(name = "graphql.me", skip_all)]
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<MePayload> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let identity = identity::find_identity(db, viewer.user_id).await.gql()?;
        let profile = match profile::get_profile(db, &viewer, viewer.user_id).await {
            Ok(profile) => Some(profile),
            Err(HrError::NotFound(_)) => None,
            Err(err) => return Err(ApiError::from(err).extend()),
        };
        Ok(MePayload::from_record(EmployeeRecord { identity, profile }))
    }

    #[graphql(name = "myProfile")]
    #[instrument(name = "graphql.my_profile", skip_all)]
    async fn my_profile(&self, ctx: &Context<'_>) -> async_graphql::Result<ProfileNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let profile = profile::get_profile(db, &viewer, viewer.user_id).await.gql()?;
        Ok(profile.into())
    }

    #[instrument(name = "graphql.employees", skip_all)]
    async fn employees(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<EmployeeNode>> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let records = profile::list_employees(db, &viewer).await.gql()?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "graphql.attendance", skip_all)]
    async fn attendance(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "userId")] user_id: Option<ID>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> async_graphql::Result<Vec<AttendanceNode>> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let target = target_user(&viewer, user_id.as_ref())?;
        let rows = attendance::attendance_range(db, &viewer, target, from, to)
            .await
            .gql()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[graphql(name = "dailySummary")]
    #[instrument(name = "graphql.daily_summary", skip_all)]
    async fn daily_summary(
        &self,
        ctx: &Context<'_>,
        date: Option<NaiveDate>,
    ) -> async_graphql::Result<DailySummaryNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let date = date.unwrap_or_else(|| clock(ctx).today());
        let summary = attendance::daily_summary(db, &viewer, date).await.gql()?;
        Ok(summary.into())
    }

    #[graphql(name = "leaveRequests")]
    #[instrument(name = "graphql.leave_requests", skip_all)]
    async fn leave_requests(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "userId")] user_id: Option<ID>,
    ) -> async_graphql::Result<Vec<LeaveRequestNode>> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let target = target_user(&viewer, user_id.as_ref())?;
        let rows = leave::leave_requests_for(db, &viewer, target).await.gql()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[graphql(name = "pendingLeaveRequests")]
    #[instrument(name = "graphql.pending_leave_requests", skip_all)]
    async fn pending_leave_requests(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<LeaveRequestNode>> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let rows = leave::pending_leave_requests(db, &viewer).await.gql()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[graphql(name = "activePayroll")]
    #[instrument(name = "graphql.active_payroll", skip_all)]
    async fn active_payroll(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "userId")] user_id: Option<ID>,
    ) -> async_graphql::Result<Option<PayrollNode>> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let target = target_user(&viewer, user_id.as_ref())?;
        let row = payroll::active_payroll(db, &viewer, target).await.gql()?;
        Ok(row.map(Into::into))
    }

    #[graphql(name = "payrollHistory")]
    #[instrument(name = "graphql.payroll_history", skip_all)]
    async fn payroll_history(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "userId")] user_id: Option<ID>,
    ) -> async_graphql::Result<Vec<PayrollNode>> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let target = target_user(&viewer, user_id.as_ref())?;
        let rows = payroll::payroll_history(db, &viewer, target).await.gql()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[graphql(name = "checkIn")]
    #[instrument(name = "graphql.check_in", skip_all)]
    async fn check_in(&self, ctx: &Context<'_>) -> async_graphql::Result<AttendanceNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let row = attendance::check_in(db, &viewer, clock(ctx).now()).await.gql()?;
        Ok(row.into())
    }

    #[graphql(name = "checkOut")]
    #[instrument(name = "graphql.check_out", skip_all)]
    async fn check_out(&self, ctx: &Context<'_>) -> async_graphql::Result<AttendanceNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let row = attendance::check_out(db, &viewer, clock(ctx).now()).await.gql()?;
        Ok(row.into())
    }

    #[graphql(name = "recordAttendance")]
    #[instrument(name = "graphql.record_attendance", skip_all)]
    async fn record_attendance(
        &self,
        ctx: &Context<'_>,
        input: RecordAttendanceInput,
    ) -> async_graphql::Result<AttendanceNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let manual = ManualAttendance {
            user_id: parse_uuid(&input.user_id)?,
            date: input.date,
            status: input.status.into(),
            check_in: input.check_in,
            check_out: input.check_out,
            notes: input.notes,
        };
        let row = attendance::record_attendance(db, &viewer, manual).await.gql()?;
        Ok(row.into())
    }

    #[graphql(name = "submitLeave")]
    #[instrument(name = "graphql.submit_leave", skip_all)]
    async fn submit_leave(
        &self,
        ctx: &Context<'_>,
        input: SubmitLeaveInput,
    ) -> async_graphql::Result<LeaveRequestNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let request = NewLeaveRequest {
            leave_type: input.leave_type.into(),
            start_date: input.start_date,
            end_date: input.end_date,
            total_days: input.total_days,
            remarks: input.remarks,
        };
        let row = leave::submit_leave(db, &viewer, request, clock(ctx).now())
            .await
            .gql()?;
        Ok(row.into())
    }

    #[graphql(name = "reviewLeave")]
    #[instrument(name = "graphql.review_leave", skip_all)]
    async fn review_leave(
        &self,
        ctx: &Context<'_>,
        id: ID,
        decision: LeaveDecision,
        comments: Option<String>,
    ) -> async_graphql::Result<LeaveRequestNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let leave_id = parse_uuid(&id)?;
        let row = leave::review_leave(
            db,
            &viewer,
            leave_id,
            decision.into(),
            comments,
            clock(ctx).now(),
        )
        .await
        .gql()?;
        Ok(row.into())
    }

    #[graphql(name = "createPayroll")]
    #[instrument(name = "graphql.create_payroll", skip_all)]
    async fn create_payroll(
        &self,
        ctx: &Context<'_>,
        input: CreatePayrollInput,
    ) -> async_graphql::Result<PayrollChangePayload> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let request = NewPayroll {
            user_id: parse_uuid(&input.user_id)?,
            figures: SalaryFigures::new(
                input.base_salary_cents,
                input.allowances_cents,
                input.deductions_cents,
            ),
            net_salary_cents: input.net_salary_cents,
            currency: input.currency,
            pay_period_start: input.pay_period_start,
            pay_period_end: input.pay_period_end,
            notes: input.notes,
            effective_from: input.effective_from,
        };
        let change = payroll::create_payroll(db, &viewer, request).await.gql()?;
        Ok(change.into())
    }

    #[graphql(name = "onboardEmployee")]
    #[instrument(name = "graphql.onboard_employee", skip_all)]
    async fn onboard_employee(
        &self,
        ctx: &Context<'_>,
        input: OnboardEmployeeInput,
    ) -> async_graphql::Result<EmployeeNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let profile = input.profile_details();
        let employee = NewEmployee {
            employee_code: input.employee_code,
            email: input.email,
            password: input.password,
            role: input.role.into(),
            profile,
        };
        let record = profile::onboard_employee(db, &viewer, employee).await.gql()?;
        Ok(record.into())
    }

    #[graphql(name = "updateProfile")]
    #[instrument(name = "graphql.update_profile", skip_all)]
    async fn update_profile(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "userId")] user_id: Option<ID>,
        input: UpdateProfileInput,
    ) -> async_graphql::Result<ProfileNode> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        let target = target_user(&viewer, user_id.as_ref())?;
        let row = profile::update_profile(db, &viewer, target, input.into())
            .await
            .gql()?;
        Ok(row.into())
    }

    #[graphql(name = "changePassword")]
    #[instrument(name = "graphql.change_password", skip_all)]
    async fn change_password(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "currentPassword")] current_password: String,
        #[graphql(name = "newPassword")] new_password: String,
    ) -> async_graphql::Result<bool> {
        let viewer = viewer(ctx)?;
        let db = database(ctx)?;
        identity::change_password(db, &viewer, &current_password, &new_password)
            .await
            .gql()?;
        Ok(true)
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}

trait GqlResultExt<T> {
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T> GqlResultExt<T> for HrResult<T> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|err| ApiError::from(err).extend())
    }
}

fn database<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a DbPool> {
    ctx.data::<DbPool>()
        .map_err(|_| error_with_code("INTERNAL", "Missing database connection"))
}

fn clock(ctx: &Context<'_>) -> Clock {
    ctx.data_opt::<Clock>().copied().unwrap_or_default()
}

fn viewer(ctx: &Context<'_>) -> async_graphql::Result<AuthContext> {
    ctx.data::<AuthContext>()
        .copied()
        .map_err(|_| ApiError::Unauthorized.extend())
}

/// Resolves an optional `userId` argument, defaulting to the caller.
fn target_user(viewer: &AuthContext, user_id: Option<&ID>) -> async_graphql::Result<Uuid> {
    match user_id {
        Some(id) => parse_uuid(id),
        None => Ok(viewer.user_id),
    }
}

fn parse_uuid(id: &ID) -> async_graphql::Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| ApiError::invalid("malformed id").extend())
}

fn error_with_code(code: &'static str, message: impl Into<String>) -> Error {
    Error::new(message).extend_with(|_, e| e.set("code", code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Request;
    use migration::{Migrator, MigratorTrait};
    use platform_db::{DatabaseSettings, connect};
    use serde_json::json;

    async fn schema_with_admin() -> (SchemaType, AuthContext) {
        let settings = DatabaseSettings::with_url("sqlite::memory:");
        let pool = connect(&settings).await.expect("connect sqlite");
        Migrator::up(&pool, None).await.expect("migrate");
        let seeded = products_hr::seed::seed_demo(&pool, Utc::now().date_naive())
            .await
            .expect("seed");
        let admin = seeded.user_code("EMP001").expect("admin seeded");
        let ctx = AuthContext::new(admin.id, admin.role);
        (build_schema(pool, Clock::default()), ctx)
    }

    #[tokio::test]
    async fn health_query_returns_ok() {
        let settings = DatabaseSettings::with_url("sqlite::memory:");
        let pool = connect(&settings).await.expect("connect sqlite");
        let schema = build_schema(pool, Clock::default());
        let response = schema.execute(Request::new("{ health { ok } }")).await;
        assert!(response.errors.is_empty());
        let body = response.data.into_json().unwrap();
        assert_eq!(body, json!({"health": {"ok": true}}));
    }

    #[tokio::test]
    async fn anonymous_requests_are_rejected() {
        let (schema, _) = schema_with_admin().await;
        let response = schema.execute(Request::new("{ me { email } }")).await;
        assert_eq!(response.errors.len(), 1);
        let extensions = serde_json::to_value(&response.errors[0].extensions).unwrap();
        assert_eq!(extensions["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn admin_sees_directory_and_pending_leave() {
        let (schema, ctx) = schema_with_admin().await;
        let request = Request::new(
            "{ me { email isAdmin } employees { identity { employeeCode } } pendingLeaveRequests { status } }",
        )
        .data(ctx);
        let response = schema.execute(request).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let body = response.data.into_json().unwrap();
        assert_eq!(body["me"], json!({"email": "admin@dayflow.com", "isAdmin": true}));
        assert_eq!(body["employees"].as_array().map(Vec::len), Some(4));
        assert_eq!(body["pendingLeaveRequests"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn employees_cannot_list_directory() {
        let (schema, _) = schema_with_admin().await;
        let employee = AuthContext::employee(Uuid::new_v4());
        let response = schema
            .execute(Request::new("{ employees { identity { email } } }").data(employee))
            .await;
        let extensions = serde_json::to_value(&response.errors[0].extensions).unwrap();
        assert_eq!(extensions["code"], "FORBIDDEN");
    }

    #[test]
    fn sdl_exposes_hr_operations() {
        let schema = Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish();
        let sdl = schema.sdl();
        for field in ["checkIn", "reviewLeave", "createPayroll", "dailySummary", "payrollHistory"] {
            assert!(sdl.contains(field), "missing {field}");
        }
    }
}
