//! Leave requests: submission and the pending → approved | rejected review.

use chrono::NaiveDate;
use entity::leave_requests::{self, LeaveType, Status};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::AuthContext;
use crate::error::{HrError, HrResult};
use crate::identity::validate_length;

#[derive(Clone, Debug, Deserialize)]
pub struct NewLeaveRequest {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// When given, must equal the inclusive span of the dates.
    pub total_days: Option<i32>,
    pub remarks: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target(self) -> Status {
        match self {
            Decision::Approve => Status::Approved,
            Decision::Reject => Status::Rejected,
        }
    }
}

/// Inclusive number of calendar days between two dates.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> HrResult<i32> {
    if end < start {
        return Err(HrError::validation("end date precedes start date"));
    }
    let days = end.signed_duration_since(start).num_days() + 1;
    i32::try_from(days).map_err(|_| HrError::validation("leave span is too long"))
}

#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn submit_leave<C>(
    conn: &C,
    ctx: &AuthContext,
    input: NewLeaveRequest,
    now: DateTimeWithTimeZone,
) -> HrResult<leave_requests::Model>
where
    C: ConnectionTrait,
{
    let total_days = span_days(input.start_date, input.end_date)?;
    if let Some(claimed) = input.total_days {
        if claimed != total_days {
            return Err(HrError::validation(format!(
                "total days {claimed} does not match the {total_days}-day span"
            )));
        }
    }
    let remarks = input
        .remarks
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if let Some(text) = &remarks {
        validate_length("remarks", text, 2_000)?;
    }

    let overlaps =
        overlapping_requests(conn, ctx.user_id, input.start_date, input.end_date, None).await?;
    if !overlaps.is_empty() {
        warn!(
            count = overlaps.len(),
            start = %input.start_date,
            end = %input.end_date,
            "leave request overlaps existing requests"
        );
    }

    let model = leave_requests::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(ctx.user_id),
        leave_type: Set(input.leave_type),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        total_days: Set(total_days),
        remarks: Set(remarks),
        status: Set(Status::Pending),
        admin_comments: Set(None),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    info!(leave_id = %model.id, total_days, "leave requested");
    Ok(model)
}

/// Move a pending request to its terminal state. The write is conditional on
/// the row still being pending, so only one reviewer can win.
#[instrument(skip_all, fields(actor = %ctx.user_id, %leave_id, ?decision))]
pub async fn review_leave<C>(
    conn: &C,
    ctx: &AuthContext,
    leave_id: Uuid,
    decision: Decision,
    comments: Option<String>,
    now: DateTimeWithTimeZone,
) -> HrResult<leave_requests::Model>
where
    C: ConnectionTrait,
{
    ctx.require_admin()?;
    let target = decision.target();
    let existing = find_request(conn, leave_id).await?;
    if existing.status != Status::Pending {
        return Err(HrError::transition(existing.status, target));
    }
    let comments = comments
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let result = leave_requests::Entity::update_many()
        .col_expr(leave_requests::Column::Status, Expr::value(target.to_value()))
        .col_expr(leave_requests::Column::ReviewedBy, Expr::value(ctx.user_id))
        .col_expr(leave_requests::Column::ReviewedAt, Expr::value(now))
        .col_expr(leave_requests::Column::AdminComments, Expr::value(comments))
        .col_expr(leave_requests::Column::UpdatedAt, Expr::value(now))
        .filter(leave_requests::Column::Id.eq(leave_id))
        .filter(leave_requests::Column::Status.eq(Status::Pending))
        .exec(conn)
        .await?;

    let current = find_request(conn, leave_id).await?;
    if result.rows_affected == 0 {
        return Err(HrError::transition(current.status, target));
    }
    info!(status = current.status.as_str(), "leave reviewed");
    Ok(current)
}

async fn find_request<C>(conn: &C, leave_id: Uuid) -> HrResult<leave_requests::Model>
where
    C: ConnectionTrait,
{
    leave_requests::Entity::find_by_id(leave_id)
        .one(conn)
        .await?
        .ok_or(HrError::NotFound("leave request"))
}

pub async fn get_leave_request<C>(
    conn: &C,
    ctx: &AuthContext,
    leave_id: Uuid,
) -> HrResult<leave_requests::Model>
where
    C: ConnectionTrait,
{
    let request = find_request(conn, leave_id).await?;
    ctx.require_self_or_admin(request.user_id)?;
    Ok(request)
}

/// Newest first.
pub async fn leave_requests_for<C>(
    conn: &C,
    ctx: &AuthContext,
    user_id: Uuid,
) -> HrResult<Vec<leave_requests::Model>>
where
    C: ConnectionTrait,
{
    ctx.require_self_or_admin(user_id)?;
    Ok(leave_requests::Entity::find()
        .filter(leave_requests::Column::UserId.eq(user_id))
        .order_by_desc(leave_requests::Column::CreatedAt)
        .order_by_desc(leave_requests::Column::StartDate)
        .all(conn)
        .await?)
}

/// Admin review queue, oldest first.
pub async fn pending_leave_requests<C>(
    conn: &C,
    ctx: &AuthContext,
) -> HrResult<Vec<leave_requests::Model>>
where
    C: ConnectionTrait,
{
    ctx.require_admin()?;
    Ok(leave_requests::Entity::find()
        .filter(leave_requests::Column::Status.eq(Status::Pending))
        .order_by_asc(leave_requests::Column::CreatedAt)
        .all(conn)
        .await?)
}

/// Pending or approved requests of `user_id` intersecting `[start, end]`.
pub async fn overlapping_requests<C>(
    conn: &C,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    exclude: Option<Uuid>,
) -> HrResult<Vec<leave_requests::Model>>
where
    C: ConnectionTrait,
{
    let mut query = leave_requests::Entity::find()
        .filter(leave_requests::Column::UserId.eq(user_id))
        .filter(leave_requests::Column::Status.is_in([Status::Pending, Status::Approved]))
        .filter(leave_requests::Column::StartDate.lte(end))
        .filter(leave_requests::Column::EndDate.gte(start));
    if let Some(id) = exclude {
        query = query.filter(leave_requests::Column::Id.ne(id));
    }
    Ok(query
        .order_by_asc(leave_requests::Column::StartDate)
        .all(conn)
        .await?)
}
