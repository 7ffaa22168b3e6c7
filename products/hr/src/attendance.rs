//! Daily attendance ledger. One row per identity per calendar day.

use chrono::{NaiveDate, Utc};
use entity::attendance::{self, Status};
use entity::users;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::context::AuthContext;
use crate::error::{HrError, HrResult};
use crate::identity;

/// Days with fewer worked hours than this are half-days.
pub const HALF_DAY_BELOW_HOURS: f64 = 4.0;

#[derive(Clone, Debug, Deserialize)]
pub struct ManualAttendance {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub status: Status,
    pub check_in: Option<DateTimeWithTimeZone>,
    pub check_out: Option<DateTimeWithTimeZone>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: Option<NaiveDate>,
    pub present: u64,
    pub absent: u64,
    pub half_day: u64,
    pub on_leave: u64,
    pub not_recorded: u64,
}

/// Elapsed hours between check-in and check-out, rounded to two decimals.
pub fn worked_hours(
    check_in: DateTimeWithTimeZone,
    check_out: DateTimeWithTimeZone,
) -> HrResult<f64> {
    let elapsed = check_out.signed_duration_since(check_in);
    if elapsed.num_seconds() < 0 {
        return Err(HrError::validation("check-out precedes check-in"));
    }
    let hours = elapsed.num_seconds() as f64 / 3600.0;
    Ok((hours * 100.0).round() / 100.0)
}

pub fn classify_hours(hours: f64) -> Status {
    if hours >= HALF_DAY_BELOW_HOURS {
        Status::Present
    } else {
        Status::HalfDay
    }
}

async fn find_day<C>(
    conn: &C,
    user_id: Uuid,
    date: NaiveDate,
) -> HrResult<Option<attendance::Model>>
where
    C: ConnectionTrait,
{
    Ok(attendance::Entity::find()
        .filter(attendance::Column::UserId.eq(user_id))
        .filter(attendance::Column::Date.eq(date))
        .one(conn)
        .await?)
}

fn duplicate_day(date: NaiveDate) -> String {
    format!("attendance already recorded for {date}")
}

/// Record the caller's check-in for the calendar day of `now`.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn check_in<C>(
    conn: &C,
    ctx: &AuthContext,
    now: DateTimeWithTimeZone,
) -> HrResult<attendance::Model>
where
    C: ConnectionTrait,
{
    let date = now.date_naive();
    let model = match find_day(conn, ctx.user_id, date).await? {
        Some(row) if row.check_out.is_some() => return Err(HrError::AlreadyCheckedOut),
        Some(row) if row.check_in.is_some() => return Err(HrError::AlreadyCheckedIn),
        Some(row) => {
            let mut active: attendance::ActiveModel = row.into();
            active.check_in = Set(Some(now));
            active.status = Set(Status::Present);
            active.update(conn).await?
        }
        None => attendance::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(ctx.user_id),
            date: Set(date),
            check_in: Set(Some(now)),
            check_out: Set(None),
            status: Set(Status::Present),
            total_hours: Set(0.0),
            notes: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(|err| HrError::on_write(err, &duplicate_day(date)))?,
    };
    info!(%date, "checked in");
    Ok(model)
}

/// Close the caller's day: stamp check-out, compute hours and status.
#[instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn check_out<C>(
    conn: &C,
    ctx: &AuthContext,
    now: DateTimeWithTimeZone,
) -> HrResult<attendance::Model>
where
    C: ConnectionTrait,
{
    let date = now.date_naive();
    let row = find_day(conn, ctx.user_id, date)
        .await?
        .ok_or(HrError::NotCheckedIn)?;
    if row.check_out.is_some() {
        return Err(HrError::AlreadyCheckedOut);
    }
    let checked_in = row.check_in.ok_or(HrError::NotCheckedIn)?;
    let hours = worked_hours(checked_in, now)?;
    let status = classify_hours(hours);

    let mut active: attendance::ActiveModel = row.into();
    active.check_out = Set(Some(now));
    active.total_hours = Set(hours);
    active.status = Set(status);
    let updated = active.update(conn).await?;
    info!(%date, hours, status = ?status, "checked out");
    Ok(updated)
}

/// Admin entry for a whole day; a second entry for the same day conflicts.
#[instrument(skip_all, fields(actor = %ctx.user_id, user_id = %input.user_id, date = %input.date))]
pub async fn record_attendance<C>(
    conn: &C,
    ctx: &AuthContext,
    input: ManualAttendance,
) -> HrResult<attendance::Model>
where
    C: ConnectionTrait,
{
    ctx.require_admin()?;
    identity::find_identity(conn, input.user_id).await?;
    for stamp in [input.check_in, input.check_out].into_iter().flatten() {
        if stamp.date_naive() != input.date {
            return Err(HrError::validation(format!(
                "timestamp {stamp} does not fall on {}",
                input.date
            )));
        }
    }
    let total_hours = match (input.check_in, input.check_out) {
        (Some(start), Some(end)) => worked_hours(start, end)?,
        (None, Some(_)) => return Err(HrError::validation("check-out without check-in")),
        _ => 0.0,
    };
    if find_day(conn, input.user_id, input.date).await?.is_some() {
        return Err(HrError::Conflict(duplicate_day(input.date)));
    }
    let model = attendance::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(input.user_id),
        date: Set(input.date),
        check_in: Set(input.check_in),
        check_out: Set(input.check_out),
        status: Set(input.status),
        total_hours: Set(total_hours),
        notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(|err| HrError::on_write(err, &duplicate_day(input.date)))?;
    info!(status = ?model.status, "attendance recorded");
    Ok(model)
}

/// Rows for one identity between `from` and `to`, both inclusive.
pub async fn attendance_range<C>(
    conn: &C,
    ctx: &AuthContext,
    user_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> HrResult<Vec<attendance::Model>>
where
    C: ConnectionTrait,
{
    ctx.require_self_or_admin(user_id)?;
    if to < from {
        return Err(HrError::validation("range end precedes range start"));
    }
    Ok(attendance::Entity::find()
        .filter(attendance::Column::UserId.eq(user_id))
        .filter(attendance::Column::Date.between(from, to))
        .order_by_asc(attendance::Column::Date)
        .all(conn)
        .await?)
}

/// Dashboard counts for one day. Admin only.
pub async fn daily_summary<C>(
    conn: &C,
    ctx: &AuthContext,
    date: NaiveDate,
) -> HrResult<DailySummary>
where
    C: ConnectionTrait,
{
    ctx.require_admin()?;
    let headcount = users::Entity::find().count(conn).await?;
    let rows = attendance::Entity::find()
        .filter(attendance::Column::Date.eq(date))
        .all(conn)
        .await?;
    let mut summary = DailySummary {
        date: Some(date),
        ..DailySummary::default()
    };
    for row in &rows {
        match row.status {
            Status::Present => summary.present += 1,
            Status::Absent => summary.absent += 1,
            Status::HalfDay => summary.half_day += 1,
            Status::Leave => summary.on_leave += 1,
        }
    }
    summary.not_recorded = headcount.saturating_sub(rows.len() as u64);
    Ok(summary)
}
