//! Effective-dated salary snapshots. Amounts are integer minor units.

use chrono::{NaiveDate, Utc};
use entity::payroll;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::context::AuthContext;
use crate::error::{HrError, HrResult};
use crate::identity::{self, validate_length};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SalaryFigures {
    pub base_cents: i64,
    pub allowances_cents: i64,
    pub deductions_cents: i64,
}

impl SalaryFigures {
    pub fn new(base_cents: i64, allowances_cents: i64, deductions_cents: i64) -> Self {
        Self {
            base_cents,
            allowances_cents,
            deductions_cents,
        }
    }

    /// base + allowances − deductions; negative components or a negative
    /// result are rejected.
    pub fn net(&self) -> HrResult<i64> {
        if self.base_cents < 0 || self.allowances_cents < 0 || self.deductions_cents < 0 {
            return Err(HrError::validation("salary components must not be negative"));
        }
        let net = self
            .base_cents
            .checked_add(self.allowances_cents)
            .and_then(|gross| gross.checked_sub(self.deductions_cents))
            .ok_or_else(|| HrError::validation("salary figures overflow"))?;
        if net < 0 {
            return Err(HrError::validation("deductions exceed gross salary"));
        }
        Ok(net)
    }

    pub fn of(model: &payroll::Model) -> Self {
        Self::new(
            model.base_salary_cents,
            model.allowances_cents,
            model.deductions_cents,
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewPayroll {
    pub user_id: Uuid,
    pub figures: SalaryFigures,
    /// Checked against the computed net when present.
    pub net_salary_cents: Option<i64>,
    pub currency: Option<String>,
    pub pay_period_start: Option<NaiveDate>,
    pub pay_period_end: Option<NaiveDate>,
    pub notes: Option<String>,
    pub effective_from: NaiveDate,
}

#[derive(Clone, Debug)]
pub struct PayrollChange {
    pub created: payroll::Model,
    /// The record that was active before, now closed.
    pub closed: Option<payroll::Model>,
}

pub fn normalize_currency(value: Option<&str>) -> HrResult<String> {
    let code = value
        .map(|v| v.trim().to_ascii_uppercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(HrError::validation(format!("invalid currency code {code}")));
    }
    Ok(code)
}

async fn find_active<C>(conn: &C, user_id: Uuid) -> HrResult<Option<payroll::Model>>
where
    C: ConnectionTrait,
{
    Ok(payroll::Entity::find()
        .filter(payroll::Column::UserId.eq(user_id))
        .filter(payroll::Column::EffectiveTo.is_null())
        .one(conn)
        .await?)
}

/// Insert a new active snapshot, closing the previous one the day before.
/// Admin only; runs in a single transaction.
#[instrument(
    skip_all,
    fields(actor = %ctx.user_id, user_id = %input.user_id, effective_from = %input.effective_from)
)]
pub async fn create_payroll(
    db: &DatabaseConnection,
    ctx: &AuthContext,
    input: NewPayroll,
) -> HrResult<PayrollChange> {
    ctx.require_admin()?;
    let net = input.figures.net()?;
    if let Some(claimed) = input.net_salary_cents {
        if claimed != net {
            return Err(HrError::validation(format!(
                "net salary {claimed} does not equal base + allowances - deductions ({net})"
            )));
        }
    }
    let currency = normalize_currency(input.currency.as_deref())?;
    if let (Some(start), Some(end)) = (input.pay_period_start, input.pay_period_end) {
        if end < start {
            return Err(HrError::validation("pay period end precedes its start"));
        }
    }
    let notes = input
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(text) = &notes {
        validate_length("notes", text, 2_000)?;
    }

    let txn = db.begin().await?;
    identity::find_identity(&txn, input.user_id).await?;
    let now: DateTimeWithTimeZone = Utc::now().into();

    let closed = match find_active(&txn, input.user_id).await? {
        Some(active) => {
            if input.effective_from <= active.effective_from {
                return Err(HrError::validation(format!(
                    "effective date must be after the active record's {}",
                    active.effective_from
                )));
            }
            let closing_day = input
                .effective_from
                .pred_opt()
                .ok_or_else(|| HrError::validation("effective date out of range"))?;
            let mut record: payroll::ActiveModel = active.into();
            record.effective_to = Set(Some(closing_day));
            record.updated_at = Set(now);
            Some(record.update(&txn).await?)
        }
        None => None,
    };

    let created = payroll::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(input.user_id),
        base_salary_cents: Set(input.figures.base_cents),
        allowances_cents: Set(input.figures.allowances_cents),
        deductions_cents: Set(input.figures.deductions_cents),
        net_salary_cents: Set(net),
        currency: Set(currency),
        pay_period_start: Set(input.pay_period_start),
        pay_period_end: Set(input.pay_period_end),
        notes: Set(notes),
        effective_from: Set(input.effective_from),
        effective_to: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|err| HrError::on_write(err, "identity already has an active payroll record"))?;
    txn.commit().await?;

    if let Some(prev) = &closed {
        info!(closed_id = %prev.id, effective_to = ?prev.effective_to, "previous payroll closed");
    }
    info!(payroll_id = %created.id, net, "payroll record created");
    Ok(PayrollChange { created, closed })
}

pub async fn active_payroll<C>(
    conn: &C,
    ctx: &AuthContext,
    user_id: Uuid,
) -> HrResult<Option<payroll::Model>>
where
    C: ConnectionTrait,
{
    ctx.require_self_or_admin(user_id)?;
    find_active(conn, user_id).await
}

/// Newest effective date first.
pub async fn payroll_history<C>(
    conn: &C,
    ctx: &AuthContext,
    user_id: Uuid,
) -> HrResult<Vec<payroll::Model>>
where
    C: ConnectionTrait,
{
    ctx.require_self_or_admin(user_id)?;
    Ok(payroll::Entity::find()
        .filter(payroll::Column::UserId.eq(user_id))
        .order_by_desc(payroll::Column::EffectiveFrom)
        .all(conn)
        .await?)
}
