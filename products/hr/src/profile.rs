//! Employee profiles: onboarding, self-service edits and the admin directory.

use chrono::{NaiveDate, Utc};
use entity::employee_profiles::{self, EmploymentType};
use entity::users::{self, Role};
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
use crate::identity::{self, NewIdentity, validate_length};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub employment_type: Option<EmploymentType>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewEmployee {
    pub employee_code: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub profile: ProfileDetails,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub employment_type: Option<EmploymentType>,
    pub documents: Option<String>,
}

impl ProfileUpdate {
    /// Fields an employee may not change on their own profile.
    fn touches_admin_fields(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.date_of_birth.is_some()
            || self.department.is_some()
            || self.position.is_some()
            || self.hire_date.is_some()
            || self.employment_type.is_some()
            || self.documents.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct EmployeeRecord {
    pub identity: users::Model,
    pub profile: Option<employee_profiles::Model>,
}

fn required_name(field: &str, value: &str) -> HrResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HrError::validation(format!("{field} is required")));
    }
    validate_length(field, trimmed, 100)?;
    Ok(trimmed.to_string())
}

fn optional_text(field: &str, value: Option<String>, max: usize) -> HrResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => {
            validate_length(field, &v, max)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

/// Create the identity and its profile in one transaction. Admin only.
#[instrument(skip_all, fields(actor = %ctx.user_id))]
pub async fn onboard_employee(
    db: &DatabaseConnection,
    ctx: &AuthContext,
    input: NewEmployee,
) -> HrResult<EmployeeRecord> {
    ctx.require_admin()?;
    let NewEmployee {
        employee_code,
        email,
        password,
        role,
        profile,
    } = input;
    let first_name = required_name("first name", &profile.first_name)?;
    let last_name = required_name("last name", &profile.last_name)?;

    let txn = db.begin().await?;
    let identity = identity::insert_identity(
        &txn,
        NewIdentity {
            employee_code,
            email,
            password,
            role,
        },
    )
    .await?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let profile = employee_profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(identity.id),
        first_name: Set(first_name),
        last_name: Set(last_name),
        phone: Set(optional_text("phone", profile.phone, 20)?),
        address: Set(optional_text("address", profile.address, 2_000)?),
        date_of_birth: Set(profile.date_of_birth),
        profile_picture: Set(None),
        department: Set(optional_text("department", profile.department, 100)?),
        position: Set(optional_text("position", profile.position, 100)?),
        hire_date: Set(profile.hire_date),
        employment_type: Set(profile.employment_type),
        documents: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|err| HrError::on_write(err, "profile already exists for identity"))?;
    txn.commit().await?;

    info!(user_id = %identity.id, code = %identity.employee_code, "employee onboarded");
    Ok(EmployeeRecord {
        identity,
        profile: Some(profile),
    })
}

pub async fn get_profile<C>(
    conn: &C,
    ctx: &AuthContext,
    user_id: Uuid,
) -> HrResult<employee_profiles::Model>
where
    C: ConnectionTrait,
{
    ctx.require_self_or_admin(user_id)?;
    employee_profiles::Entity::find()
        .filter(employee_profiles::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(HrError::NotFound("profile"))
}

/// Employees may edit contact details only; everything else needs an admin.
#[instrument(skip_all, fields(actor = %ctx.user_id, %user_id))]
pub async fn update_profile<C>(
    conn: &C,
    ctx: &AuthContext,
    user_id: Uuid,
    update: ProfileUpdate,
) -> HrResult<employee_profiles::Model>
where
    C: ConnectionTrait,
{
    ctx.require_self_or_admin(user_id)?;
    if update.touches_admin_fields() && !ctx.is_admin() {
        return Err(HrError::Forbidden);
    }
    let existing = get_profile(conn, ctx, user_id).await?;
    let mut active: employee_profiles::ActiveModel = existing.into();

    if update.phone.is_some() {
        active.phone = Set(optional_text("phone", update.phone, 20)?);
    }
    if update.address.is_some() {
        active.address = Set(optional_text("address", update.address, 2_000)?);
    }
    if update.profile_picture.is_some() {
        active.profile_picture = Set(optional_text(
            "profile picture",
            update.profile_picture,
            255,
        )?);
    }
    if let Some(first_name) = &update.first_name {
        active.first_name = Set(required_name("first name", first_name)?);
    }
    if let Some(last_name) = &update.last_name {
        active.last_name = Set(required_name("last name", last_name)?);
    }
    if let Some(date_of_birth) = update.date_of_birth {
        active.date_of_birth = Set(Some(date_of_birth));
    }
    if update.department.is_some() {
        active.department = Set(optional_text("department", update.department, 100)?);
    }
    if update.position.is_some() {
        active.position = Set(optional_text("position", update.position, 100)?);
    }
    if let Some(hire_date) = update.hire_date {
        active.hire_date = Set(Some(hire_date));
    }
    if let Some(employment_type) = update.employment_type {
        active.employment_type = Set(Some(employment_type));
    }
    if update.documents.is_some() {
        active.documents = Set(optional_text("documents", update.documents, 65_535)?);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(conn).await?;
    info!("profile updated");
    Ok(updated)
}

/// Admin directory of every identity with its profile.
pub async fn list_employees<C>(conn: &C, ctx: &AuthContext) -> HrResult<Vec<EmployeeRecord>>
where
    C: ConnectionTrait,
{
    ctx.require_admin()?;
    let rows = users::Entity::find()
        .find_also_related(employee_profiles::Entity)
        .order_by_asc(users::Column::EmployeeCode)
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(identity, profile)| EmployeeRecord { identity, profile })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_edits_are_self_service() {
        let update = ProfileUpdate {
            phone: Some("+1-234-567-002".into()),
            address: Some("Alice Street".into()),
            ..ProfileUpdate::default()
        };
        assert!(!update.touches_admin_fields());
    }

    #[test]
    fn job_edits_need_an_admin() {
        let update = ProfileUpdate {
            position: Some("Staff Engineer".into()),
            ..ProfileUpdate::default()
        };
        assert!(update.touches_admin_fields());
    }

    #[test]
    fn blank_optional_text_clears_the_field() {
        assert_eq!(optional_text("phone", Some("   ".into()), 20).unwrap(), None);
        assert!(optional_text("phone", Some("1".repeat(21)), 20).is_err());
    }
}
