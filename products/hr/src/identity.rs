//! Login identities: credential hashing, creation and verification.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use entity::users::{self, Role};
use rand_core::OsRng;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::context::AuthContext;
use crate::error::{HrError, HrResult};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug, Deserialize)]
pub struct NewIdentity {
    pub employee_code: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub fn hash_password(password: &str) -> HrResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| HrError::Password(err.to_string()))
}

/// `false` for a wrong password or an unparseable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn normalize_email(value: &str) -> HrResult<String> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(HrError::validation("invalid email address"));
    }
    validate_length("email", &trimmed, 120)?;
    Ok(trimmed)
}

pub fn normalize_employee_code(value: &str) -> HrResult<String> {
    let trimmed = value.trim().to_uppercase();
    if trimmed.is_empty() {
        return Err(HrError::validation("employee code is required"));
    }
    validate_length("employee code", &trimmed, 50)?;
    Ok(trimmed)
}

fn validate_password(password: &str) -> HrResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(HrError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn validate_length(field: &str, value: &str, max: usize) -> HrResult<()> {
    if value.chars().count() > max {
        return Err(HrError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Create a login identity. Admin only.
#[instrument(skip_all, fields(actor = %ctx.user_id))]
pub async fn create_identity<C>(
    conn: &C,
    ctx: &AuthContext,
    input: NewIdentity,
) -> HrResult<users::Model>
where
    C: ConnectionTrait,
{
    ctx.require_admin()?;
    insert_identity(conn, input).await
}

pub(crate) async fn insert_identity<C>(conn: &C, input: NewIdentity) -> HrResult<users::Model>
where
    C: ConnectionTrait,
{
    let email = normalize_email(&input.email)?;
    let employee_code = normalize_employee_code(&input.employee_code)?;
    validate_password(&input.password)?;

    let taken = users::Entity::find()
        .filter(
            Condition::any()
                .add(users::Column::Email.eq(email.clone()))
                .add(users::Column::EmployeeCode.eq(employee_code.clone())),
        )
        .one(conn)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.email == email {
            "email"
        } else {
            "employee code"
        };
        return Err(HrError::Conflict(format!("{field} already registered")));
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let model = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        employee_code: Set(employee_code),
        email: Set(email),
        password_hash: Set(hash_password(&input.password)?),
        role: Set(input.role),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(|err| HrError::on_write(err, "email or employee code already registered"))?;
    info!(
        user_id = %model.id,
        code = %model.employee_code,
        role = model.role.as_str(),
        "identity created"
    );
    Ok(model)
}

/// Verify credentials. Unknown email and wrong password both yield `None`.
#[instrument(skip(conn, password))]
pub async fn authenticate<C>(
    conn: &C,
    email: &str,
    password: &str,
) -> HrResult<Option<users::Model>>
where
    C: ConnectionTrait,
{
    let Ok(email) = normalize_email(email) else {
        return Ok(None);
    };
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await?;
    Ok(user.filter(|u| verify_password(password, &u.password_hash)))
}

pub async fn find_identity<C>(conn: &C, user_id: Uuid) -> HrResult<users::Model>
where
    C: ConnectionTrait,
{
    users::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(HrError::NotFound("identity"))
}

/// Self-service password change; the current password must match.
#[instrument(skip_all, fields(actor = %ctx.user_id))]
pub async fn change_password<C>(
    conn: &C,
    ctx: &AuthContext,
    current: &str,
    new_password: &str,
) -> HrResult<()>
where
    C: ConnectionTrait,
{
    let user = find_identity(conn, ctx.user_id).await?;
    if !verify_password(current, &user.password_hash) {
        return Err(HrError::validation("current password is incorrect"));
    }
    validate_password(new_password)?;
    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.update(conn).await?;
    info!("password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_the_original_password() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("admin123", "not-a-phc-string"));
    }

    #[test]
    fn emails_are_normalised() {
        assert_eq!(
            normalize_email("  Alice@Dayflow.COM ").unwrap(),
            "alice@dayflow.com"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("   ").is_err());
    }

    #[test]
    fn employee_codes_are_upper_cased() {
        assert_eq!(normalize_employee_code(" emp002").unwrap(), "EMP002");
        assert!(normalize_employee_code("").is_err());
        assert!(normalize_employee_code(&"x".repeat(51)).is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
