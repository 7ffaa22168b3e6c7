//! Shared fixtures for the HR integration suites.
use chrono::{FixedOffset, NaiveDate, TimeZone};
use entity::users::{self, Role};
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, connect};
use products_hr::AuthContext;
use products_hr::profile::{self, NewEmployee, ProfileDetails};
use products_hr::seed::{SeededRecords, seed_demo};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, Statement};
use url::Url;
use uuid::Uuid;

pub struct HrTestContext {
    pub db: DbPool,
    pub seeded: SeededRecords,
    pub today: NaiveDate,
}

impl HrTestContext {
    /// Fresh in-memory database with migrations applied and nothing else.
    pub async fn empty() -> Self {
        let db = connect(&DatabaseSettings::with_url("sqlite::memory:"))
            .await
            .expect("connect sqlite");
        Migrator::up(&db, None).await.expect("apply migrations");
        Self {
            db,
            seeded: SeededRecords::default(),
            today: day(2024, 3, 15),
        }
    }

    /// Demo admin plus three employees, seeded relative to 2024-03-15.
    pub async fn new_seeded() -> Self {
        let mut ctx = Self::empty().await;
        ctx.seeded = seed_demo(&ctx.db, ctx.today).await.expect("seed demo data");
        ctx
    }

    pub fn user(&self, code: &str) -> &users::Model {
        self.seeded
            .user_code(code)
            .unwrap_or_else(|| panic!("{code} not seeded"))
    }

    pub fn admin(&self) -> AuthContext {
        let admin = self.user("EMP001");
        AuthContext::new(admin.id, admin.role)
    }

    pub fn as_user(&self, code: &str) -> AuthContext {
        let user = self.user(code);
        AuthContext::new(user.id, user.role)
    }

    /// Onboard an extra employee with no attendance, leave or payroll.
    pub async fn hire(&self, code: &str, first_name: &str) -> users::Model {
        let record = profile::onboard_employee(
            &self.db,
            &self.admin(),
            NewEmployee {
                employee_code: code.into(),
                email: format!("{}@dayflow.com", first_name.to_lowercase()),
                password: "welcome1".into(),
                role: Role::Employee,
                profile: ProfileDetails {
                    first_name: first_name.into(),
                    last_name: "Tester".into(),
                    ..ProfileDetails::default()
                },
            },
        )
        .await
        .expect("onboard employee");
        record.identity
    }
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTimeWithTimeZone {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .expect("valid time");
    FixedOffset::east_opt(0)
        .expect("utc offset")
        .from_utc_datetime(&naive)
}

/// Throwaway Postgres database carved out of `TEST_DATABASE_URL`.
pub struct PgTestContext {
    pub db: DbPool,
    admin_url: String,
    db_name: String,
}

impl PgTestContext {
    pub async fn new_migrated() -> Option<Self> {
        let base = std::env::var("TEST_DATABASE_URL").ok()?;
        let (admin_url, db_name, test_url) = build_urls(&base)?;
        let admin = Database::connect(&admin_url).await.ok()?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{db_name}\";"),
            ))
            .await
            .ok()?;
        let db = connect(&DatabaseSettings::with_url(test_url)).await.ok()?;
        Migrator::up(&db, None).await.ok()?;
        Some(Self {
            db,
            admin_url,
            db_name,
        })
    }

    pub async fn cleanup(self) {
        let Self {
            db,
            admin_url,
            db_name,
        } = self;
        drop(db);
        if let Ok(admin) = Database::connect(&admin_url).await {
            let drop_sql = format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE);");
            let _ = admin
                .execute(Statement::from_string(DatabaseBackend::Postgres, drop_sql))
                .await;
        }
    }
}

fn build_urls(base: &str) -> Option<(String, String, String)> {
    let url = Url::parse(base).ok()?;
    let db_path = url.path().trim_start_matches('/').to_string();
    let base_name = if db_path.is_empty() {
        "hrms_test".to_string()
    } else {
        db_path
    };
    let db_name = format!("{}_{}", base_name, Uuid::new_v4().simple());
    let mut admin_url = url.clone();
    admin_url.set_path("/postgres");
    let mut test_url = url;
    test_url.set_path(&format!("/{db_name}"));
    Some((admin_url.to_string(), db_name, test_url.to_string()))
}
