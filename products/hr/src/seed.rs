//! One-time demo data. Skipped entirely once any identity exists.

use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use entity::employee_profiles::{self, EmploymentType};
use entity::users::{self, Role};
use entity::{attendance, leave_requests, payroll};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::attendance::{classify_hours, worked_hours};
use crate::error::{HrError, HrResult};
use crate::identity::{self, NewIdentity};
use crate::payroll::{DEFAULT_CURRENCY, SalaryFigures};

struct DemoEmployee {
    code: &'static str,
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    department: &'static str,
    position: &'static str,
    base_cents: i64,
}

const DEMO_EMPLOYEES: [DemoEmployee; 3] = [
    DemoEmployee {
        code: "EMP002",
        email: "employee1@dayflow.com",
        first_name: "Alice",
        last_name: "Smith",
        department: "Engineering",
        position: "Software Engineer",
        base_cents: 7_500_000,
    },
    DemoEmployee {
        code: "EMP003",
        email: "employee2@dayflow.com",
        first_name: "Bob",
        last_name: "Johnson",
        department: "Marketing",
        position: "Marketing Manager",
        base_cents: 7_000_000,
    },
    DemoEmployee {
        code: "EMP004",
        email: "employee3@dayflow.com",
        first_name: "Carol",
        last_name: "Williams",
        department: "Sales",
        position: "Sales Representative",
        base_cents: 6_500_000,
    },
];

pub const DEMO_ADMIN_EMAIL: &str = "admin@dayflow.com";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_EMPLOYEE_PASSWORD: &str = "emp123";

#[derive(Debug, Clone, Default)]
pub struct SeededRecords {
    pub users: Vec<users::Model>,
    pub leave_requests: Vec<leave_requests::Model>,
}

impl SeededRecords {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn user_code(&self, code: &str) -> Option<&users::Model> {
        self.users.iter().find(|u| u.employee_code == code)
    }
}

/// Seed demo accounts relative to `today`. Returns empty records when the
/// store already holds identities.
pub async fn seed_demo(db: &DatabaseConnection, today: NaiveDate) -> HrResult<SeededRecords> {
    if users::Entity::find().count(db).await? > 0 {
        info!("identities already present; skipping demo seed");
        return Ok(SeededRecords::default());
    }

    let txn = db.begin().await?;
    let mut seeded = SeededRecords::default();

    let admin = identity::insert_identity(
        &txn,
        NewIdentity {
            employee_code: "EMP001".into(),
            email: DEMO_ADMIN_EMAIL.into(),
            password: DEMO_ADMIN_PASSWORD.into(),
            role: Role::Admin,
        },
    )
    .await?;
    insert_profile(
        &txn,
        admin.id,
        ("John", "Admin"),
        Some("+1-234-567-8900"),
        Some("123 Admin Street, City, State 12345"),
        date(1985, 1, 15)?,
        ("Human Resources", "HR Manager"),
        date(2020, 1, 1)?,
    )
    .await?;
    insert_payroll(&txn, admin.id, SalaryFigures::new(8_000_000, 1_000_000, 500_000)).await?;
    seeded.users.push(admin);

    for demo in &DEMO_EMPLOYEES {
        let user = identity::insert_identity(
            &txn,
            NewIdentity {
                employee_code: demo.code.into(),
                email: demo.email.into(),
                password: DEMO_EMPLOYEE_PASSWORD.into(),
                role: Role::Employee,
            },
        )
        .await?;
        let suffix = &demo.code[demo.code.len() - 3..];
        insert_profile(
            &txn,
            user.id,
            (demo.first_name, demo.last_name),
            Some(&format!("+1-234-567-{suffix}")),
            Some(&format!("{} Street, City, State", demo.first_name)),
            date(1990, 5, 20)?,
            (demo.department, demo.position),
            date(2022, 6, 1)?,
        )
        .await?;
        let figures =
            SalaryFigures::new(demo.base_cents, demo.base_cents / 10, demo.base_cents / 20);
        insert_payroll(&txn, user.id, figures).await?;

        for offset in 0..5 {
            let day = days_back(today, offset)?;
            insert_full_day(&txn, user.id, day).await?;
        }

        let start = today
            .checked_add_days(Days::new(5))
            .ok_or_else(|| HrError::validation("seed date out of range"))?;
        let end = today
            .checked_add_days(Days::new(7))
            .ok_or_else(|| HrError::validation("seed date out of range"))?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        let leave = leave_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            leave_type: Set(leave_requests::LeaveType::Paid),
            start_date: Set(start),
            end_date: Set(end),
            total_days: Set(3),
            remarks: Set(Some("Family vacation".into())),
            status: Set(leave_requests::Status::Pending),
            admin_comments: Set(None),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        seeded.leave_requests.push(leave);
        seeded.users.push(user);
    }

    txn.commit().await?;
    info!(users = seeded.users.len(), "demo data seeded");
    Ok(seeded)
}

fn date(year: i32, month: u32, day: u32) -> HrResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| HrError::validation("invalid seed date"))
}

fn days_back(today: NaiveDate, offset: u64) -> HrResult<NaiveDate> {
    today
        .checked_sub_days(Days::new(offset))
        .ok_or_else(|| HrError::validation("seed date out of range"))
}

fn at_hour(day: NaiveDate, hour: u32) -> HrResult<DateTimeWithTimeZone> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| HrError::validation("invalid seed time"))?;
    Ok(Utc.from_utc_datetime(&day.and_time(time)).into())
}

#[allow(clippy::too_many_arguments)]
async fn insert_profile<C>(
    conn: &C,
    user_id: Uuid,
    (first_name, last_name): (&str, &str),
    phone: Option<&str>,
    address: Option<&str>,
    date_of_birth: NaiveDate,
    (department, position): (&str, &str),
    hire_date: NaiveDate,
) -> HrResult<()>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = Utc::now().into();
    employee_profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        phone: Set(phone.map(str::to_string)),
        address: Set(address.map(str::to_string)),
        date_of_birth: Set(Some(date_of_birth)),
        profile_picture: Set(None),
        department: Set(Some(department.to_string())),
        position: Set(Some(position.to_string())),
        hire_date: Set(Some(hire_date)),
        employment_type: Set(Some(EmploymentType::FullTime)),
        documents: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn insert_payroll<C>(conn: &C, user_id: Uuid, figures: SalaryFigures) -> HrResult<()>
where
    C: ConnectionTrait,
{
    let now: DateTimeWithTimeZone = Utc::now().into();
    payroll::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        base_salary_cents: Set(figures.base_cents),
        allowances_cents: Set(figures.allowances_cents),
        deductions_cents: Set(figures.deductions_cents),
        net_salary_cents: Set(figures.net()?),
        currency: Set(DEFAULT_CURRENCY.to_string()),
        pay_period_start: Set(None),
        pay_period_end: Set(None),
        notes: Set(None),
        effective_from: Set(date(2024, 1, 1)?),
        effective_to: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn insert_full_day<C>(conn: &C, user_id: Uuid, day: NaiveDate) -> HrResult<()>
where
    C: ConnectionTrait,
{
    let check_in = at_hour(day, 9)?;
    let check_out = at_hour(day, 17)?;
    let hours = worked_hours(check_in, check_out)?;
    attendance::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        date: Set(day),
        check_in: Set(Some(check_in)),
        check_out: Set(Some(check_out)),
        status: Set(classify_hours(hours)),
        total_hours: Set(hours),
        notes: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}
