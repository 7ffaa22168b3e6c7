//! Runs only when `TEST_DATABASE_URL` points at a Postgres server.
use chrono::Utc;
use entity::leave_requests::{LeaveType, Status};
use entity::users::Role;
use hrms_tests::{PgTestContext, day};
use products_hr::identity::{self, NewIdentity};
use products_hr::leave::{self, Decision, NewLeaveRequest};
use products_hr::payroll::{self, NewPayroll, SalaryFigures};
use products_hr::{AuthContext, HrError};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement, Value};

#[tokio::test]
async fn partial_index_allows_one_active_payroll() {
    let Some(ctx) = PgTestContext::new_migrated().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let bootstrap = AuthContext::admin(uuid::Uuid::new_v4());
    let user = identity::create_identity(
        &ctx.db,
        &bootstrap,
        NewIdentity {
            employee_code: "PG001".into(),
            email: "pg@dayflow.com".into(),
            password: "secret1".into(),
            role: Role::Employee,
        },
    )
    .await
    .unwrap();

    let change = payroll::create_payroll(
        &ctx.db,
        &bootstrap,
        NewPayroll {
            user_id: user.id,
            figures: SalaryFigures::new(100_000, 0, 0),
            net_salary_cents: None,
            currency: None,
            pay_period_start: None,
            pay_period_end: None,
            notes: None,
            effective_from: day(2024, 1, 1),
        },
    )
    .await
    .unwrap();
    assert!(change.created.is_active());

    let values: Vec<Value> = vec![
        uuid::Uuid::new_v4().into(),
        user.id.into(),
        day(2024, 6, 1).into(),
        Utc::now().into(),
    ];
    let second_active = ctx
        .db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO payroll (id, user_id, base_salary_cents, allowances_cents, deductions_cents, \
             net_salary_cents, currency, effective_from, created_at, updated_at) \
             VALUES ($1, $2, 1, 0, 0, 1, 'USD', $3, $4, $4)",
            values,
        ))
        .await;
    assert!(second_active.is_err());

    let duplicate = identity::create_identity(
        &ctx.db,
        &bootstrap,
        NewIdentity {
            employee_code: "PG002".into(),
            email: "PG@dayflow.com".into(),
            password: "secret1".into(),
            role: Role::Employee,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(duplicate, HrError::Conflict(_)));

    ctx.cleanup().await;
}

#[tokio::test]
async fn concurrent_reviews_settle_once() {
    let Some(ctx) = PgTestContext::new_migrated().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };
    let bootstrap = AuthContext::admin(uuid::Uuid::new_v4());
    let mut accounts = Vec::new();
    for (code, email, role) in [
        ("PG010", "boss@dayflow.com", Role::Admin),
        ("PG011", "worker@dayflow.com", Role::Employee),
    ] {
        let account = identity::create_identity(
            &ctx.db,
            &bootstrap,
            NewIdentity {
                employee_code: code.into(),
                email: email.into(),
                password: "secret1".into(),
                role,
            },
        )
        .await
        .unwrap();
        accounts.push(account);
    }
    let reviewer = AuthContext::admin(accounts[0].id);
    let worker = AuthContext::employee(accounts[1].id);

    for round in 0..5 {
        let start = day(2024, 5, 1 + round);
        let request = leave::submit_leave(
            &ctx.db,
            &worker,
            NewLeaveRequest {
                leave_type: LeaveType::Paid,
                start_date: start,
                end_date: start,
                total_days: None,
                remarks: None,
            },
            Utc::now().into(),
        )
        .await
        .unwrap();

        let now = Utc::now().into();
        let (approve, reject) = tokio::join!(
            leave::review_leave(&ctx.db, &reviewer, request.id, Decision::Approve, None, now),
            leave::review_leave(&ctx.db, &reviewer, request.id, Decision::Reject, None, now),
        );
        let (winner, loser) = match (approve, reject) {
            (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
            (a, b) => panic!("expected exactly one review to win, got {a:?} and {b:?}"),
        };
        assert_ne!(winner.status, Status::Pending);
        assert!(matches!(loser, HrError::InvalidTransition { .. }));

        let stored = leave::get_leave_request(&ctx.db, &worker, request.id)
            .await
            .unwrap();
        assert_eq!(stored.status, winner.status);
    }

    ctx.cleanup().await;
}
