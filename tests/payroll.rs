use chrono::Utc;
use hrms_tests::{HrTestContext, day};
use products_hr::HrError;
use products_hr::payroll::{self, NewPayroll, SalaryFigures};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, DatabaseBackend, SqlErr, Statement, Value};
use uuid::Uuid;

fn raise(user_id: Uuid, base_cents: i64, effective_from: chrono::NaiveDate) -> NewPayroll {
    NewPayroll {
        user_id,
        figures: SalaryFigures::new(base_cents, 500_000, 250_000),
        net_salary_cents: None,
        currency: None,
        pay_period_start: None,
        pay_period_end: None,
        notes: Some("annual review".into()),
        effective_from,
    }
}

#[tokio::test]
async fn seeded_payroll_is_active() {
    let ctx = HrTestContext::new_seeded().await;
    let alice = ctx.as_user("EMP002");
    let active = payroll::active_payroll(&ctx.db, &alice, alice.user_id)
        .await
        .unwrap()
        .expect("active payroll");
    assert_eq!(active.base_salary_cents, 7_500_000);
    assert_eq!(active.net_salary_cents, 7_500_000 + 750_000 - 375_000);
    assert_eq!(active.currency, "USD");
    assert_eq!(active.effective_from, day(2024, 1, 1));
    assert!(active.is_active());
}

#[tokio::test]
async fn new_record_closes_previous_the_day_before() {
    let ctx = HrTestContext::new_seeded().await;
    let admin = ctx.admin();
    let alice = ctx.user("EMP002").id;

    let change = payroll::create_payroll(&ctx.db, &admin, raise(alice, 8_000_000, day(2024, 4, 1)))
        .await
        .unwrap();
    assert_eq!(change.created.net_salary_cents, 8_250_000);
    assert!(change.created.is_active());
    let closed = change.closed.expect("previous record closed");
    assert_eq!(closed.effective_to, Some(day(2024, 3, 31)));

    let history = payroll::payroll_history(&ctx.db, &admin, alice).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, change.created.id);
    assert_eq!(history.iter().filter(|r| r.is_active()).count(), 1);

    let active = payroll::active_payroll(&ctx.db, &admin, alice).await.unwrap();
    assert_eq!(active.map(|r| r.id), Some(change.created.id));
}

#[tokio::test]
async fn effective_date_must_move_forward() {
    let ctx = HrTestContext::new_seeded().await;
    let admin = ctx.admin();
    let bob = ctx.user("EMP003").id;

    for effective_from in [day(2024, 1, 1), day(2023, 12, 1)] {
        let err = payroll::create_payroll(&ctx.db, &admin, raise(bob, 8_000_000, effective_from))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::Validation(_)));
    }
    let history = payroll::payroll_history(&ctx.db, &admin, bob).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_active());
}

#[tokio::test]
async fn first_record_has_nothing_to_close() {
    let ctx = HrTestContext::new_seeded().await;
    let dana = ctx.hire("EMP010", "Dana").await;
    let mut input = raise(dana.id, 5_000_000, day(2024, 3, 18));
    input.currency = Some("eur".into());
    input.net_salary_cents = Some(5_250_000);

    let change = payroll::create_payroll(&ctx.db, &ctx.admin(), input).await.unwrap();
    assert!(change.closed.is_none());
    assert_eq!(change.created.currency, "EUR");
}

#[tokio::test]
async fn inconsistent_figures_are_rejected() {
    let ctx = HrTestContext::new_seeded().await;
    let admin = ctx.admin();
    let carol = ctx.user("EMP004").id;

    let mut wrong_net = raise(carol, 6_000_000, day(2024, 5, 1));
    wrong_net.net_salary_cents = Some(6_000_000);
    let err = payroll::create_payroll(&ctx.db, &admin, wrong_net).await.unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let mut negative = raise(carol, 100_000, day(2024, 5, 1));
    negative.figures = SalaryFigures::new(100_000, 0, 200_000);
    let err = payroll::create_payroll(&ctx.db, &admin, negative).await.unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let mut bad_currency = raise(carol, 6_000_000, day(2024, 5, 1));
    bad_currency.currency = Some("dollars".into());
    let err = payroll::create_payroll(&ctx.db, &admin, bad_currency).await.unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let err = payroll::create_payroll(&ctx.db, &admin, raise(Uuid::new_v4(), 1, day(2024, 5, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::NotFound(_)));
}

#[tokio::test]
async fn employees_read_only_their_own_payroll() {
    let ctx = HrTestContext::new_seeded().await;
    let alice = ctx.as_user("EMP002");
    let bob = ctx.user("EMP003").id;

    let err = payroll::active_payroll(&ctx.db, &alice, bob).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden));
    let err = payroll::payroll_history(&ctx.db, &alice, bob).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden));
    let own_raise = raise(alice.user_id, 9_000_000, day(2024, 4, 1));
    let err = payroll::create_payroll(&ctx.db, &alice, own_raise).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden));
}

#[tokio::test]
async fn store_rejects_a_second_active_row() {
    let ctx = HrTestContext::new_seeded().await;
    let alice = ctx.user("EMP002").id;
    let insert = |effective_to: Option<chrono::NaiveDate>| {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let values: Vec<Value> = vec![
            Uuid::new_v4().into(),
            alice.into(),
            day(2023, 6, 1).into(),
            effective_to.into(),
            now.into(),
            now.into(),
        ];
        Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO payroll (id, user_id, base_salary_cents, allowances_cents, \
             deductions_cents, net_salary_cents, currency, effective_from, effective_to, \
             created_at, updated_at) VALUES (?, ?, 1, 0, 0, 1, 'USD', ?, ?, ?, ?)",
            values,
        )
    };

    let closed = ctx.db.execute(insert(Some(day(2023, 12, 31)))).await;
    assert!(closed.is_ok(), "{closed:?}");

    let second_active = ctx.db.execute(insert(None)).await;
    let err = second_active.expect_err("second active payroll row accepted");
    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));

    let history = payroll::payroll_history(&ctx.db, &ctx.admin(), alice).await.unwrap();
    assert_eq!(history.iter().filter(|r| r.is_active()).count(), 1);
}
