use entity::leave_requests::{LeaveType, Status};
use hrms_tests::{HrTestContext, at, day};
use products_hr::HrError;
use products_hr::leave::{self, Decision, NewLeaveRequest};

fn sick_leave(start: chrono::NaiveDate, end: chrono::NaiveDate) -> NewLeaveRequest {
    NewLeaveRequest {
        leave_type: LeaveType::Sick,
        start_date: start,
        end_date: end,
        total_days: None,
        remarks: Some("  flu  ".into()),
    }
}

#[tokio::test]
async fn submission_derives_span_and_starts_pending() {
    let ctx = HrTestContext::new_seeded().await;
    let alice = ctx.as_user("EMP002");
    let now = at(ctx.today, 10, 0);

    let request = leave::submit_leave(
        &ctx.db,
        &alice,
        sick_leave(day(2024, 4, 1), day(2024, 4, 3)),
        now,
    )
    .await
    .unwrap();
    assert_eq!(request.user_id, alice.user_id);
    assert_eq!(request.total_days, 3);
    assert_eq!(request.status, Status::Pending);
    assert_eq!(request.remarks.as_deref(), Some("flu"));
    assert!(request.reviewed_by.is_none());
}

#[tokio::test]
async fn invalid_spans_are_rejected() {
    let ctx = HrTestContext::new_seeded().await;
    let alice = ctx.as_user("EMP002");
    let now = at(ctx.today, 10, 0);

    let reversed = sick_leave(day(2024, 4, 3), day(2024, 4, 1));
    let err = leave::submit_leave(&ctx.db, &alice, reversed, now).await.unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));

    let mut mismatched = sick_leave(day(2024, 4, 1), day(2024, 4, 3));
    mismatched.total_days = Some(5);
    let err = leave::submit_leave(&ctx.db, &alice, mismatched, now).await.unwrap_err();
    assert!(matches!(err, HrError::Validation(_)));
}

#[tokio::test]
async fn approval_is_terminal() {
    let ctx = HrTestContext::new_seeded().await;
    let admin = ctx.admin();
    let pending = ctx.seeded.leave_requests[0].clone();
    let reviewed_at = at(ctx.today, 11, 0);

    let approved = leave::review_leave(
        &ctx.db,
        &admin,
        pending.id,
        Decision::Approve,
        Some(" enjoy ".into()),
        reviewed_at,
    )
    .await
    .unwrap();
    assert_eq!(approved.status, Status::Approved);
    assert_eq!(approved.reviewed_by, Some(admin.user_id));
    assert_eq!(approved.reviewed_at, Some(reviewed_at));
    assert_eq!(approved.updated_at, reviewed_at);
    assert_eq!(approved.admin_comments.as_deref(), Some("enjoy"));

    for decision in [Decision::Approve, Decision::Reject] {
        let err = leave::review_leave(&ctx.db, &admin, pending.id, decision, None, reviewed_at)
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidTransition { from: "approved", .. }));
    }
}

#[tokio::test]
async fn rejection_leaves_queue() {
    let ctx = HrTestContext::new_seeded().await;
    let admin = ctx.admin();

    let queue = leave::pending_leave_requests(&ctx.db, &admin).await.unwrap();
    assert_eq!(queue.len(), 3);

    let rejected = leave::review_leave(
        &ctx.db,
        &admin,
        queue[1].id,
        Decision::Reject,
        Some("quarter close".into()),
        at(ctx.today, 12, 0),
    )
    .await
    .unwrap();
    assert_eq!(rejected.status, Status::Rejected);

    let queue = leave::pending_leave_requests(&ctx.db, &admin).await.unwrap();
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|r| r.id != rejected.id));
}

#[tokio::test]
async fn only_admins_review_or_list_the_queue() {
    let ctx = HrTestContext::new_seeded().await;
    let alice = ctx.as_user("EMP002");
    let own = ctx
        .seeded
        .leave_requests
        .iter()
        .find(|r| r.user_id == alice.user_id)
        .expect("seeded leave")
        .clone();

    let morning = at(ctx.today, 9, 0);
    let err = leave::review_leave(&ctx.db, &alice, own.id, Decision::Approve, None, morning)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden));
    let err = leave::pending_leave_requests(&ctx.db, &alice).await.unwrap_err();
    assert!(matches!(err, HrError::Forbidden));

    let unchanged = leave::get_leave_request(&ctx.db, &alice, own.id).await.unwrap();
    assert_eq!(unchanged.status, Status::Pending);

    let err = leave::get_leave_request(&ctx.db, &ctx.as_user("EMP003"), own.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden));
}

#[tokio::test]
async fn reviewing_unknown_request_is_not_found() {
    let ctx = HrTestContext::new_seeded().await;
    let err = leave::review_leave(
        &ctx.db,
        &ctx.admin(),
        uuid::Uuid::new_v4(),
        Decision::Approve,
        None,
        at(ctx.today, 9, 0),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HrError::NotFound(_)));
}

#[tokio::test]
async fn history_is_newest_first_and_overlaps_are_found() {
    let ctx = HrTestContext::new_seeded().await;
    let bob = ctx.as_user("EMP003");

    let later = leave::submit_leave(
        &ctx.db,
        &bob,
        NewLeaveRequest {
            leave_type: LeaveType::Unpaid,
            start_date: day(2024, 3, 21),
            end_date: day(2024, 3, 25),
            total_days: Some(5),
            remarks: None,
        },
        chrono::Utc::now().into(),
    )
    .await
    .unwrap();

    let history = leave::leave_requests_for(&ctx.db, &bob, bob.user_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at >= history[1].created_at);
    assert!(history.iter().any(|r| r.id == later.id));

    // Seeded request covers 2024-03-20..=2024-03-22.
    let overlaps =
        leave::overlapping_requests(&ctx.db, bob.user_id, day(2024, 3, 22), day(2024, 3, 22), None)
            .await
            .unwrap();
    assert_eq!(overlaps.len(), 2);

    let others = leave::overlapping_requests(
        &ctx.db,
        bob.user_id,
        day(2024, 3, 22),
        day(2024, 3, 22),
        Some(later.id),
    )
    .await
    .unwrap();
    assert_eq!(others.len(), 1);

    let none =
        leave::overlapping_requests(&ctx.db, bob.user_id, day(2024, 3, 26), day(2024, 3, 30), None)
            .await
            .unwrap();
    assert!(none.is_empty());

    let err = leave::leave_requests_for(&ctx.db, &bob, ctx.user("EMP002").id)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden));
}
