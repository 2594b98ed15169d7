// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use finledger::db;
use finledger::error::LedgerError;
use finledger::ledger::goals;
use finledger::models::{GoalRequest, GoalStatus, GoalView};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn req(target: &str) -> GoalRequest {
    GoalRequest {
        name: "Emergency fund".into(),
        target_amount: d(target),
        current_amount: None,
        deadline: NaiveDate::from_ymd_opt(2026, 12, 31),
        notes: None,
    }
}

#[test]
fn deposits_until_completed() {
    let mut conn = db::open_in_memory().unwrap();
    let g = goals::create(&mut conn, &req("100")).unwrap();
    assert_eq!(g.status, GoalStatus::InProgress);
    assert_eq!(g.current_amount, Decimal::ZERO);

    goals::deposit(&mut conn, g.id, d("70")).unwrap();
    let g = goals::deposit(&mut conn, g.id, d("40")).unwrap();
    assert_eq!(g.current_amount, d("110"));
    assert_eq!(g.status, GoalStatus::Completed);
    let view = GoalView::from(&g);
    assert_eq!(view.remaining_amount, Decimal::ZERO);
    assert_eq!(view.percentage_completed, 100.0);

    assert!(matches!(
        goals::deposit(&mut conn, g.id, d("5")),
        Err(LedgerError::InvalidStateTransition(_))
    ));
}

#[test]
fn deposit_amount_must_be_positive() {
    let mut conn = db::open_in_memory().unwrap();
    let g = goals::create(&mut conn, &req("100")).unwrap();
    assert!(matches!(
        goals::deposit(&mut conn, g.id, Decimal::ZERO),
        Err(LedgerError::Validation { .. })
    ));
    assert!(matches!(
        goals::deposit(&mut conn, 404, d("1")),
        Err(LedgerError::NotFound { .. })
    ));
}

#[test]
fn starting_amount_can_complete_immediately() {
    let mut conn = db::open_in_memory().unwrap();
    let mut r = req("50");
    r.current_amount = Some(d("50"));
    assert_eq!(goals::create(&mut conn, &r).unwrap().status, GoalStatus::Completed);
    r.current_amount = Some(d("-1"));
    assert!(matches!(
        goals::create(&mut conn, &r),
        Err(LedgerError::Validation { ref field, .. }) if field == "currentAmount"
    ));
}

#[test]
fn lowering_target_below_savings_completes() {
    let mut conn = db::open_in_memory().unwrap();
    let g = goals::create(&mut conn, &req("1000")).unwrap();
    goals::deposit(&mut conn, g.id, d("300")).unwrap();
    let g = goals::update(&mut conn, g.id, &req("250")).unwrap();
    assert_eq!(g.status, GoalStatus::Completed);
    assert_eq!(g.current_amount, d("300"));
}

#[test]
fn cancelled_goals_are_final() {
    let mut conn = db::open_in_memory().unwrap();
    let g = goals::create(&mut conn, &req("100")).unwrap();
    assert_eq!(goals::cancel(&mut conn, g.id).unwrap().status, GoalStatus::Cancelled);
    assert!(matches!(
        goals::cancel(&mut conn, g.id),
        Err(LedgerError::InvalidStateTransition(_))
    ));
    assert!(matches!(
        goals::deposit(&mut conn, g.id, d("10")),
        Err(LedgerError::InvalidStateTransition(_))
    ));
    goals::delete(&mut conn, g.id).unwrap();
    assert!(goals::list(&conn).unwrap().is_empty());
}

#[test]
fn oversized_amounts_are_field_errors() {
    let mut conn = db::open_in_memory().unwrap();
    let g = goals::create(&mut conn, &req("100")).unwrap();
    assert!(matches!(
        goals::deposit(&mut conn, g.id, Decimal::MAX),
        Err(LedgerError::Validation { ref field, .. }) if field == "amount"
    ));
    assert_eq!(goals::get(&conn, g.id).unwrap().current_amount, Decimal::ZERO);
    assert!(matches!(
        goals::create(&mut conn, &req("10000000000000")),
        Err(LedgerError::Validation { ref field, .. }) if field == "targetAmount"
    ));
}
