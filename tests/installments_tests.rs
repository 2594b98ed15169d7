// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use finledger::db;
use finledger::error::LedgerError;
use finledger::ledger::{accounts, installments, transactions};
use finledger::models::{
    AccountRequest, AccountType, InstallmentRequest, InstallmentStatus, TransactionRequest,
    TransactionStatus, TransactionType,
};
use finledger::utils::id_for_category;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn setup() -> (Connection, i64) {
    let mut conn = db::open_in_memory().unwrap();
    let id = accounts::create(
        &mut conn,
        &AccountRequest {
            name: "Card".into(),
            r#type: AccountType::CreditCard,
            balance: d("1000"),
            currency: "USD".into(),
        },
    )
    .unwrap()
    .id;
    (conn, id)
}

fn plan(account_id: i64, total: &str, count: u32) -> InstallmentRequest {
    InstallmentRequest {
        account_id,
        category_id: None,
        description: "Sofa".into(),
        total_amount: d(total),
        installment_count: count,
        start_date: date(2025, 1, 15),
        notes: None,
    }
}

#[test]
fn hundred_in_three_parts() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "100", 3)).unwrap();
    let amounts: Vec<Decimal> = g.installments.iter().map(|i| i.amount).collect();
    assert_eq!(amounts, vec![d("33.33"), d("33.33"), d("33.34")]);
    let dues: Vec<NaiveDate> = g.installments.iter().map(|i| i.due_date).collect();
    assert_eq!(
        dues,
        vec![date(2025, 1, 15), date(2025, 2, 15), date(2025, 3, 15)]
    );
    assert!(g.installments.iter().all(|i| i.status == InstallmentStatus::Pending));
    assert_eq!(g.paid_count, 0);
    // Creating a plan does not touch the balance
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("1000"));
}

#[test]
fn count_outside_bounds_is_rejected() {
    let (mut conn, acct) = setup();
    for count in [0, 1, 361] {
        assert!(matches!(
            installments::create_group(&mut conn, &plan(acct, "100", count)),
            Err(LedgerError::Validation { ref field, .. }) if field == "installmentCount"
        ));
    }
    assert_eq!(installments::list_groups(&conn, 0, None).unwrap().total_elements, 0);
}

#[test]
fn unknown_account_is_a_field_error() {
    let (mut conn, _) = setup();
    assert!(matches!(
        installments::create_group(&mut conn, &plan(77, "100", 3)),
        Err(LedgerError::Validation { ref field, .. }) if field == "accountId"
    ));
}

#[test]
fn paying_books_a_completed_expense() {
    let (mut conn, acct) = setup();
    let mut req = plan(acct, "100", 3);
    req.category_id = Some(id_for_category(&conn, "Shopping").unwrap());
    let g = installments::create_group(&mut conn, &req).unwrap();
    let first = &g.installments[0];

    let paid = installments::pay(&mut conn, first.id, date(2025, 1, 20)).unwrap();
    assert_eq!(paid.status, InstallmentStatus::Completed);
    let t = transactions::get(&conn, paid.transaction_id.unwrap()).unwrap();
    assert_eq!(t.r#type, TransactionType::Expense);
    assert_eq!(t.status, TransactionStatus::Completed);
    assert_eq!(t.amount, d("33.33"));
    assert_eq!(t.category_id, req.category_id);
    assert_eq!(t.description, "Sofa (1/3)");
    assert_eq!(t.transaction_date, date(2025, 1, 20));
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("966.67"));

    assert!(matches!(
        installments::pay(&mut conn, first.id, date(2025, 1, 21)),
        Err(LedgerError::InvalidStateTransition(_))
    ));
}

#[test]
fn paying_everything_completes_the_plan() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "100", 3)).unwrap();
    for i in &g.installments {
        installments::pay(&mut conn, i.id, i.due_date).unwrap();
    }
    let g = installments::get_group(&conn, g.id).unwrap();
    assert_eq!(g.paid_count, g.installment_count);
    let booked = transactions::list(
        &conn,
        &transactions::TransactionFilter {
            account_id: Some(acct),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(booked.total_elements, 3);
    assert!(booked.content.iter().all(|t| t.status == TransactionStatus::Completed));
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("900"));
}

#[test]
fn cancel_leaves_paid_installments_alone() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "500", 5)).unwrap();
    installments::pay(&mut conn, g.installments[0].id, date(2025, 1, 15)).unwrap();
    installments::pay(&mut conn, g.installments[1].id, date(2025, 2, 15)).unwrap();

    assert_eq!(installments::cancel_group(&mut conn, g.id).unwrap(), 3);
    let g = installments::get_group(&conn, g.id).unwrap();
    let statuses: Vec<InstallmentStatus> = g.installments.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![
            InstallmentStatus::Completed,
            InstallmentStatus::Completed,
            InstallmentStatus::Cancelled,
            InstallmentStatus::Cancelled,
            InstallmentStatus::Cancelled,
        ]
    );
    assert_eq!(g.paid_count, 2);
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("800"));
    assert!(matches!(
        installments::pay(&mut conn, g.installments[4].id, date(2025, 5, 15)),
        Err(LedgerError::InvalidStateTransition(_))
    ));
    assert!(matches!(
        installments::cancel_group(&mut conn, 999),
        Err(LedgerError::NotFound { .. })
    ));
}

#[test]
fn deleting_the_payment_reopens_the_installment() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "100", 2)).unwrap();
    let paid = installments::pay(&mut conn, g.installments[0].id, date(2025, 1, 15)).unwrap();
    transactions::delete(&mut conn, paid.transaction_id.unwrap()).unwrap();

    let again = installments::get_installment(&conn, paid.id).unwrap();
    assert_eq!(again.status, InstallmentStatus::Pending);
    assert_eq!(again.transaction_id, None);
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("1000"));
    assert!(installments::link_issues(&conn).unwrap().is_empty());
}

#[test]
fn cancelling_the_payment_reopens_the_installment() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "100", 2)).unwrap();
    let paid = installments::pay(&mut conn, g.installments[1].id, date(2025, 2, 15)).unwrap();
    transactions::set_status(
        &mut conn,
        paid.transaction_id.unwrap(),
        TransactionStatus::Cancelled,
    )
    .unwrap();
    let again = installments::get_installment(&conn, paid.id).unwrap();
    assert_eq!(again.status, InstallmentStatus::Pending);
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("1000"));
}

#[test]
fn cancelling_twice_is_a_no_op() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "100", 4)).unwrap();
    assert_eq!(installments::cancel_group(&mut conn, g.id).unwrap(), 4);
    assert_eq!(installments::cancel_group(&mut conn, g.id).unwrap(), 0);
}

#[test]
fn small_plans_stay_payable() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "0.10", 6)).unwrap();
    assert!(g.installments.iter().all(|i| i.amount > Decimal::ZERO));
    for i in &g.installments {
        installments::pay(&mut conn, i.id, i.due_date).unwrap();
    }
    let g = installments::get_group(&conn, g.id).unwrap();
    assert_eq!(g.paid_count, 6);
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("999.90"));

    assert!(matches!(
        installments::create_group(&mut conn, &plan(acct, "1.00", 120)),
        Err(LedgerError::Validation { ref field, .. }) if field == "totalAmount"
    ));
}

#[test]
fn failed_payment_leaves_no_trace() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "100", 2)).unwrap();
    // The expense is booked before the installment row is marked paid
    conn.execute_batch(
        "CREATE TRIGGER freeze BEFORE UPDATE ON installments BEGIN SELECT RAISE(ABORT, 'frozen'); END;",
    )
    .unwrap();
    assert!(matches!(
        installments::pay(&mut conn, g.installments[0].id, date(2025, 1, 15)),
        Err(LedgerError::Storage(_))
    ));
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("1000"));
    let booked = transactions::list(&conn, &Default::default()).unwrap();
    assert_eq!(booked.total_elements, 0);
    let i = installments::get_installment(&conn, g.installments[0].id).unwrap();
    assert_eq!(i.status, InstallmentStatus::Pending);
}

#[test]
fn payment_amount_and_account_are_locked() {
    let (mut conn, acct) = setup();
    let g = installments::create_group(&mut conn, &plan(acct, "100", 2)).unwrap();
    let paid = installments::pay(&mut conn, g.installments[0].id, date(2025, 1, 15)).unwrap();
    let tx_id = paid.transaction_id.unwrap();
    let current = transactions::get(&conn, tx_id).unwrap();

    let mut edit = TransactionRequest::from(&current);
    edit.amount = d("10");
    assert!(matches!(
        transactions::update(&mut conn, tx_id, &edit),
        Err(LedgerError::Conflict(_))
    ));

    let mut edit = TransactionRequest::from(&current);
    edit.description = "Sofa, first payment".into();
    transactions::update(&mut conn, tx_id, &edit).unwrap();
    assert_eq!(accounts::get(&conn, acct).unwrap().balance, d("950"));
    assert!(installments::link_issues(&conn).unwrap().is_empty());
}
