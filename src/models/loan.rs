//! Loan (borrow) model and related types

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::borrower::{Borrower, BorrowerCategory};
use super::item::Item;
use crate::error::{AppError, AppResult};

/// One lending transaction between a borrower and an item.
///
/// The loan refers to its borrower and item by id; the lending service owns
/// both and hands them in when the loan is closed.
#[derive(Debug, Clone, Serialize)]
pub struct Loan {
    id: i32,
    borrower_id: i32,
    item_id: i32,
    opened_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
    fine_charged: Decimal,
}

/// Loan with borrower and item details for display
#[derive(Debug, Clone, Serialize)]
pub struct LoanDetails {
    pub id: i32,
    pub borrower_id: i32,
    pub borrower_name: String,
    pub category: BorrowerCategory,
    pub item_id: i32,
    pub item_title: String,
    pub opened_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub fine_charged: Decimal,
    pub is_overdue: bool,
}

impl Loan {
    /// Open a loan. The due date is fixed now from the borrower's grace period.
    pub(crate) fn open(id: i32, borrower: &Borrower, item: &Item, now: DateTime<Utc>) -> Self {
        Self {
            id,
            borrower_id: borrower.id(),
            item_id: item.id(),
            opened_at: now,
            due_at: now + Duration::days(borrower.grace_period_days()),
            returned_at: None,
            fine_charged: Decimal::ZERO,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn borrower_id(&self) -> i32 {
        self.borrower_id
    }

    pub fn item_id(&self) -> i32 {
        self.item_id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }

    pub fn fine_charged(&self) -> Decimal {
        self.fine_charged
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && now > self.due_at
    }

    /// Whole days past the due date at `at`, any started day counting as one.
    pub fn days_late(&self, at: DateTime<Utc>) -> i64 {
        let late = at - self.due_at;
        if late <= Duration::zero() {
            return 0;
        }
        let days = late.num_days();
        if late > Duration::days(days) {
            days + 1
        } else {
            days
        }
    }

    /// Close the loan at `now`, return the copy and charge any late fine.
    ///
    /// Returns the fine charged, zero when returned on time. A closed loan
    /// cannot be closed again and nothing is touched in that case.
    pub(crate) fn close(
        &mut self,
        now: DateTime<Utc>,
        borrower: &mut Borrower,
        item: &mut Item,
    ) -> AppResult<Decimal> {
        if !self.is_open() {
            return Err(AppError::AlreadyClosed(format!(
                "Loan {} was returned on {}",
                self.id,
                self.returned_at.unwrap_or(now)
            )));
        }

        let days_late = self.days_late(now);
        let fine = Decimal::from(days_late) * borrower.daily_fine_rate();

        if item.available_copies() >= item.total_copies() {
            return Err(AppError::Internal(format!(
                "Item {} has no copy out for loan {}",
                item.id(),
                self.id
            )));
        }
        borrower.charge_fine(fine)?;
        item.checkin();

        self.returned_at = Some(now);
        self.fine_charged = fine;

        Ok(fine)
    }

    pub(crate) fn details(&self, borrower: &Borrower, item: &Item, now: DateTime<Utc>) -> LoanDetails {
        LoanDetails {
            id: self.id,
            borrower_id: self.borrower_id,
            borrower_name: borrower.name().to_string(),
            category: borrower.category(),
            item_id: self.item_id,
            item_title: item.title().to_string(),
            opened_at: self.opened_at,
            due_at: self.due_at,
            returned_at: self.returned_at,
            fine_charged: self.fine_charged,
            is_overdue: self.is_overdue(now),
        }
    }
}
