//! Lending service: checkout, check-in and the eligibility rules between them

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use validator::Validate;

use super::notification::NotificationSink;
use crate::{
    error::{AppError, AppResult},
    models::{Borrower, Item, Loan, LoanDetails, NewBorrower, NewItem},
};

/// Owns every item, borrower and loan, and is the only writer to them.
pub struct LendingService {
    items: IndexMap<i32, Item>,
    borrowers: IndexMap<i32, Borrower>,
    loans: IndexMap<i32, Loan>,
    next_loan_id: i32,
    notifier: Box<dyn NotificationSink>,
    currency: String,
}

impl LendingService {
    pub fn new(notifier: Box<dyn NotificationSink>) -> Self {
        Self {
            items: IndexMap::new(),
            borrowers: IndexMap::new(),
            loans: IndexMap::new(),
            next_loan_id: 1,
            notifier,
            currency: "$".to_string(),
        }
    }

    /// Currency symbol used when amounts are written into notifications
    pub fn with_currency(mut self, symbol: impl Into<String>) -> Self {
        self.currency = symbol.into();
        self
    }

    /// Add an item to the catalog with every copy available
    pub fn add_item(&mut self, item: NewItem) -> AppResult<&Item> {
        item.validate()?;
        if self.items.contains_key(&item.id) {
            return Err(AppError::Conflict(format!("Item {} already exists", item.id)));
        }

        tracing::info!("Catalog: added item id={} ({} copies)", item.id, item.total_copies);
        let id = item.id;
        Ok(self.items.entry(id).or_insert(Item::new(item)))
    }

    /// Register a borrower with a zero fine balance
    pub fn register_borrower(&mut self, borrower: NewBorrower) -> AppResult<&Borrower> {
        borrower.validate()?;
        if self.borrowers.contains_key(&borrower.id) {
            return Err(AppError::Conflict(format!(
                "Borrower {} already exists",
                borrower.id
            )));
        }

        tracing::info!(
            "Borrowers: registered id={} as {}",
            borrower.id,
            borrower.category
        );
        let id = borrower.id;
        Ok(self.borrowers.entry(id).or_insert(Borrower::new(borrower)))
    }

    pub fn item(&self, id: i32) -> AppResult<&Item> {
        self.items
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    pub fn borrower(&self, id: i32) -> AppResult<&Borrower> {
        self.borrowers
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    pub fn loan(&self, id: i32) -> AppResult<&Loan> {
        self.loans
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Open loans of a borrower, oldest first
    pub fn open_loans(&self, borrower_id: i32) -> AppResult<Vec<&Loan>> {
        self.borrower(borrower_id)?;
        Ok(self
            .loans
            .values()
            .filter(|loan| loan.borrower_id() == borrower_id && loan.is_open())
            .collect())
    }

    pub fn loan_details(&self, loan_id: i32, now: DateTime<Utc>) -> AppResult<LoanDetails> {
        let loan = self.loan(loan_id)?;
        let borrower = self.borrower(loan.borrower_id())?;
        let item = self.item(loan.item_id())?;
        Ok(loan.details(borrower, item, now))
    }

    /// Open loans past their due date at `now`
    pub fn overdue_loans(&self, now: DateTime<Utc>) -> AppResult<Vec<LoanDetails>> {
        self.loans
            .values()
            .filter(|loan| loan.is_overdue(now))
            .map(|loan| self.loan_details(loan.id(), now))
            .collect()
    }

    /// Count active loans
    pub fn count_active(&self) -> usize {
        self.loans.values().filter(|loan| loan.is_open()).count()
    }

    /// Lend one copy of `item_id` to `borrower_id`.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// unknown ids, no copy available, outstanding fine, loan limit.
    /// Nothing changes unless every check passes.
    pub fn checkout(&mut self, borrower_id: i32, item_id: i32, now: DateTime<Utc>) -> AppResult<i32> {
        let result = self.try_checkout(borrower_id, item_id, now);
        if let Err(ref e) = result {
            tracing::warn!(
                "Checkout refused for borrower={} item={}: {}",
                borrower_id,
                item_id,
                e
            );
        }
        result
    }

    fn try_checkout(&mut self, borrower_id: i32, item_id: i32, now: DateTime<Utc>) -> AppResult<i32> {
        let borrower = self
            .borrowers
            .get(&borrower_id)
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", borrower_id)))?;
        let item = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", item_id)))?;

        if !item.is_available() {
            return Err(AppError::Unavailable(format!(
                "\"{}\" has no copy available",
                item.title()
            )));
        }

        if borrower.has_outstanding_fine() {
            return Err(AppError::OutstandingFine(format!(
                "{} owes {}{:.2}",
                borrower.name(),
                self.currency,
                borrower.accumulated_fine()
            )));
        }

        let open = self
            .loans
            .values()
            .filter(|loan| loan.borrower_id() == borrower_id && loan.is_open())
            .count();
        if open >= borrower.loan_limit() {
            return Err(AppError::LimitReached(format!(
                "{} has {}/{} loans open",
                borrower.name(),
                open,
                borrower.loan_limit()
            )));
        }

        let loan_id = self.next_loan_id;
        let next_loan_id = loan_id
            .checked_add(1)
            .ok_or_else(|| AppError::Internal("loan ids exhausted".to_string()))?;

        if !item.checkout() {
            return Err(AppError::Unavailable(format!(
                "\"{}\" has no copy available",
                item.title()
            )));
        }
        self.next_loan_id = next_loan_id;
        let loan = Loan::open(loan_id, borrower, item, now);

        tracing::info!(
            "Loan {} opened: borrower={} item={} due={}",
            loan_id,
            borrower_id,
            item_id,
            loan.due_at()
        );
        self.notifier.send(
            &format!(
                "Loan of \"{}\" recorded. Due back in {} days.",
                item.title(),
                borrower.grace_period_days()
            ),
            borrower.name(),
        );

        self.loans.insert(loan_id, loan);
        Ok(loan_id)
    }

    /// Take back the copy lent by `loan_id` and charge any late fine.
    ///
    /// Returns the fine charged, zero for an on-time return.
    pub fn checkin(&mut self, loan_id: i32, now: DateTime<Utc>) -> AppResult<Decimal> {
        let result = self.try_checkin(loan_id, now);
        if let Err(ref e) = result {
            tracing::warn!("Check-in refused for loan={}: {}", loan_id, e);
        }
        result
    }

    fn try_checkin(&mut self, loan_id: i32, now: DateTime<Utc>) -> AppResult<Decimal> {
        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;
        let borrower = self.borrowers.get_mut(&loan.borrower_id()).ok_or_else(|| {
            AppError::Internal(format!("Loan {} refers to an unknown borrower", loan_id))
        })?;
        let item = self.items.get_mut(&loan.item_id()).ok_or_else(|| {
            AppError::Internal(format!("Loan {} refers to an unknown item", loan_id))
        })?;

        let fine = loan.close(now, borrower, item)?;

        if fine > Decimal::ZERO {
            tracing::info!(
                "Loan {} returned {} day(s) late, fine={}",
                loan_id,
                loan.days_late(now),
                fine
            );
            self.notifier.send(
                &format!(
                    "Late return of \"{}\". Fine of {}{:.2} applied, outstanding balance {}{:.2}.",
                    item.title(),
                    self.currency,
                    fine,
                    self.currency,
                    borrower.accumulated_fine()
                ),
                borrower.name(),
            );
        } else {
            tracing::info!("Loan {} returned on time", loan_id);
            self.notifier.send(
                &format!("\"{}\" returned on time. Thank you!", item.title()),
                borrower.name(),
            );
        }

        Ok(fine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BorrowerCategory;
    use crate::services::notification::MockNotificationSink;
    use chrono::{Duration, TimeZone};
    use mockall::predicate::eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 10, 30, 0).unwrap()
    }

    fn quiet() -> MockNotificationSink {
        let mut sink = MockNotificationSink::new();
        sink.expect_send().return_const(());
        sink
    }

    fn service(sink: MockNotificationSink) -> LendingService {
        let mut service = LendingService::new(Box::new(sink));
        service
            .add_item(NewItem {
                id: 1,
                title: "Clean Code".to_string(),
                author: Some("Robert Martin".to_string()),
                total_copies: 3,
            })
            .unwrap();
        service
            .add_item(NewItem {
                id: 2,
                title: "1984".to_string(),
                author: Some("George Orwell".to_string()),
                total_copies: 1,
            })
            .unwrap();
        service
            .register_borrower(NewBorrower {
                id: 1,
                name: "Ana Silva".to_string(),
                category: BorrowerCategory::Student,
            })
            .unwrap();
        service
            .register_borrower(NewBorrower {
                id: 3,
                name: "Bia Comum".to_string(),
                category: BorrowerCategory::Standard,
            })
            .unwrap();
        service
    }

    #[test]
    fn test_checkout_notifies_borrower() {
        let mut sink = MockNotificationSink::new();
        sink.expect_send()
            .with(
                eq("Loan of \"Clean Code\" recorded. Due back in 14 days."),
                eq("Ana Silva"),
            )
            .times(1)
            .return_const(());
        let mut service = service(sink);

        let loan_id = service.checkout(1, 1, now()).unwrap();

        let loan = service.loan(loan_id).unwrap();
        assert_eq!(loan.due_at(), now() + Duration::days(14));
        assert_eq!(service.item(1).unwrap().available_copies(), 2);
        assert_eq!(service.count_active(), 1);
    }

    #[test]
    fn test_checkout_unknown_ids() {
        let mut sink = MockNotificationSink::new();
        sink.expect_send().never();
        let mut service = service(sink);

        assert!(matches!(service.checkout(99, 1, now()), Err(AppError::NotFound(_))));
        assert!(matches!(service.checkout(1, 99, now()), Err(AppError::NotFound(_))));
        assert_eq!(service.count_active(), 0);
    }

    #[test]
    fn test_unavailable_is_reported_before_fine() {
        let mut service = service(quiet());
        let loan_id = service.checkout(3, 2, now()).unwrap();
        service.checkin(loan_id, now() + Duration::days(8)).unwrap();
        assert!(service.borrower(3).unwrap().has_outstanding_fine());

        service.checkout(1, 2, now() + Duration::days(9)).unwrap();

        let result = service.checkout(3, 2, now() + Duration::days(9));
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[test]
    fn test_outstanding_fine_blocks_checkout() {
        let mut service = service(quiet());
        let first = service.checkout(3, 1, now()).unwrap();
        service.checkout(3, 2, now()).unwrap();
        let fine = service.checkin(first, now() + Duration::days(10)).unwrap();
        assert_eq!(fine, Decimal::new(3, 0));

        // One loan open out of two allowed, one copy on the shelf
        let result = service.checkout(3, 1, now() + Duration::days(10));
        assert!(matches!(result, Err(AppError::OutstandingFine(_))));
        assert_eq!(service.open_loans(3).unwrap().len(), 1);
        assert_eq!(service.item(1).unwrap().available_copies(), 3);
    }

    #[test]
    fn test_late_checkin_notifies_fine() {
        let mut sink = MockNotificationSink::new();
        sink.expect_send()
            .withf(|message, _| message.starts_with("Loan of"))
            .return_const(());
        sink.expect_send()
            .with(
                eq("Late return of \"1984\". Fine of R$3.00 applied, outstanding balance R$3.00."),
                eq("Bia Comum"),
            )
            .times(1)
            .return_const(());
        let mut service = service(sink).with_currency("R$");

        let loan_id = service.checkout(3, 2, now()).unwrap();
        let due = service.loan(loan_id).unwrap().due_at();
        let fine = service.checkin(loan_id, due + Duration::hours(72)).unwrap();

        assert_eq!(fine, Decimal::new(3, 0));
        assert_eq!(service.borrower(3).unwrap().accumulated_fine(), Decimal::new(3, 0));
    }

    #[test]
    fn test_on_time_checkin_notifies_success() {
        let mut sink = MockNotificationSink::new();
        sink.expect_send()
            .withf(|message, _| message.starts_with("Loan of"))
            .return_const(());
        sink.expect_send()
            .with(eq("\"Clean Code\" returned on time. Thank you!"), eq("Ana Silva"))
            .times(1)
            .return_const(());
        let mut service = service(sink);

        let loan_id = service.checkout(1, 1, now()).unwrap();
        let fine = service.checkin(loan_id, now() + Duration::days(14)).unwrap();

        assert_eq!(fine, Decimal::ZERO);
        assert!(!service.borrower(1).unwrap().has_outstanding_fine());
    }

    #[test]
    fn test_checkin_errors() {
        let mut service = service(quiet());
        assert!(matches!(service.checkin(42, now()), Err(AppError::NotFound(_))));

        let loan_id = service.checkout(1, 1, now()).unwrap();
        service.checkin(loan_id, now()).unwrap();
        assert!(matches!(
            service.checkin(loan_id, now()),
            Err(AppError::AlreadyClosed(_))
        ));
        assert_eq!(service.item(1).unwrap().available_copies(), 3);
    }

    #[test]
    fn test_exhausted_loan_ids_leave_inventory_untouched() {
        let mut service = service(quiet());
        service.next_loan_id = i32::MAX;

        let result = service.checkout(1, 1, now());

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(service.item(1).unwrap().available_copies(), 3);
        assert_eq!(service.count_active(), 0);
    }

    #[test]
    fn test_registry_rejects_duplicates_and_invalid_input() {
        let mut service = service(quiet());

        let duplicate = service.add_item(NewItem {
            id: 1,
            title: "Another".to_string(),
            author: None,
            total_copies: 1,
        });
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        assert_eq!(service.item(1).unwrap().title(), "Clean Code");

        let empty = service.register_borrower(NewBorrower {
            id: 7,
            name: String::new(),
            category: BorrowerCategory::Faculty,
        });
        assert!(matches!(empty, Err(AppError::Validation(_))));
        assert!(service.borrower(7).is_err());
    }

    #[test]
    fn test_overdue_and_open_loans() {
        let mut service = service(quiet());
        let student_loan = service.checkout(1, 1, now()).unwrap();
        let standard_loan = service.checkout(3, 2, now()).unwrap();

        let later = now() + Duration::days(10);
        let overdue = service.overdue_loans(later).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, standard_loan);
        assert_eq!(overdue[0].item_title, "1984");
        assert!(overdue[0].is_overdue);

        let open: Vec<i32> = service.open_loans(1).unwrap().iter().map(|l| l.id()).collect();
        assert_eq!(open, vec![student_loan]);

        service.checkin(standard_loan, later).unwrap();
        assert!(service.overdue_loans(later).unwrap().is_empty());
        assert!(!service.loan_details(standard_loan, later).unwrap().is_overdue);
    }
}
