//! Borrower model and borrowing categories

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;

/// Borrowing category. Fixed when the borrower is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowerCategory {
    Student,
    Faculty,
    Standard,
}

/// Borrowing rules attached to a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanPolicy {
    /// Maximum number of loans open at the same time
    pub loan_limit: usize,
    /// Days between checkout and due date
    pub grace_period_days: i64,
    /// Amount charged for each started day past the due date
    pub daily_fine_rate: Decimal,
}

impl BorrowerCategory {
    /// Rules table. This is the only place where categories are told apart.
    pub const fn policy(self) -> LoanPolicy {
        match self {
            BorrowerCategory::Student => LoanPolicy {
                loan_limit: 3,
                grace_period_days: 14,
                daily_fine_rate: Decimal::from_parts(50, 0, 0, false, 2),
            },
            BorrowerCategory::Faculty => LoanPolicy {
                loan_limit: 5,
                grace_period_days: 30,
                daily_fine_rate: Decimal::from_parts(30, 0, 0, false, 2),
            },
            BorrowerCategory::Standard => LoanPolicy {
                loan_limit: 2,
                grace_period_days: 7,
                daily_fine_rate: Decimal::from_parts(100, 0, 0, false, 2),
            },
        }
    }
}

impl FromStr for BorrowerCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(BorrowerCategory::Student),
            "faculty" => Ok(BorrowerCategory::Faculty),
            "standard" => Ok(BorrowerCategory::Standard),
            other => Err(AppError::Validation(format!(
                "unknown borrower category '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for BorrowerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BorrowerCategory::Student => "student",
            BorrowerCategory::Faculty => "faculty",
            BorrowerCategory::Standard => "standard",
        };
        f.write_str(label)
    }
}

/// A registered borrower and their running fine balance
#[derive(Debug, Clone, Serialize)]
pub struct Borrower {
    id: i32,
    name: String,
    category: BorrowerCategory,
    accumulated_fine: Decimal,
}

/// Register borrower request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBorrower {
    pub id: i32,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub category: BorrowerCategory,
}

impl Borrower {
    pub fn new(borrower: NewBorrower) -> Self {
        Self {
            id: borrower.id,
            name: borrower.name,
            category: borrower.category,
            accumulated_fine: Decimal::ZERO,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> BorrowerCategory {
        self.category
    }

    pub fn loan_limit(&self) -> usize {
        self.category.policy().loan_limit
    }

    pub fn grace_period_days(&self) -> i64 {
        self.category.policy().grace_period_days
    }

    pub fn daily_fine_rate(&self) -> Decimal {
        self.category.policy().daily_fine_rate
    }

    pub fn accumulated_fine(&self) -> Decimal {
        self.accumulated_fine
    }

    pub fn has_outstanding_fine(&self) -> bool {
        self.accumulated_fine > Decimal::ZERO
    }

    /// Add `amount` to the fine balance. Negative amounts are rejected.
    pub fn charge_fine(&mut self, amount: Decimal) -> Result<(), AppError> {
        if amount < Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "cannot charge a negative fine ({})",
                amount
            )));
        }
        self.accumulated_fine += amount;
        Ok(())
    }
}
