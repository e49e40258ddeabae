//! Data models for the circulation engine

pub mod borrower;
pub mod item;
pub mod loan;

// Re-export commonly used types
pub use borrower::{Borrower, BorrowerCategory, LoanPolicy, NewBorrower};
pub use item::{Item, NewItem};
pub use loan::{Loan, LoanDetails};
