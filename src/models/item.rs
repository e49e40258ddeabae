//! Item (lendable catalog entry) model and related types

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// A catalog entry with a finite number of copies.
///
/// `available_copies` is kept within `0..=total_copies`; it only moves through
/// [`Item::checkout`] and [`Item::checkin`].
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    id: i32,
    title: String,
    author: Option<String>,
    total_copies: u32,
    available_copies: u32,
}

/// Create item request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewItem {
    pub id: i32,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub author: Option<String>,
    #[validate(range(min = 1, message = "an item needs at least one copy"))]
    pub total_copies: u32,
}

impl Item {
    pub fn new(item: NewItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            author: item.author,
            total_copies: item.total_copies,
            available_copies: item.total_copies,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn total_copies(&self) -> u32 {
        self.total_copies
    }

    pub fn available_copies(&self) -> u32 {
        self.available_copies
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Take one copy off the shelf. Returns `false` when none is left.
    pub fn checkout(&mut self) -> bool {
        if self.available_copies > 0 {
            self.available_copies -= 1;
            return true;
        }
        false
    }

    /// Put one copy back. Returns `false` when every copy is already on the shelf.
    pub fn checkin(&mut self) -> bool {
        if self.available_copies < self.total_copies {
            self.available_copies += 1;
            return true;
        }
        false
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.author {
            Some(author) => write!(f, "{} by {}", self.title, author)?,
            None => write!(f, "{}", self.title)?,
        }
        write!(
            f,
            " (available: {}/{})",
            self.available_copies, self.total_copies
        )
    }
}
