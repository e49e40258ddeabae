//! Line commands understood by the circulation shell
//!
//! Each line is parsed into a [`Command`] and run against a
//! [`LendingService`]; results come back as JSON values.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::{BorrowerCategory, NewBorrower, NewItem},
    services::LendingService,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddItem(NewItemArgs),
    AddBorrower {
        id: i32,
        category: BorrowerCategory,
        name: String,
    },
    Checkout {
        borrower_id: i32,
        item_id: i32,
        at: Option<DateTime<Utc>>,
    },
    Checkin {
        loan_id: i32,
        at: Option<DateTime<Utc>>,
    },
    Loans {
        borrower_id: i32,
    },
    Overdue {
        at: Option<DateTime<Utc>>,
    },
    Stats,
    ShowItem(i32),
    ShowBorrower(i32),
    ShowLoan(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewItemArgs {
    pub id: i32,
    pub copies: u32,
    pub title: String,
    pub author: Option<String>,
}

fn parse_id(value: Option<&str>, what: &str) -> AppResult<i32> {
    let value = value.ok_or_else(|| AppError::Validation(format!("missing {}", what)))?;
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid {} '{}'", what, value)))
}

fn parse_at(value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| AppError::Validation(format!("invalid timestamp '{}': {}", v, e)))
        })
        .transpose()
}

fn rest<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.collect::<Vec<_>>().join(" ")
}

impl Command {
    /// Parse one shell line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> AppResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();

        let command = match verb.as_str() {
            "item" => {
                let id = parse_id(words.next(), "item id")?;
                let copies = words
                    .next()
                    .ok_or_else(|| AppError::Validation("missing copy count".into()))?;
                let copies: u32 = copies
                    .parse()
                    .map_err(|_| AppError::Validation(format!("invalid copy count '{}'", copies)))?;
                let text = rest(words);
                let (title, author) = match text.split_once('|') {
                    Some((title, author)) => (title.trim().to_string(), Some(author.trim().to_string())),
                    None => (text, None),
                };
                Command::AddItem(NewItemArgs {
                    id,
                    copies,
                    title,
                    author: author.filter(|a| !a.is_empty()),
                })
            }
            "borrower" => {
                let id = parse_id(words.next(), "borrower id")?;
                let category: BorrowerCategory = words
                    .next()
                    .ok_or_else(|| AppError::Validation("missing borrower category".into()))?
                    .parse()?;
                Command::AddBorrower {
                    id,
                    category,
                    name: rest(words),
                }
            }
            "checkout" => Command::Checkout {
                borrower_id: parse_id(words.next(), "borrower id")?,
                item_id: parse_id(words.next(), "item id")?,
                at: parse_at(words.next())?,
            },
            "checkin" => Command::Checkin {
                loan_id: parse_id(words.next(), "loan id")?,
                at: parse_at(words.next())?,
            },
            "loans" => Command::Loans {
                borrower_id: parse_id(words.next(), "borrower id")?,
            },
            "overdue" => Command::Overdue {
                at: parse_at(words.next())?,
            },
            "stats" => Command::Stats,
            "show" => match words.next() {
                Some("item") => Command::ShowItem(parse_id(words.next(), "item id")?),
                Some("borrower") => Command::ShowBorrower(parse_id(words.next(), "borrower id")?),
                Some("loan") => Command::ShowLoan(parse_id(words.next(), "loan id")?),
                other => {
                    return Err(AppError::Validation(format!(
                        "cannot show '{}'",
                        other.unwrap_or_default()
                    )))
                }
            },
            other => return Err(AppError::Validation(format!("unknown command '{}'", other))),
        };

        Ok(Some(command))
    }

    /// Run the command. `now` stands in for any timestamp the line omitted.
    pub fn execute(self, service: &mut LendingService, now: DateTime<Utc>) -> AppResult<Value> {
        match self {
            Command::AddItem(args) => to_json(service.add_item(NewItem {
                id: args.id,
                title: args.title,
                author: args.author,
                total_copies: args.copies,
            })?),
            Command::AddBorrower { id, category, name } => {
                to_json(service.register_borrower(NewBorrower { id, name, category })?)
            }
            Command::Checkout {
                borrower_id,
                item_id,
                at,
            } => {
                let at = at.unwrap_or(now);
                let loan_id = service.checkout(borrower_id, item_id, at)?;
                to_json(service.loan_details(loan_id, at)?)
            }
            Command::Checkin { loan_id, at } => {
                let at = at.unwrap_or(now);
                let fine = service.checkin(loan_id, at)?;
                let details = service.loan_details(loan_id, at)?;
                let balance = service.borrower(details.borrower_id)?.accumulated_fine();
                Ok(json!({
                    "loan": details,
                    "fine": fine,
                    "balance": balance,
                }))
            }
            Command::Loans { borrower_id } => {
                let ids: Vec<i32> = service
                    .open_loans(borrower_id)?
                    .iter()
                    .map(|loan| loan.id())
                    .collect();
                let loans = ids
                    .into_iter()
                    .map(|id| service.loan_details(id, now))
                    .collect::<AppResult<Vec<_>>>()?;
                to_json(loans)
            }
            Command::Overdue { at } => to_json(service.overdue_loans(at.unwrap_or(now))?),
            Command::Stats => Ok(json!({ "active_loans": service.count_active() })),
            Command::ShowItem(id) => to_json(service.item(id)?),
            Command::ShowBorrower(id) => {
                let borrower = service.borrower(id)?;
                Ok(json!({
                    "borrower": borrower,
                    "policy": borrower.category().policy(),
                    "open_loans": service.open_loans(id)?.len(),
                }))
            }
            Command::ShowLoan(id) => to_json(service.loan_details(id, now)?),
        }
    }
}

fn to_json<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(format!("serialization failed: {}", e)))
}

/// Drive the shell until `input` is exhausted.
///
/// Every line yields one JSON line on `output`, either a result or an
/// [`ErrorResponse`]. Bad lines, including ones that are not valid UTF-8,
/// never stop the loop; only I/O errors on the streams themselves do.
pub fn run_shell<R, W>(
    service: &mut LendingService,
    mut input: R,
    mut output: W,
    echo_commands: bool,
    clock: impl Fn() -> DateTime<Utc>,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);

        let result = match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => command.execute(service, clock()),
            Err(e) => Err(e),
        };

        if echo_commands {
            writeln!(output, "> {}", line.trim())?;
        }
        match result {
            Ok(value) => serde_json::to_writer(&mut output, &value)?,
            Err(e) => serde_json::to_writer(&mut output, &ErrorResponse::from(&e))?,
        }
        writeln!(output)?;
    }
}
