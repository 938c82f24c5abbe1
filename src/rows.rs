use std::sync::OnceLock;

use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use tracing::warn;

use crate::error::{ConvertError, Result};
use crate::models::{Cell, LedgerEntry};

/// Poalim action labels whose payee needs the instrument reference appended:
/// a credit-card bill payment and a check.
const POALIM_REFERENCE_ACTIONS: [&str; 2] = ["מסטרקרד", "שיק"];


// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Bind the leading cells of `row` to a fixed field layout. Missing cells and
/// NaN numbers are bound as `None`.
pub fn bind_fields<const N: usize>(row: &[Cell], layout: &[&'static str; N]) -> Result<[Option<Cell>; N]> {
    if row.len() < N {
        return Err(ConvertError::MalformedRow {
            expected: N,
            found: row.len(),
            missing: layout[row.len()],
        });
    }
    Ok(std::array::from_fn(|i| match &row[i] {
        Cell::Missing => None,
        Cell::Number(n) if n.is_nan() => None,
        cell => Some(cell.clone()),
    }))
}

fn text(cell: &Option<Cell>) -> String {
    cell.as_ref().map(|c| c.to_string()).unwrap_or_default()
}

fn present(cell: &Option<Cell>) -> Option<&Cell> {
    cell.as_ref().filter(|c| !c.is_blank())
}

/// Parse a numeric cell; text may carry thousands separators.
pub fn parse_number(field: &'static str, cell: &Cell) -> Result<f64> {
    let err = || ConvertError::FieldConversion {
        field,
        value: cell.to_string(),
    };
    match cell {
        Cell::Number(n) if !n.is_nan() => Ok(*n),
        Cell::Text(s) => s.trim().replace(',', "").parse().map_err(|_| err()),
        _ => Err(err()),
    }
}

fn negate(amount: f64) -> f64 {
    if amount == 0.0 {
        0.0
    } else {
        -amount
    }
}

fn parse_date_with(cell: &Cell, formats: &[&str]) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok()),
        _ => None,
    }
}

/// Parse an Isracard `DD/MM/YYYY` date cell.
pub fn parse_isracard_date(cell: &Cell) -> Option<NaiveDate> {
    parse_date_with(cell, &["%d/%m/%Y"])
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn installment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"תשלום\s*(\d+)\s*מתוך\s*(\d+)").expect("installment pattern is valid"))
}

/// Mobile payment services (PAYBOX, BIT) as whole words. Payments to the same
/// counterparty look identical, so the transaction id is appended to keep them
/// apart downstream.
fn mobile_payment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:PAYBOX|BIT)\b").expect("mobile payment pattern is valid"))
}

/// Installment number `N` of a "payment N of M" memo.
fn installment_number(memo: &str) -> Option<u32> {
    installment_re()
        .captures(memo)
        .and_then(|caps| caps[1].parse().ok())
}

/// Move an installment charge to the month it is actually billed in.
///
/// Months past December roll into the next year and the day is clamped to the
/// target month's length.
fn project_installment(date: NaiveDate, installment: u32) -> Result<NaiveDate> {
    if installment <= 1 {
        return Ok(date);
    }
    let projected = date
        .checked_add_months(Months::new(installment - 1))
        .ok_or_else(|| ConvertError::DateParse(date.format("%d/%m/%Y").to_string()))?;
    if projected.year() != date.year() || projected.day() != date.day() {
        warn!(
            from = %date,
            to = %projected,
            installment,
            "installment date rolled over month/year boundary"
        );
    }
    Ok(projected)
}

// ---------------------------------------------------------------------------
// Bank Hapoalim checking account
// ---------------------------------------------------------------------------

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct PoalimRow {
    pub date: Option<Cell>,
    pub action: Option<Cell>,
    pub details: Option<Cell>,
    pub reference: Option<Cell>,
    pub credit: Option<Cell>,
    pub debit: Option<Cell>,
    pub account_amount: Option<Cell>,
    pub date_value: Option<Cell>,
    pub beneficiary: Option<Cell>,
    pub purpose: Option<Cell>,
}

impl PoalimRow {
    pub const FIELDS: [&'static str; 10] = [
        "date",
        "action",
        "details",
        "reference",
        "credit",
        "debit",
        "account_amount",
        "date_value",
        "beneficiary",
        "for",
    ];

    pub fn from_cells(row: &[Cell]) -> Result<Self> {
        let [date, action, details, reference, credit, debit, account_amount, date_value, beneficiary, purpose] =
            bind_fields(row, &Self::FIELDS)?;
        Ok(Self {
            date,
            action,
            details,
            reference,
            credit,
            debit,
            account_amount,
            date_value,
            beneficiary,
            purpose,
        })
    }

    pub fn date(&self) -> Result<String> {
        self.date
            .as_ref()
            .and_then(|cell| parse_date_with(cell, &["%d.%m.%Y", "%d/%m/%Y"]))
            .map(iso)
            .ok_or_else(|| ConvertError::DateParse(text(&self.date)))
    }

    pub fn memo(&self) -> String {
        text(&self.details)
    }

    pub fn payee(&self) -> String {
        if let Some(beneficiary) = present(&self.beneficiary) {
            return beneficiary.to_string();
        }
        let action = text(&self.action);
        if POALIM_REFERENCE_ACTIONS.contains(&action.as_str()) {
            // reference holds the last 4 digits of the card or check being paid
            return format!("{action} {}", text(&self.reference));
        }
        action
    }

    /// Credits are negated, debits pass through unchanged.
    pub fn amount(&self) -> Result<f64> {
        let credit = present(&self.credit)
            .map(|c| parse_number("credit", c))
            .transpose()?;
        match credit {
            Some(credit) if credit != 0.0 => Ok(negate(credit)),
            _ => match present(&self.debit) {
                Some(debit) => parse_number("debit", debit),
                None => Err(ConvertError::FieldConversion {
                    field: "debit",
                    value: text(&self.debit),
                }),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Isracard credit card
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct IsracardRow {
    pub date: Option<Cell>,
    pub action: Option<Cell>,
    pub amount: Option<Cell>,
    pub memo: Option<Cell>,
    pub transaction_id: Option<Cell>,
}

impl IsracardRow {
    pub const FIELDS: [&'static str; 5] = ["date", "action", "amount", "memo", "transaction_id"];

    pub fn from_cells(row: &[Cell]) -> Result<Self> {
        let [date, action, amount, memo, transaction_id] = bind_fields(row, &Self::FIELDS)?;
        Ok(Self {
            date,
            action,
            amount,
            memo,
            transaction_id,
        })
    }

    /// Installment charges ("payment N of M") are dated N-1 months after the
    /// purchase.
    pub fn date(&self) -> Result<String> {
        let date = self
            .date
            .as_ref()
            .and_then(parse_isracard_date)
            .ok_or_else(|| ConvertError::DateParse(text(&self.date)))?;
        let date = match installment_number(&self.memo()) {
            Some(n) => project_installment(date, n)?,
            None => date,
        };
        Ok(iso(date))
    }

    pub fn memo(&self) -> String {
        text(&self.memo)
    }

    pub fn payee(&self) -> String {
        let action = text(&self.action);
        if mobile_payment_re().is_match(&action) {
            return format!("{action} {}", text(&self.transaction_id));
        }
        action
    }

    /// Isracard lists charges as positive numbers.
    pub fn amount(&self) -> Result<f64> {
        match &self.amount {
            Some(cell) => parse_number("amount", cell).map(negate),
            None => Err(ConvertError::FieldConversion {
                field: "amount",
                value: String::new(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Row variants — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StatementRow {
    Poalim(PoalimRow),
    Isracard(IsracardRow),
}

impl StatementRow {
    pub fn date(&self) -> Result<String> {
        match self {
            Self::Poalim(row) => row.date(),
            Self::Isracard(row) => row.date(),
        }
    }

    pub fn memo(&self) -> String {
        match self {
            Self::Poalim(row) => row.memo(),
            Self::Isracard(row) => row.memo(),
        }
    }

    pub fn payee(&self) -> String {
        match self {
            Self::Poalim(row) => row.payee(),
            Self::Isracard(row) => row.payee(),
        }
    }

    pub fn amount(&self) -> Result<f64> {
        match self {
            Self::Poalim(row) => row.amount(),
            Self::Isracard(row) => row.amount(),
        }
    }

    pub fn serialize(&self) -> Result<LedgerEntry> {
        Ok(LedgerEntry {
            date: self.date()?,
            payee: self.payee(),
            memo: self.memo(),
            amount: self.amount()?,
        })
    }
}
