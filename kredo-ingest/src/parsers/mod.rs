//! Bank-specific statement parsers.
//!
//! Each bank contributes one `Schema` value; the pipeline itself is shared.
//! `Bank` is the registry key and `parser_for` the only dispatch point.

pub mod bcc;
pub mod eurasian;
pub mod halyk_business;
pub mod halyk_individual;
pub mod kaspi_pay;

use std::fmt;
use std::str::FromStr;

use kredo_core::{PageTokens, ParseError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::schema::Schema;
use crate::statement::{parse_statement, ParsedStatement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bank {
    KaspiPay,
    HalykBusiness,
    HalykIndividual,
    EurasianBank,
    BccBank,
}

impl Bank {
    /// Detection priority.
    pub const ALL: [Bank; 5] = [
        Bank::KaspiPay,
        Bank::HalykBusiness,
        Bank::HalykIndividual,
        Bank::EurasianBank,
        Bank::BccBank,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Bank::KaspiPay => "kaspi_pay",
            Bank::HalykBusiness => "halyk_business",
            Bank::HalykIndividual => "halyk_individual",
            Bank::EurasianBank => "eurasian_bank",
            Bank::BccBank => "bcc_bank",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Bank::KaspiPay => "Kaspi Pay",
            Bank::HalykBusiness => "Halyk Bank (business)",
            Bank::HalykIndividual => "Halyk Bank (individual)",
            Bank::EurasianBank => "Eurasian Bank",
            Bank::BccBank => "Bank CenterCredit",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Bank {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase().replace('-', "_");
        match key.as_str() {
            "kaspi_pay" | "kaspi" => Ok(Bank::KaspiPay),
            "halyk_business" => Ok(Bank::HalykBusiness),
            "halyk_individual" | "halyk_ind" => Ok(Bank::HalykIndividual),
            "eurasian_bank" | "eurasian" => Ok(Bank::EurasianBank),
            "bcc_bank" | "bcc" => Ok(Bank::BccBank),
            _ => Err(ParseError::UnknownBank(s.to_string())),
        }
    }
}

/// A statement parser for one bank layout.
pub trait StatementParser: Send + Sync {
    fn bank(&self) -> Bank;

    /// The built-in layout description.
    fn schema(&self) -> Schema;

    fn parse(&self, pages: &[PageTokens]) -> Result<ParsedStatement> {
        parse_with_schema(pages, self.schema())
    }
}

pub fn parser_for(bank: Bank) -> &'static dyn StatementParser {
    match bank {
        Bank::KaspiPay => &kaspi_pay::KaspiPayParser,
        Bank::HalykBusiness => &halyk_business::HalykBusinessParser,
        Bank::HalykIndividual => &halyk_individual::HalykIndividualParser,
        Bank::EurasianBank => &eurasian::EurasianParser,
        Bank::BccBank => &bcc::BccParser,
    }
}

/// Parse with an arbitrary (for example TOML-loaded) schema.
pub fn parse_with_schema(pages: &[PageTokens], schema: Schema) -> Result<ParsedStatement> {
    let compiled = schema.compile()?;
    parse_statement(pages, &compiled)
}

/// First bank, in `Bank::ALL` order, whose parser yields at least one
/// transaction.
pub fn detect_bank(pages: &[PageTokens]) -> Option<Bank> {
    Bank::ALL.into_iter().find(|&bank| match parser_for(bank).parse(pages) {
        Ok(statement) if !statement.is_empty() => true,
        Ok(_) => {
            debug!("{bank}: header found but no transactions");
            false
        }
        Err(e) => {
            debug!("{bank}: {e}");
            false
        }
    })
}
