//! Stable error codes shared by orchestration and transport layers.
//!
//! # Invariants
//! - Code strings are wire-visible identifiers; existing values never change
//!   meaning once published.

use std::fmt::{Display, Formatter};

/// Stable discriminating code for a rejected pack operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Create called without a pack.
    MissingPack,
    /// Product id, pack code or name missing.
    MissingIdentity,
    /// Description, keywords or image url missing, or a negative price.
    MissingDescriptive,
    InvalidType,
    InvalidMno,
    InvalidTerm,
    /// Uniqueness probe could not be executed.
    ExistenceCheckFailed,
    /// Another pack already holds `mno_id` + (product id or pack code).
    PackExists,
    InvalidStateChange,
    InvalidProductIdChange,
    ProductIdExists,
    InvalidPackCodeChange,
    PackCodeExists,
    InvalidNameChange,
    InvalidDescriptionChange,
    InvalidImageChange,
    InvalidKeywordsChange,
    InvalidPriceChange,
    InvalidTypeChange,
    InvalidMnoChange,
    InvalidValidityChange,
    InvalidCurrencyChange,
    InvalidDelete,
    InvalidStockMove,
    InvalidResourcesUpdate,
    InvalidResourcesDelete,
    /// Stock move would leave a negative balance under the reject policy.
    NegativeStock,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingPack => "00",
            Self::MissingIdentity => "01",
            Self::MissingDescriptive => "02",
            Self::InvalidType => "03",
            Self::InvalidMno => "04",
            Self::InvalidTerm => "05",
            Self::ExistenceCheckFailed => "06",
            Self::PackExists => "07",
            Self::InvalidStateChange => "08",
            Self::InvalidProductIdChange => "09",
            Self::ProductIdExists => "10",
            Self::InvalidPackCodeChange => "11",
            Self::PackCodeExists => "12",
            Self::InvalidNameChange => "13",
            Self::InvalidDescriptionChange => "14",
            Self::InvalidImageChange => "15",
            Self::InvalidKeywordsChange => "16",
            Self::InvalidPriceChange => "17",
            Self::InvalidTypeChange => "18",
            Self::InvalidMnoChange => "19",
            Self::InvalidValidityChange => "20",
            Self::InvalidCurrencyChange => "21",
            Self::InvalidDelete => "22",
            Self::InvalidStockMove => "23",
            Self::InvalidResourcesUpdate => "24",
            Self::InvalidResourcesDelete => "25",
            Self::NegativeStock => "26",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
