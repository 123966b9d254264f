//! Pack aggregate model.
//!
//! # Responsibility
//! - Define the canonical sellable pack record and its sub-entities.
//! - Own the shape checks used by create/update orchestration.
//!
//! # Invariants
//! - `id` is assigned once on creation and never reused.
//! - `(mno.id, product_id, pack_code)` forms the uniqueness tuple.
//! - `created_at` is written once; `updated_at` moves on every mutation.
//! - `resources` is replaced as a whole set, never patched item by item.

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a stored pack.
pub type PackId = Uuid;

/// State a pack is stamped with when creation succeeds.
pub const INITIAL_PACK_STATE: PackState = PackState::Active;

/// Sale state of a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", from = "i64")]
pub enum PackState {
    /// Not offered for sale.
    Inactive,
    /// Offered for sale.
    Active,
}

impl PackState {
    /// Decodes the numeric wire value.
    ///
    /// Unknown values fall back to `Active`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Inactive,
            _ => Self::Active,
        }
    }

    /// Numeric wire/storage value.
    pub fn code(self) -> i64 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }
}

impl Default for PackState {
    fn default() -> Self {
        Self::Inactive
    }
}

impl From<i64> for PackState {
    fn from(value: i64) -> Self {
        Self::from_code(value)
    }
}

impl From<PackState> for i64 {
    fn from(value: PackState) -> Self {
        value.code()
    }
}

/// Pack category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackType {
    pub id: i32,
    pub name: String,
}

/// Mobile network operator owning the pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mno {
    pub id: i32,
    pub name: String,
}

/// Currency the price is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: i32,
    pub name: String,
}

/// Validity window of a pack, e.g. 7 `day`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub unit_id: i32,
    pub unit: String,
    pub amount: i64,
}

/// One allowance bundled in a pack (data, voice, sms...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i32,
    pub name: String,
    pub units: String,
    pub amount: f32,
    #[serde(rename = "isfree")]
    pub is_free: bool,
}

/// Canonical pack record.
///
/// Serialized field names follow the public wire schema (`prodid`,
/// `packcode`, `desc`, ...), not the Rust field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    /// `None` until the store assigns an id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PackId>,
    #[serde(rename = "prodid")]
    pub product_id: String,
    #[serde(rename = "packcode")]
    pub pack_code: String,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "imgurl")]
    pub image_url: String,
    #[serde(rename = "kwds")]
    pub keywords: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(rename = "ownerid", default)]
    pub owner_id: i64,
    #[serde(rename = "type")]
    pub pack_type: Option<PackType>,
    pub mno: Option<Mno>,
    pub term: Option<Term>,
    pub currency: Option<Currency>,
    #[serde(default)]
    pub state: PackState,
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Unix epoch milliseconds.
    #[serde(rename = "created", default)]
    pub created_at: i64,
    /// Unix epoch milliseconds.
    #[serde(rename = "updated", default)]
    pub updated_at: i64,
}

impl Pack {
    /// Returns the operator id, if an operator is attached.
    pub fn mno_id(&self) -> Option<i32> {
        self.mno.as_ref().map(|mno| mno.id)
    }

    /// Builds the uniqueness probe for this pack.
    pub fn keys(&self) -> PackKeys {
        PackKeys {
            mno_id: self.mno_id().unwrap_or_default(),
            product_id: non_empty(&self.product_id),
            pack_code: non_empty(&self.pack_code),
        }
    }

    /// Checks every field required before a pack may be created.
    ///
    /// Basic text fields are checked before structured sub-entities, so the
    /// first failing group decides the returned code.
    pub fn validate_for_create(&self) -> Result<(), PackValidationError> {
        if self.product_id.is_empty() || self.pack_code.is_empty() || self.name.is_empty() {
            return Err(PackValidationError::new(
                ErrorCode::MissingIdentity,
                "product id, pack code and name are required",
            ));
        }
        if self.description.is_empty() || self.keywords.is_empty() || self.image_url.is_empty() {
            return Err(PackValidationError::new(
                ErrorCode::MissingDescriptive,
                "description, keywords and image url are required",
            ));
        }
        if self.price < 0 {
            return Err(PackValidationError::new(
                ErrorCode::MissingDescriptive,
                format!("price must not be negative, got {}", self.price),
            ));
        }
        if !self.pack_type.as_ref().is_some_and(PackType::is_valid) {
            return Err(PackValidationError::new(
                ErrorCode::InvalidType,
                "pack type must have id >= 1 and a name",
            ));
        }
        if !self.mno.as_ref().is_some_and(Mno::is_valid) {
            return Err(PackValidationError::new(
                ErrorCode::InvalidMno,
                "mno must have id >= 1 and a name",
            ));
        }
        if !self.term.as_ref().is_some_and(Term::is_valid) {
            return Err(PackValidationError::new(
                ErrorCode::InvalidTerm,
                "term must have unit id >= 1 and a unit",
            ));
        }
        Ok(())
    }
}

impl PackType {
    pub fn is_valid(&self) -> bool {
        self.id >= 1 && !self.name.is_empty()
    }
}

impl Mno {
    pub fn is_valid(&self) -> bool {
        self.id >= 1 && !self.name.is_empty()
    }
}

impl Currency {
    pub fn is_valid(&self) -> bool {
        self.id >= 1 && !self.name.is_empty()
    }
}

impl Term {
    pub fn is_valid(&self) -> bool {
        self.unit_id >= 1 && !self.unit.is_empty()
    }
}

/// Uniqueness probe: `mno_id` AND (`product_id` OR `pack_code`).
///
/// Only the keys that are `Some` take part in the OR branch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackKeys {
    #[serde(rename = "mnoid")]
    pub mno_id: i32,
    #[serde(rename = "productid", default)]
    pub product_id: Option<String>,
    #[serde(rename = "packcode", default)]
    pub pack_code: Option<String>,
}

impl PackKeys {
    pub fn by_product_id(mno_id: i32, product_id: impl Into<String>) -> Self {
        Self {
            mno_id,
            product_id: Some(product_id.into()),
            pack_code: None,
        }
    }

    pub fn by_pack_code(mno_id: i32, pack_code: impl Into<String>) -> Self {
        Self {
            mno_id,
            product_id: None,
            pack_code: Some(pack_code.into()),
        }
    }

    /// True when at least one of `product_id` / `pack_code` is non-empty.
    pub fn has_business_key(&self) -> bool {
        self.product_id.as_deref().is_some_and(|value| !value.is_empty())
            || self.pack_code.as_deref().is_some_and(|value| !value.is_empty())
    }
}

/// Shape violation on pack input, tagged with its stable code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackValidationError {
    pub code: ErrorCode,
    pub message: String,
}

impl PackValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for PackValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for PackValidationError {}

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{PackKeys, PackState};

    #[test]
    fn unknown_state_code_decodes_as_active() {
        assert_eq!(PackState::from_code(0), PackState::Inactive);
        assert_eq!(PackState::from_code(1), PackState::Active);
        assert_eq!(PackState::from_code(7), PackState::Active);
        assert_eq!(PackState::from_code(-1), PackState::Active);
    }

    #[test]
    fn keys_without_business_values_are_detected() {
        assert!(!PackKeys::default().has_business_key());
        assert!(!PackKeys {
            mno_id: 1,
            product_id: Some(String::new()),
            pack_code: None,
        }
        .has_business_key());
        assert!(PackKeys::by_pack_code(1, "CODE").has_business_key());
    }
}
