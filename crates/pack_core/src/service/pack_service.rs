//! Pack use-case service.
//!
//! # Responsibility
//! - Validate create/update/delete input and resolve uniqueness conflicts
//!   before delegating to the repository.
//! - Translate repository failures into tagged, code-carrying errors.
//!
//! # Invariants
//! - Validation failures never reach the repository.
//! - Product id, pack code and operator changes re-run the uniqueness probe;
//!   other field changes do not.
//! - A unique-index rejection from the store maps to the same conflict code
//!   as the pre-check.

use crate::error::ErrorCode;
use crate::model::pack::{
    now_epoch_ms, Currency, Mno, Pack, PackId, PackKeys, PackState, PackType,
    PackValidationError, Resource, Term, INITIAL_PACK_STATE,
};
use crate::repo::pack_repo::{FieldChange, PackRepository, RepoError};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// What a stock move may do to a balance that would drop below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Negative balances are stored as-is.
    #[default]
    Allow,
    /// The move is refused with `ErrorCode::NegativeStock`.
    Reject,
    /// The balance floors at zero.
    Clamp,
}

/// Service error for pack use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed or missing input. Never retried.
    Validation(PackValidationError),
    /// Another pack already owns the requested keys.
    Conflict { code: ErrorCode, keys: PackKeys },
    /// The uniqueness probe itself failed.
    ExistenceCheck(RepoError),
    /// Target pack does not exist.
    NotFound(PackId),
    /// Store failure, with the operation and pack it happened on.
    Repo {
        operation: &'static str,
        id: Option<PackId>,
        source: RepoError,
    },
}

impl ServiceError {
    /// Stable code for coded failures; `None` for store and lookup failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Validation(err) => Some(err.code),
            Self::Conflict { code, .. } => Some(*code),
            Self::ExistenceCheck(_) => Some(ErrorCode::ExistenceCheckFailed),
            Self::NotFound(_) | Self::Repo { .. } => None,
        }
    }

    fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation(PackValidationError::new(code, message))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict { code, keys } => write!(
                f,
                "[{code}] pack already exists for mno {} (product id {:?}, pack code {:?})",
                keys.mno_id, keys.product_id, keys.pack_code
            ),
            Self::ExistenceCheck(err) => write!(
                f,
                "[{}] existing pack cannot be validated: {err}",
                ErrorCode::ExistenceCheckFailed
            ),
            Self::NotFound(id) => write!(f, "pack not found: {id}"),
            Self::Repo {
                operation,
                id: Some(id),
                source,
            } => write!(f, "{operation} failed for pack {id}: {source}"),
            Self::Repo {
                operation,
                id: None,
                source,
            } => write!(f, "{operation} failed: {source}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ExistenceCheck(err) => Some(err),
            Self::Repo { source, .. } => Some(source),
            Self::Conflict { .. } | Self::NotFound(_) => None,
        }
    }
}

impl From<PackValidationError> for ServiceError {
    fn from(value: PackValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Pack service facade over a repository implementation.
pub struct PackService<R: PackRepository> {
    repo: R,
    stock_policy: StockPolicy,
}

impl<R: PackRepository> PackService<R> {
    /// Creates a service with the permissive stock policy.
    pub fn new(repo: R) -> Self {
        Self::with_stock_policy(repo, StockPolicy::default())
    }

    pub fn with_stock_policy(repo: R, stock_policy: StockPolicy) -> Self {
        Self { repo, stock_policy }
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    /// Read access to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Finds a pack by id. Empty or malformed ids are simply absent.
    pub fn get_by_id(&self, id: &str) -> ServiceResult<Option<Pack>> {
        let Ok(pack_id) = Uuid::parse_str(id.trim()) else {
            return Ok(None);
        };
        self.repo
            .get_by_id(pack_id)
            .map_err(|err| self.store_failure("get_by_id", Some(pack_id), err))
    }

    pub fn get_by_code(&self, pack_code: &str) -> ServiceResult<Option<Pack>> {
        if pack_code.is_empty() {
            return Ok(None);
        }
        self.repo
            .get_by_code(pack_code)
            .map_err(|err| self.store_failure("get_by_code", None, err))
    }

    pub fn get_by_product_id(&self, product_id: &str) -> ServiceResult<Option<Pack>> {
        if product_id.is_empty() {
            return Ok(None);
        }
        self.repo
            .get_by_product_id(product_id)
            .map_err(|err| self.store_failure("get_by_product_id", None, err))
    }

    pub fn get_id_by_code(&self, pack_code: &str) -> ServiceResult<Option<PackId>> {
        if pack_code.is_empty() {
            return Ok(None);
        }
        self.repo
            .get_id_by_code(pack_code)
            .map_err(|err| self.store_failure("get_id_by_code", None, err))
    }

    /// Answers whether `keys` collide with a stored pack.
    ///
    /// Probes without an operator or without any business key are `false`
    /// and never reach the store.
    pub fn pack_exists(&self, keys: &PackKeys) -> ServiceResult<bool> {
        if keys.mno_id < 1 || !keys.has_business_key() {
            return Ok(false);
        }
        self.repo
            .exists(keys)
            .map_err(|err| self.store_failure("pack_exists", None, err))
    }

    /// Creates a pack after shape and uniqueness checks.
    ///
    /// # Contract
    /// - `None` fails with `MissingPack`.
    /// - On success the pack is stored with `INITIAL_PACK_STATE`, zero stock
    ///   and both timestamps set to now; the assigned id is returned.
    /// - Stock only changes afterwards through [`Self::move_stock`].
    pub fn create(&self, pack: Option<Pack>) -> ServiceResult<PackId> {
        let Some(mut pack) = pack else {
            return Err(ServiceError::invalid(
                ErrorCode::MissingPack,
                "pack data is required",
            ));
        };
        pack.validate_for_create()?;

        let keys = pack.keys();
        self.ensure_unique(&keys, ErrorCode::PackExists)?;

        let now = now_epoch_ms();
        pack.id = None;
        pack.state = INITIAL_PACK_STATE;
        pack.stock = 0;
        pack.created_at = now;
        pack.updated_at = now;

        self.repo.insert(&pack).map_err(|err| match err {
            RepoError::DuplicateKey(_) => self.conflict(ErrorCode::PackExists, keys),
            other => self.store_failure("create", None, other),
        })
    }

    pub fn change_state(&self, id: &str, state: PackState) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidStateChange)?;
        self.apply("change_state", pack_id, FieldChange::State(state), None)
    }

    /// Replaces the operator product id, unique per operator.
    pub fn change_product_id(
        &self,
        id: &str,
        mno_id: i32,
        product_id: &str,
    ) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidProductIdChange)?;
        require_text(product_id, ErrorCode::InvalidProductIdChange, "product id")?;

        self.ensure_unique(
            &PackKeys::by_product_id(mno_id, product_id),
            ErrorCode::ProductIdExists,
        )?;
        self.apply(
            "change_product_id",
            pack_id,
            FieldChange::ProductId(product_id.to_string()),
            Some((ErrorCode::ProductIdExists, PackKeys::by_product_id(mno_id, product_id))),
        )
    }

    /// Replaces the short pack code, unique per operator.
    pub fn change_pack_code(&self, id: &str, mno_id: i32, pack_code: &str) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidPackCodeChange)?;
        require_text(pack_code, ErrorCode::InvalidPackCodeChange, "pack code")?;

        self.ensure_unique(
            &PackKeys::by_pack_code(mno_id, pack_code),
            ErrorCode::PackCodeExists,
        )?;
        self.apply(
            "change_pack_code",
            pack_id,
            FieldChange::PackCode(pack_code.to_string()),
            Some((ErrorCode::PackCodeExists, PackKeys::by_pack_code(mno_id, pack_code))),
        )
    }

    pub fn change_name(&self, id: &str, name: &str) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidNameChange)?;
        require_text(name, ErrorCode::InvalidNameChange, "name")?;
        self.apply("change_name", pack_id, FieldChange::Name(name.to_string()), None)
    }

    pub fn change_description(&self, id: &str, description: &str) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidDescriptionChange)?;
        require_text(description, ErrorCode::InvalidDescriptionChange, "description")?;
        self.apply(
            "change_description",
            pack_id,
            FieldChange::Description(description.to_string()),
            None,
        )
    }

    pub fn change_image(&self, id: &str, image_url: &str) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidImageChange)?;
        require_text(image_url, ErrorCode::InvalidImageChange, "image url")?;
        self.apply(
            "change_image",
            pack_id,
            FieldChange::ImageUrl(image_url.to_string()),
            None,
        )
    }

    pub fn change_keywords(&self, id: &str, keywords: &str) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidKeywordsChange)?;
        require_text(keywords, ErrorCode::InvalidKeywordsChange, "keywords")?;
        self.apply(
            "change_keywords",
            pack_id,
            FieldChange::Keywords(keywords.to_string()),
            None,
        )
    }

    pub fn change_price(&self, id: &str, price: i64) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidPriceChange)?;
        if price < 0 {
            return Err(ServiceError::invalid(
                ErrorCode::InvalidPriceChange,
                format!("price must not be negative, got {price}"),
            ));
        }
        self.apply("change_price", pack_id, FieldChange::Price(price), None)
    }

    pub fn change_type(&self, id: &str, pack_type: Option<&PackType>) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidTypeChange)?;
        let pack_type = pack_type.filter(|value| value.is_valid()).ok_or_else(|| {
            ServiceError::invalid(
                ErrorCode::InvalidTypeChange,
                "pack type must have id >= 1 and a name",
            )
        })?;
        self.apply(
            "change_type",
            pack_id,
            FieldChange::Type(pack_type.clone()),
            None,
        )
    }

    /// Moves a pack to another operator.
    ///
    /// The pack's current product id and pack code must stay unique under
    /// the new operator.
    pub fn change_mno(
        &self,
        id: &str,
        product_id: &str,
        pack_code: &str,
        mno: Option<&Mno>,
    ) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidMnoChange)?;
        let mno = mno
            .filter(|value| value.is_valid())
            .filter(|_| !product_id.is_empty() && !pack_code.is_empty())
            .ok_or_else(|| {
                ServiceError::invalid(
                    ErrorCode::InvalidMnoChange,
                    "product id, pack code and a mno with id >= 1 and a name are required",
                )
            })?;

        let keys = PackKeys {
            mno_id: mno.id,
            product_id: Some(product_id.to_string()),
            pack_code: Some(pack_code.to_string()),
        };
        self.ensure_unique(&keys, ErrorCode::PackExists)?;
        self.apply(
            "change_mno",
            pack_id,
            FieldChange::Mno(mno.clone()),
            Some((ErrorCode::PackExists, keys)),
        )
    }

    pub fn change_validity(&self, id: &str, term: Option<&Term>) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidValidityChange)?;
        let term = term.filter(|value| value.is_valid()).ok_or_else(|| {
            ServiceError::invalid(
                ErrorCode::InvalidValidityChange,
                "term must have unit id >= 1 and a unit",
            )
        })?;
        self.apply("change_validity", pack_id, FieldChange::Term(term.clone()), None)
    }

    pub fn change_currency(&self, id: &str, currency: Option<&Currency>) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidCurrencyChange)?;
        let currency = currency.filter(|value| value.is_valid()).ok_or_else(|| {
            ServiceError::invalid(
                ErrorCode::InvalidCurrencyChange,
                "currency must have id >= 1 and a name",
            )
        })?;
        self.apply(
            "change_currency",
            pack_id,
            FieldChange::Currency(currency.clone()),
            None,
        )
    }

    /// Adds `amount` to stock; negative amounts take stock away.
    ///
    /// Behavior below zero follows the configured [`StockPolicy`]. A move
    /// whose result does not fit the stock counter fails with
    /// `InvalidStockMove` and leaves the pack untouched.
    pub fn move_stock(&self, id: &str, amount: i64) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidStockMove)?;
        if amount == 0 {
            return Err(ServiceError::invalid(
                ErrorCode::InvalidStockMove,
                "stock amount must not be zero",
            ));
        }

        let current = self
            .repo
            .get_by_id(pack_id)
            .map_err(|err| self.store_failure("move_stock", Some(pack_id), err))?
            .ok_or(ServiceError::NotFound(pack_id))?
            .stock;
        let Some(target) = current.checked_add(amount) else {
            return Err(self.stock_out_of_range(pack_id, current, amount));
        };

        let delta = match self.stock_policy {
            StockPolicy::Allow => amount,
            _ if target >= 0 => amount,
            StockPolicy::Reject => {
                warn!(
                    "event=stock_move module=service status=rejected pack_id={} stock={} amount={}",
                    pack_id, current, amount
                );
                return Err(ServiceError::invalid(
                    ErrorCode::NegativeStock,
                    format!("stock {current} cannot move by {amount}"),
                ));
            }
            StockPolicy::Clamp => current
                .checked_neg()
                .ok_or_else(|| self.stock_out_of_range(pack_id, current, amount))?,
        };

        self.apply("move_stock", pack_id, FieldChange::StockDelta(delta), None)
    }

    /// Replaces the whole resource list; `None` is rejected, `Some(&[])`
    /// clears it.
    pub fn update_resources(&self, id: &str, resources: Option<&[Resource]>) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidResourcesUpdate)?;
        let resources = resources.ok_or_else(|| {
            ServiceError::invalid(
                ErrorCode::InvalidResourcesUpdate,
                "resource list is required",
            )
        })?;
        self.apply(
            "update_resources",
            pack_id,
            FieldChange::Resources(resources.to_vec()),
            None,
        )
    }

    pub fn delete_resources(&self, id: &str) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidResourcesDelete)?;
        self.apply(
            "delete_resources",
            pack_id,
            FieldChange::Resources(Vec::new()),
            None,
        )
    }

    /// Hard-deletes a pack.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        let pack_id = require_id(id, ErrorCode::InvalidDelete)?;
        self.repo.remove(pack_id).map_err(|err| match err {
            RepoError::NotFound(missing) => ServiceError::NotFound(missing),
            other => self.store_failure("delete", Some(pack_id), other),
        })
    }

    fn ensure_unique(&self, keys: &PackKeys, conflict: ErrorCode) -> ServiceResult<()> {
        match self.repo.exists(keys) {
            Ok(false) => Ok(()),
            Ok(true) => Err(self.conflict(conflict, keys.clone())),
            Err(err) => {
                error!(
                    "event=pack_exists module=service status=error mno_id={} error_code={} error={}",
                    keys.mno_id,
                    ErrorCode::ExistenceCheckFailed,
                    err
                );
                Err(ServiceError::ExistenceCheck(err))
            }
        }
    }

    fn apply(
        &self,
        operation: &'static str,
        pack_id: PackId,
        change: FieldChange,
        on_duplicate: Option<(ErrorCode, PackKeys)>,
    ) -> ServiceResult<()> {
        match self.repo.update_field(pack_id, &change) {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound(missing)) => Err(ServiceError::NotFound(missing)),
            Err(RepoError::DuplicateKey(details)) => match on_duplicate {
                Some((code, keys)) => Err(self.conflict(code, keys)),
                None => Err(self.store_failure(
                    operation,
                    Some(pack_id),
                    RepoError::DuplicateKey(details),
                )),
            },
            Err(other) => Err(self.store_failure(operation, Some(pack_id), other)),
        }
    }

    fn stock_out_of_range(&self, pack_id: PackId, current: i64, amount: i64) -> ServiceError {
        warn!(
            "event=stock_move module=service status=rejected reason=overflow pack_id={} stock={} amount={}",
            pack_id, current, amount
        );
        ServiceError::invalid(
            ErrorCode::InvalidStockMove,
            format!("stock {current} cannot move by {amount} without overflow"),
        )
    }

    fn conflict(&self, code: ErrorCode, keys: PackKeys) -> ServiceError {
        warn!(
            "event=pack_conflict module=service status=rejected error_code={} mno_id={}",
            code, keys.mno_id
        );
        ServiceError::Conflict { code, keys }
    }

    fn store_failure(
        &self,
        operation: &'static str,
        id: Option<PackId>,
        source: RepoError,
    ) -> ServiceError {
        error!(
            "event={} module=service status=error pack_id={} error={}",
            operation,
            id.map(|value| value.to_string()).unwrap_or_default(),
            source
        );
        ServiceError::Repo {
            operation,
            id,
            source,
        }
    }
}

fn require_id(id: &str, code: ErrorCode) -> ServiceResult<PackId> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid(code, "pack id is required"));
    }
    Uuid::parse_str(trimmed)
        .map_err(|_| ServiceError::invalid(code, format!("pack id `{trimmed}` is not valid")))
}

fn require_text(value: &str, code: ErrorCode, field: &str) -> ServiceResult<()> {
    if value.is_empty() {
        return Err(ServiceError::invalid(code, format!("{field} is required")));
    }
    Ok(())
}
