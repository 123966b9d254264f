//! Use-case API for transport-facing callers.
//!
//! # Responsibility
//! - Expose one entry point per pack use-case over a configured store.
//! - Fold service outcomes into the `{code, success, msg}` envelope.
//!
//! # Invariants
//! - Entry points never panic; every failure is reported in the envelope.
//! - Each call opens its own store connection and drops it before returning.
//! - Success code is always `"10"`; uncoded failures use `"-1"`.

use log::warn;
use pack_core::db::open_db_with_timeout;
use pack_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, Currency, DbHealth,
    HealthService, HealthStatus, Mno, Pack, PackKeys, PackService, PackState, PackType, Resource,
    ServiceConfig, ServiceError, ServiceResult, SqlitePackRepository, StockPolicy, Term,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Code reported by every successful mutation.
pub const SUCCESS_CODE: &str = "10";
/// Code reported for failures that carry no stable error code.
pub const UNCODED_FAILURE: &str = "-1";

/// Expose core crate version.
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating a call with the same arguments is a no-op.
pub fn init_logging(level: &str, log_dir: Option<&str>) -> String {
    match init_logging_inner(level, log_dir.map(Path::new)) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Outcome envelope for mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub code: String,
    pub success: bool,
    pub msg: String,
    /// Id assigned by `create`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ActionResponse {
    fn ok() -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            success: true,
            msg: String::new(),
            id: None,
        }
    }

    fn created(id: String) -> Self {
        Self {
            id: Some(id),
            ..Self::ok()
        }
    }

    fn failure(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            success: false,
            msg: msg.into(),
            id: None,
        }
    }

    fn from_service_error(err: &ServiceError) -> Self {
        let code = err
            .code()
            .map(|code| code.as_str().to_string())
            .unwrap_or_else(|| UNCODED_FAILURE.to_string());
        Self::failure(code, err.to_string())
    }
}

/// Outcome envelope for queries. Absent records are a success with no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse<T> {
    pub success: bool,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> LookupResponse<T> {
    fn found(data: Option<T>) -> Self {
        Self {
            success: true,
            msg: String::new(),
            data,
        }
    }

    fn failure(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Mutation request, tagged by `op`.
///
/// Field names follow the pack wire format (`mnoid`, `productid`,
/// `packcode`, `desc`, `imgurl`, `kwds`, `type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PackCommand {
    Create {
        #[serde(default)]
        pack: Option<Pack>,
    },
    ChangeState {
        id: String,
        state: PackState,
    },
    ChangeProductId {
        id: String,
        #[serde(rename = "mnoid")]
        mno_id: i32,
        #[serde(rename = "productid")]
        product_id: String,
    },
    ChangePackCode {
        id: String,
        #[serde(rename = "mnoid")]
        mno_id: i32,
        #[serde(rename = "packcode")]
        pack_code: String,
    },
    ChangeName {
        id: String,
        name: String,
    },
    ChangeDescription {
        id: String,
        #[serde(rename = "desc")]
        description: String,
    },
    ChangeImage {
        id: String,
        #[serde(rename = "imgurl")]
        image_url: String,
    },
    ChangeKeywords {
        id: String,
        #[serde(rename = "kwds")]
        keywords: String,
    },
    ChangePrice {
        id: String,
        price: i64,
    },
    ChangeType {
        id: String,
        #[serde(rename = "type", default)]
        pack_type: Option<PackType>,
    },
    ChangeMno {
        id: String,
        #[serde(rename = "productid")]
        product_id: String,
        #[serde(rename = "packcode")]
        pack_code: String,
        #[serde(default)]
        mno: Option<Mno>,
    },
    ChangeValidity {
        id: String,
        #[serde(default)]
        term: Option<Term>,
    },
    ChangeCurrency {
        id: String,
        #[serde(default)]
        currency: Option<Currency>,
    },
    MoveStock {
        id: String,
        amount: i64,
    },
    UpdateResources {
        id: String,
        #[serde(default)]
        resources: Option<Vec<Resource>>,
    },
    DeleteResources {
        id: String,
    },
    Delete {
        id: String,
    },
}

impl PackCommand {
    /// Operation label used in logs.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::ChangeState { .. } => "change_state",
            Self::ChangeProductId { .. } => "change_product_id",
            Self::ChangePackCode { .. } => "change_pack_code",
            Self::ChangeName { .. } => "change_name",
            Self::ChangeDescription { .. } => "change_description",
            Self::ChangeImage { .. } => "change_image",
            Self::ChangeKeywords { .. } => "change_keywords",
            Self::ChangePrice { .. } => "change_price",
            Self::ChangeType { .. } => "change_type",
            Self::ChangeMno { .. } => "change_mno",
            Self::ChangeValidity { .. } => "change_validity",
            Self::ChangeCurrency { .. } => "change_currency",
            Self::MoveStock { .. } => "move_stock",
            Self::UpdateResources { .. } => "update_resources",
            Self::DeleteResources { .. } => "delete_resources",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Pack use-cases bound to one store location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackApi {
    store_path: PathBuf,
    busy_timeout: Duration,
    stock_policy: StockPolicy,
}

impl PackApi {
    pub fn new(store_path: impl Into<PathBuf>, busy_timeout: Duration, stock_policy: StockPolicy) -> Self {
        Self {
            store_path: store_path.into(),
            busy_timeout,
            stock_policy,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.store.path.clone(),
            config.store.busy_timeout(),
            config.stock.policy,
        )
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Reports service and store health. Never fails; an unreachable store
    /// shows up as an unhealthy `packstore` dependency.
    pub fn health(&self) -> HealthStatus {
        let conn = match open_db_with_timeout(&self.store_path, self.busy_timeout) {
            Ok(conn) => conn,
            Err(err) => return unreachable_store(err.to_string()),
        };
        match SqlitePackRepository::try_new(&conn) {
            Ok(repo) => HealthService::new(repo).health(),
            Err(err) => unreachable_store(err.to_string()),
        }
    }

    pub fn get_by_id(&self, id: &str) -> LookupResponse<Pack> {
        self.lookup("get_by_id", |service| service.get_by_id(id))
    }

    pub fn get_by_code(&self, pack_code: &str) -> LookupResponse<Pack> {
        self.lookup("get_by_code", |service| service.get_by_code(pack_code))
    }

    pub fn get_by_product_id(&self, product_id: &str) -> LookupResponse<Pack> {
        self.lookup("get_by_product_id", |service| {
            service.get_by_product_id(product_id)
        })
    }

    pub fn get_id_by_code(&self, pack_code: &str) -> LookupResponse<String> {
        self.lookup("get_id_by_code", |service| {
            service
                .get_id_by_code(pack_code)
                .map(|id| id.map(|value| value.to_string()))
        })
    }

    /// Answers whether `keys` collide with a stored pack.
    pub fn exists(&self, keys: &PackKeys) -> LookupResponse<bool> {
        self.lookup("pack_exists", |service| service.pack_exists(keys).map(Some))
    }

    /// Parses a JSON [`PackCommand`] and runs it.
    pub fn execute_json(&self, raw: &str) -> ActionResponse {
        match serde_json::from_str::<PackCommand>(raw) {
            Ok(command) => self.execute(command),
            Err(err) => {
                warn!(
                    "event=command_parse module=api status=rejected error={}",
                    err
                );
                ActionResponse::failure(UNCODED_FAILURE, format!("invalid command: {err}"))
            }
        }
    }

    /// Runs one mutation and folds its outcome into the envelope.
    pub fn execute(&self, command: PackCommand) -> ActionResponse {
        let op = command.op();
        let result = self.with_pack_service(|service| dispatch(service, command));

        match result {
            Ok(Ok(Some(id))) => ActionResponse::created(id),
            Ok(Ok(None)) => ActionResponse::ok(),
            Ok(Err(err)) => ActionResponse::from_service_error(&err),
            Err(message) => {
                ActionResponse::failure(UNCODED_FAILURE, format!("{op} failed: {message}"))
            }
        }
    }

    fn lookup<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&PackService<SqlitePackRepository<'_>>) -> ServiceResult<Option<T>>,
    ) -> LookupResponse<T> {
        match self.with_pack_service(f) {
            Ok(Ok(data)) => LookupResponse::found(data),
            Ok(Err(err)) => LookupResponse::failure(format!("{op} failed: {err}")),
            Err(message) => LookupResponse::failure(format!("{op} failed: {message}")),
        }
    }

    /// Opens the store, runs `f`, and closes the store again.
    ///
    /// The outer error is a store bootstrap failure.
    fn with_pack_service<T>(
        &self,
        f: impl FnOnce(&PackService<SqlitePackRepository<'_>>) -> T,
    ) -> Result<T, String> {
        let conn = open_db_with_timeout(&self.store_path, self.busy_timeout)
            .map_err(|err| format!("store open failed: {err}"))?;
        let repo = SqlitePackRepository::try_new(&conn)
            .map_err(|err| format!("store init failed: {err}"))?;
        let service = PackService::with_stock_policy(repo, self.stock_policy);
        Ok(f(&service))
    }
}

/// Runs `command`; `Some(id)` is returned only by `create`.
fn dispatch(
    service: &PackService<SqlitePackRepository<'_>>,
    command: PackCommand,
) -> ServiceResult<Option<String>> {
    let updated = match command {
        PackCommand::Create { pack } => {
            return service.create(pack).map(|id| Some(id.to_string()));
        }
        PackCommand::ChangeState { id, state } => service.change_state(&id, state),
        PackCommand::ChangeProductId {
            id,
            mno_id,
            product_id,
        } => service.change_product_id(&id, mno_id, &product_id),
        PackCommand::ChangePackCode {
            id,
            mno_id,
            pack_code,
        } => service.change_pack_code(&id, mno_id, &pack_code),
        PackCommand::ChangeName { id, name } => service.change_name(&id, &name),
        PackCommand::ChangeDescription { id, description } => {
            service.change_description(&id, &description)
        }
        PackCommand::ChangeImage { id, image_url } => service.change_image(&id, &image_url),
        PackCommand::ChangeKeywords { id, keywords } => service.change_keywords(&id, &keywords),
        PackCommand::ChangePrice { id, price } => service.change_price(&id, price),
        PackCommand::ChangeType { id, pack_type } => service.change_type(&id, pack_type.as_ref()),
        PackCommand::ChangeMno {
            id,
            product_id,
            pack_code,
            mno,
        } => service.change_mno(&id, &product_id, &pack_code, mno.as_ref()),
        PackCommand::ChangeValidity { id, term } => service.change_validity(&id, term.as_ref()),
        PackCommand::ChangeCurrency { id, currency } => {
            service.change_currency(&id, currency.as_ref())
        }
        PackCommand::MoveStock { id, amount } => service.move_stock(&id, amount),
        PackCommand::UpdateResources { id, resources } => {
            service.update_resources(&id, resources.as_deref())
        }
        PackCommand::DeleteResources { id } => service.delete_resources(&id),
        PackCommand::Delete { id } => service.delete(&id),
    };
    updated.map(|()| None)
}

fn unreachable_store(message: String) -> HealthStatus {
    let mut status = HealthStatus::new(pack_core::service::health_service::SERVICE_NAME, true);
    status.add_db(DbHealth {
        name: pack_core::service::health_service::STORE_NAME.to_string(),
        status: false,
        message,
    });
    status
}
