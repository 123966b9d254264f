//! Pack repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide point lookups, point updates and the uniqueness predicate over
//!   the `packs` store.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - No business validation happens here; callers own input rules.
//! - Absent rows are `Ok(None)` on reads and `NotFound` on writes.
//! - Every write through `update_field` stamps `updated_at`, stock moves
//!   included.
//! - Unique-index violations surface as `RepoError::DuplicateKey`.

use crate::db::DbError;
use crate::model::pack::{
    now_epoch_ms, Currency, Mno, Pack, PackId, PackKeys, PackState, PackType, Resource, Term,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PACK_SELECT_SQL: &str = "SELECT
    id,
    product_id,
    pack_code,
    name,
    description,
    image_url,
    keywords,
    price,
    stock,
    owner_id,
    type_id,
    type_name,
    mno_id,
    mno_name,
    term_unit_id,
    term_unit,
    term_amount,
    currency_id,
    currency_name,
    state,
    resources,
    created_at,
    updated_at
FROM packs";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for pack persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(PackId),
    /// A unique index on `(mno_id, product_id)` or `(mno_id, pack_code)`
    /// rejected the write.
    DuplicateKey(String),
    /// Existence probe carried neither product id nor pack code.
    InvalidProbe,
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "pack not found: {id}"),
            Self::DuplicateKey(details) => write!(f, "duplicate pack key: {details}"),
            Self::InvalidProbe => {
                write!(f, "existence probe needs a product id or a pack code")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted pack data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_unique_violation(&value) {
            return Self::DuplicateKey(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Single-field write applied by [`PackRepository::update_field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    State(PackState),
    ProductId(String),
    PackCode(String),
    Name(String),
    Description(String),
    ImageUrl(String),
    Keywords(String),
    Price(i64),
    Type(PackType),
    Mno(Mno),
    Term(Term),
    Currency(Currency),
    /// Wholesale replacement; an empty list clears every resource.
    Resources(Vec<Resource>),
    /// Relative stock increment; negative values decrease stock.
    StockDelta(i64),
}

impl FieldChange {
    /// Short field label used in logs and error context.
    pub fn field(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::ProductId(_) => "product_id",
            Self::PackCode(_) => "pack_code",
            Self::Name(_) => "name",
            Self::Description(_) => "description",
            Self::ImageUrl(_) => "image_url",
            Self::Keywords(_) => "keywords",
            Self::Price(_) => "price",
            Self::Type(_) => "type",
            Self::Mno(_) => "mno",
            Self::Term(_) => "term",
            Self::Currency(_) => "currency",
            Self::Resources(_) => "resources",
            Self::StockDelta(_) => "stock",
        }
    }
}

/// Store statistics gathered by the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub pack_count: u64,
    pub schema_version: u32,
}

/// Storage-agnostic persistence contract for packs.
pub trait PackRepository {
    fn get_by_id(&self, id: PackId) -> RepoResult<Option<Pack>>;
    fn get_by_code(&self, pack_code: &str) -> RepoResult<Option<Pack>>;
    fn get_by_product_id(&self, product_id: &str) -> RepoResult<Option<Pack>>;
    fn get_id_by_code(&self, pack_code: &str) -> RepoResult<Option<PackId>>;
    /// `mno_id` AND (`product_id` OR `pack_code`), over the keys supplied.
    fn exists(&self, keys: &PackKeys) -> RepoResult<bool>;
    /// Persists `pack`, assigning a fresh id when `pack.id` is `None`.
    fn insert(&self, pack: &Pack) -> RepoResult<PackId>;
    fn update_field(&self, id: PackId, change: &FieldChange) -> RepoResult<()>;
    fn remove(&self, id: PackId) -> RepoResult<()>;
    /// Liveness probe: round-trip plus a lightweight metadata query.
    fn ping(&self) -> RepoResult<StoreStats>;
}

/// SQLite-backed pack repository borrowing one store connection.
pub struct SqlitePackRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePackRepository<'conn> {
    /// Wraps `conn` after checking the `packs` table is present.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "packs")? {
            return Err(RepoError::MissingRequiredTable("packs"));
        }
        Ok(Self { conn })
    }

    fn find_one(&self, column: &'static str, value: &str) -> RepoResult<Option<Pack>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PACK_SELECT_SQL} WHERE {column} = ?1 LIMIT 1;"))?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_pack_row(row)?)),
            None => Ok(None),
        }
    }
}

impl PackRepository for SqlitePackRepository<'_> {
    fn get_by_id(&self, id: PackId) -> RepoResult<Option<Pack>> {
        self.find_one("id", &id.to_string())
    }

    fn get_by_code(&self, pack_code: &str) -> RepoResult<Option<Pack>> {
        self.find_one("pack_code", pack_code)
    }

    fn get_by_product_id(&self, product_id: &str) -> RepoResult<Option<Pack>> {
        self.find_one("product_id", product_id)
    }

    fn get_id_by_code(&self, pack_code: &str) -> RepoResult<Option<PackId>> {
        let id_text: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM packs WHERE pack_code = ?1 LIMIT 1;",
                [pack_code],
                |row| row.get(0),
            )
            .optional()?;
        id_text.as_deref().map(parse_pack_id).transpose()
    }

    fn exists(&self, keys: &PackKeys) -> RepoResult<bool> {
        let mut any_of = Vec::new();
        let mut bind_values = vec![Value::Integer(i64::from(keys.mno_id))];

        if let Some(product_id) = keys.product_id.as_deref().filter(|v| !v.is_empty()) {
            any_of.push("product_id = ?");
            bind_values.push(Value::Text(product_id.to_string()));
        }
        if let Some(pack_code) = keys.pack_code.as_deref().filter(|v| !v.is_empty()) {
            any_of.push("pack_code = ?");
            bind_values.push(Value::Text(pack_code.to_string()));
        }
        if any_of.is_empty() {
            return Err(RepoError::InvalidProbe);
        }

        let sql = format!(
            "SELECT EXISTS(
                SELECT 1
                FROM packs
                WHERE mno_id = ? AND ({})
            );",
            any_of.join(" OR ")
        );
        let exists: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        Ok(exists == 1)
    }

    fn insert(&self, pack: &Pack) -> RepoResult<PackId> {
        let id = pack.id.unwrap_or_else(Uuid::new_v4);
        let resources = encode_resources(&pack.resources)?;

        self.conn.execute(
            "INSERT INTO packs (
                id,
                product_id,
                pack_code,
                name,
                description,
                image_url,
                keywords,
                price,
                stock,
                owner_id,
                type_id,
                type_name,
                mno_id,
                mno_name,
                term_unit_id,
                term_unit,
                term_amount,
                currency_id,
                currency_name,
                state,
                resources,
                created_at,
                updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23
            );",
            params![
                id.to_string(),
                pack.product_id.as_str(),
                pack.pack_code.as_str(),
                pack.name.as_str(),
                pack.description.as_str(),
                pack.image_url.as_str(),
                pack.keywords.as_str(),
                pack.price,
                pack.stock,
                pack.owner_id,
                pack.pack_type.as_ref().map(|t| t.id),
                pack.pack_type.as_ref().map(|t| t.name.as_str()),
                pack.mno.as_ref().map(|m| m.id),
                pack.mno.as_ref().map(|m| m.name.as_str()),
                pack.term.as_ref().map(|t| t.unit_id),
                pack.term.as_ref().map(|t| t.unit.as_str()),
                pack.term.as_ref().map(|t| t.amount),
                pack.currency.as_ref().map(|c| c.id),
                pack.currency.as_ref().map(|c| c.name.as_str()),
                pack.state.code(),
                resources,
                pack.created_at,
                pack.updated_at,
            ],
        )?;

        Ok(id)
    }

    fn update_field(&self, id: PackId, change: &FieldChange) -> RepoResult<()> {
        let (assignments, mut bind_values) = change_to_sql(change)?;
        bind_values.push(Value::Integer(now_epoch_ms()));
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE packs
             SET {assignments}, updated_at = ?
             WHERE id = ?;"
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn remove(&self, id: PackId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM packs WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn ping(&self) -> RepoResult<StoreStats> {
        self.conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
        let pack_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM packs;", [], |row| row.get(0))?;
        let schema_version = crate::db::migrations::schema_version(self.conn)?;
        Ok(StoreStats {
            pack_count: u64::try_from(pack_count).unwrap_or_default(),
            schema_version,
        })
    }
}

fn change_to_sql(change: &FieldChange) -> RepoResult<(String, Vec<Value>)> {
    let (assignments, values) = match change {
        FieldChange::State(state) => ("state = ?", vec![int(state.code())]),
        FieldChange::ProductId(value) => ("product_id = ?", vec![text(value)]),
        FieldChange::PackCode(value) => ("pack_code = ?", vec![text(value)]),
        FieldChange::Name(value) => ("name = ?", vec![text(value)]),
        FieldChange::Description(value) => ("description = ?", vec![text(value)]),
        FieldChange::ImageUrl(value) => ("image_url = ?", vec![text(value)]),
        FieldChange::Keywords(value) => ("keywords = ?", vec![text(value)]),
        FieldChange::Price(value) => ("price = ?", vec![int(*value)]),
        FieldChange::Type(pack_type) => (
            "type_id = ?, type_name = ?",
            vec![int(pack_type.id.into()), text(&pack_type.name)],
        ),
        FieldChange::Mno(mno) => (
            "mno_id = ?, mno_name = ?",
            vec![int(mno.id.into()), text(&mno.name)],
        ),
        FieldChange::Term(term) => (
            "term_unit_id = ?, term_unit = ?, term_amount = ?",
            vec![int(term.unit_id.into()), text(&term.unit), int(term.amount)],
        ),
        FieldChange::Currency(currency) => (
            "currency_id = ?, currency_name = ?",
            vec![int(currency.id.into()), text(&currency.name)],
        ),
        FieldChange::Resources(resources) => {
            ("resources = ?", vec![Value::Text(encode_resources(resources)?)])
        }
        FieldChange::StockDelta(delta) => ("stock = stock + ?", vec![int(*delta)]),
    };

    Ok((assignments.to_string(), values))
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn int(value: i64) -> Value {
    Value::Integer(value)
}

fn parse_pack_row(row: &Row<'_>) -> RepoResult<Pack> {
    let id_text: String = row.get("id")?;
    let id = parse_pack_id(&id_text)?;

    let state = match row.get::<_, i64>("state")? {
        0 => PackState::Inactive,
        1 => PackState::Active,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid state value `{other}` in packs.state"
            )));
        }
    };

    let resources_text: String = row.get("resources")?;
    let resources = serde_json::from_str::<Vec<Resource>>(&resources_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid resources json in packs.resources: {err}"))
    })?;

    let pack_type = match (
        row.get::<_, Option<i32>>("type_id")?,
        row.get::<_, Option<String>>("type_name")?,
    ) {
        (Some(id), Some(name)) => Some(PackType { id, name }),
        _ => None,
    };
    let mno = match (
        row.get::<_, Option<i32>>("mno_id")?,
        row.get::<_, Option<String>>("mno_name")?,
    ) {
        (Some(id), Some(name)) => Some(Mno { id, name }),
        _ => None,
    };
    let currency = match (
        row.get::<_, Option<i32>>("currency_id")?,
        row.get::<_, Option<String>>("currency_name")?,
    ) {
        (Some(id), Some(name)) => Some(Currency { id, name }),
        _ => None,
    };
    let term = match (
        row.get::<_, Option<i32>>("term_unit_id")?,
        row.get::<_, Option<String>>("term_unit")?,
        row.get::<_, Option<i64>>("term_amount")?,
    ) {
        (Some(unit_id), Some(unit), amount) => Some(Term {
            unit_id,
            unit,
            amount: amount.unwrap_or_default(),
        }),
        _ => None,
    };

    Ok(Pack {
        id: Some(id),
        product_id: row.get("product_id")?,
        pack_code: row.get("pack_code")?,
        name: row.get("name")?,
        description: row.get("description")?,
        image_url: row.get("image_url")?,
        keywords: row.get("keywords")?,
        price: row.get("price")?,
        stock: row.get("stock")?,
        owner_id: row.get("owner_id")?,
        pack_type,
        mno,
        term,
        currency,
        state,
        resources,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_pack_id(value: &str) -> RepoResult<PackId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in packs.id")))
}

fn encode_resources(resources: &[Resource]) -> RepoResult<String> {
    serde_json::to_string(resources)
        .map_err(|err| RepoError::InvalidData(format!("resources cannot be encoded: {err}")))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{change_to_sql, FieldChange};
    use crate::model::pack::Term;

    #[test]
    fn stock_delta_is_an_increment_not_a_set() {
        let (sql, values) = change_to_sql(&FieldChange::StockDelta(-3)).unwrap();
        assert_eq!(sql, "stock = stock + ?");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn term_change_writes_all_three_columns() {
        let change = FieldChange::Term(Term {
            unit_id: 1,
            unit: "day".to_string(),
            amount: 7,
        });
        let (sql, values) = change_to_sql(&change).unwrap();
        assert_eq!(sql, "term_unit_id = ?, term_unit = ?, term_amount = ?");
        assert_eq!(values.len(), 3);
        assert_eq!(change.field(), "term");
    }
}
