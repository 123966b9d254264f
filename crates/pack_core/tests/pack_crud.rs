mod common;

use common::{sample_pack, sample_resource};
use pack_core::db::open_db_in_memory;
use pack_core::{
    FieldChange, Mno, PackKeys, PackRepository, PackState, RepoError, SqlitePackRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn insert_and_lookups_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();

    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    pack.created_at = 1_700_000_000_000;
    pack.updated_at = 1_700_000_000_000;
    let id = repo.insert(&pack).unwrap();
    pack.id = Some(id);

    assert_eq!(repo.get_by_id(id).unwrap().as_ref(), Some(&pack));
    assert_eq!(repo.get_by_code("W1GB").unwrap().as_ref(), Some(&pack));
    assert_eq!(repo.get_by_product_id("PROD-1").unwrap().as_ref(), Some(&pack));
    assert_eq!(repo.get_id_by_code("W1GB").unwrap(), Some(id));
}

#[test]
fn insert_keeps_caller_provided_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();

    let id = Uuid::new_v4();
    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    pack.id = Some(id);
    assert_eq!(repo.insert(&pack).unwrap(), id);
}

#[test]
fn absent_records_are_none_not_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();

    assert!(repo.get_by_id(Uuid::new_v4()).unwrap().is_none());
    assert!(repo.get_by_code("NOPE").unwrap().is_none());
    assert!(repo.get_by_product_id("NOPE").unwrap().is_none());
    assert!(repo.get_id_by_code("NOPE").unwrap().is_none());
}

#[test]
fn exists_matches_mno_and_either_business_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    assert!(repo.exists(&PackKeys::by_product_id(3, "PROD-1")).unwrap());
    assert!(repo.exists(&PackKeys::by_pack_code(3, "W1GB")).unwrap());
    assert!(repo
        .exists(&PackKeys {
            mno_id: 3,
            product_id: Some("OTHER".to_string()),
            pack_code: Some("W1GB".to_string()),
        })
        .unwrap());
    assert!(!repo
        .exists(&PackKeys {
            mno_id: 3,
            product_id: Some("OTHER".to_string()),
            pack_code: Some("OTHER".to_string()),
        })
        .unwrap());
}

#[test]
fn exists_is_false_for_unknown_mno_regardless_of_key_overlap() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    assert!(!repo
        .exists(&PackKeys {
            mno_id: 4,
            product_id: Some("PROD-1".to_string()),
            pack_code: Some("W1GB".to_string()),
        })
        .unwrap());
}

#[test]
fn exists_rejects_probe_without_business_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();

    let err = repo
        .exists(&PackKeys {
            mno_id: 3,
            product_id: Some(String::new()),
            pack_code: None,
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidProbe));
}

#[test]
fn unique_indexes_reject_duplicate_keys_per_mno() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    let same_product = repo.insert(&sample_pack(3, "PROD-1", "OTHER")).unwrap_err();
    assert!(matches!(same_product, RepoError::DuplicateKey(_)));

    let same_code = repo.insert(&sample_pack(3, "OTHER", "W1GB")).unwrap_err();
    assert!(matches!(same_code, RepoError::DuplicateKey(_)));

    repo.insert(&sample_pack(4, "PROD-1", "W1GB")).unwrap();
}

#[test]
fn update_field_writes_value_and_stamps_updated() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    let id = repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    repo.update_field(id, &FieldChange::Name("Monthly".to_string()))
        .unwrap();
    repo.update_field(id, &FieldChange::State(PackState::Active))
        .unwrap();
    repo.update_field(
        id,
        &FieldChange::Mno(Mno {
            id: 9,
            name: "operator-9".to_string(),
        }),
    )
    .unwrap();

    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.name, "Monthly");
    assert_eq!(loaded.state, PackState::Active);
    assert_eq!(loaded.mno_id(), Some(9));
    assert!(loaded.updated_at > 0);
    assert_eq!(loaded.created_at, 0);
}

#[test]
fn stock_delta_increments_and_stamps_updated() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    let id = repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    repo.update_field(id, &FieldChange::StockDelta(2)).unwrap();
    repo.update_field(id, &FieldChange::StockDelta(-5)).unwrap();

    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.stock, -3);
    assert!(loaded.updated_at > 0);
}

#[test]
fn resources_are_replaced_wholesale() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    let id = repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    let replacement = vec![sample_resource(7, "voice"), sample_resource(8, "sms")];
    repo.update_field(id, &FieldChange::Resources(replacement.clone()))
        .unwrap();
    assert_eq!(repo.get_by_id(id).unwrap().unwrap().resources, replacement);

    repo.update_field(id, &FieldChange::Resources(Vec::new()))
        .unwrap();
    assert!(repo.get_by_id(id).unwrap().unwrap().resources.is_empty());
}

#[test]
fn update_and_remove_of_missing_pack_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let err = repo
        .update_field(missing, &FieldChange::Price(10))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));

    let err = repo.remove(missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn remove_makes_every_lookup_absent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    let id = repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    repo.remove(id).unwrap();

    assert!(repo.get_by_id(id).unwrap().is_none());
    assert!(repo.get_by_code("W1GB").unwrap().is_none());
    assert!(repo.get_by_product_id("PROD-1").unwrap().is_none());
    assert!(repo.get_id_by_code("W1GB").unwrap().is_none());
}

#[test]
fn ping_reports_pack_count_and_schema_version() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    let stats = repo.ping().unwrap();
    assert_eq!(stats.pack_count, 1);
    assert_eq!(
        stats.schema_version,
        pack_core::db::migrations::latest_version()
    );
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqlitePackRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("packs")));
}

#[test]
fn corrupted_resources_column_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePackRepository::try_new(&conn).unwrap();
    let id = repo.insert(&sample_pack(3, "PROD-1", "W1GB")).unwrap();

    conn.execute(
        "UPDATE packs SET resources = 'not json' WHERE id = ?1;",
        [id.to_string()],
    )
    .unwrap();

    let err = repo.get_by_id(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
