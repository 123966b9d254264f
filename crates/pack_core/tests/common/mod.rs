#![allow(dead_code)]

use pack_core::{
    Currency, FieldChange, Mno, Pack, PackId, PackKeys, PackRepository, PackState, PackType,
    RepoError, RepoResult, Resource, StoreStats, Term,
};
use std::cell::{Cell, RefCell};

/// Valid, not yet stored pack owned by operator `mno_id`.
pub fn sample_pack(mno_id: i32, product_id: &str, pack_code: &str) -> Pack {
    Pack {
        id: None,
        product_id: product_id.to_string(),
        pack_code: pack_code.to_string(),
        name: "Weekly 1GB".to_string(),
        description: "1GB of data for seven days".to_string(),
        image_url: "https://cdn.example.com/packs/weekly-1gb.png".to_string(),
        keywords: "data weekly".to_string(),
        price: 5000,
        stock: 0,
        owner_id: 42,
        pack_type: Some(PackType {
            id: 1,
            name: "data".to_string(),
        }),
        mno: Some(Mno {
            id: mno_id,
            name: format!("operator-{mno_id}"),
        }),
        term: Some(Term {
            unit_id: 1,
            unit: "day".to_string(),
            amount: 7,
        }),
        currency: Some(Currency {
            id: 1,
            name: "COP".to_string(),
        }),
        state: PackState::Inactive,
        resources: vec![sample_resource(1, "data")],
        created_at: 0,
        updated_at: 0,
    }
}

pub fn sample_resource(id: i32, name: &str) -> Resource {
    Resource {
        id,
        name: name.to_string(),
        units: "MB".to_string(),
        amount: 1024.0,
        is_free: false,
    }
}

/// Repository fake that records every call and never stores anything.
#[derive(Default)]
pub struct RecordingRepo {
    pub calls: RefCell<Vec<String>>,
    pub exists_result: Cell<bool>,
    pub fail_exists: Cell<bool>,
    pub fail_writes: Cell<bool>,
}

impl RecordingRepo {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn write_result(&self) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::InvalidData("simulated write failure".to_string()));
        }
        Ok(())
    }
}

impl PackRepository for RecordingRepo {
    fn get_by_id(&self, id: PackId) -> RepoResult<Option<Pack>> {
        self.record(format!("get_by_id:{id}"));
        Ok(None)
    }

    fn get_by_code(&self, pack_code: &str) -> RepoResult<Option<Pack>> {
        self.record(format!("get_by_code:{pack_code}"));
        Ok(None)
    }

    fn get_by_product_id(&self, product_id: &str) -> RepoResult<Option<Pack>> {
        self.record(format!("get_by_product_id:{product_id}"));
        Ok(None)
    }

    fn get_id_by_code(&self, pack_code: &str) -> RepoResult<Option<PackId>> {
        self.record(format!("get_id_by_code:{pack_code}"));
        Ok(None)
    }

    fn exists(&self, keys: &PackKeys) -> RepoResult<bool> {
        self.record(format!("exists:{}", keys.mno_id));
        if self.fail_exists.get() {
            return Err(RepoError::InvalidData("simulated probe failure".to_string()));
        }
        Ok(self.exists_result.get())
    }

    fn insert(&self, pack: &Pack) -> RepoResult<PackId> {
        self.record(format!("insert:{}", pack.pack_code));
        self.write_result()?;
        Ok(pack.id.unwrap_or_else(uuid::Uuid::new_v4))
    }

    fn update_field(&self, id: PackId, change: &FieldChange) -> RepoResult<()> {
        self.record(format!("update_field:{id}:{}", change.field()));
        self.write_result()
    }

    fn remove(&self, id: PackId) -> RepoResult<()> {
        self.record(format!("remove:{id}"));
        self.write_result()
    }

    fn ping(&self) -> RepoResult<StoreStats> {
        self.record("ping");
        if self.fail_writes.get() {
            return Err(RepoError::InvalidData("store unreachable".to_string()));
        }
        Ok(StoreStats {
            pack_count: 0,
            schema_version: 0,
        })
    }
}
