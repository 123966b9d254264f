mod common;

use common::sample_pack;
use pack_core::{ErrorCode, Mno, Pack, PackKeys, PackState, PackType, Term, INITIAL_PACK_STATE};

#[test]
fn initial_state_is_active_and_default_state_is_inactive() {
    assert_eq!(INITIAL_PACK_STATE, PackState::Active);
    assert_eq!(PackState::default(), PackState::Inactive);
}

#[test]
fn sample_pack_passes_create_validation() {
    sample_pack(3, "PROD-1", "W1GB").validate_for_create().unwrap();
}

#[test]
fn missing_identity_fields_fail_with_code_01() {
    let cases: [fn(&mut Pack); 3] = [
        |pack| pack.product_id.clear(),
        |pack| pack.pack_code.clear(),
        |pack| pack.name.clear(),
    ];
    for clear in cases {
        let mut pack = sample_pack(3, "PROD-1", "W1GB");
        clear(&mut pack);
        let err = pack.validate_for_create().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingIdentity);
    }
}

#[test]
fn missing_descriptive_fields_fail_with_code_02() {
    let cases: [fn(&mut Pack); 3] = [
        |pack| pack.description.clear(),
        |pack| pack.keywords.clear(),
        |pack| pack.image_url.clear(),
    ];
    for clear in cases {
        let mut pack = sample_pack(3, "PROD-1", "W1GB");
        clear(&mut pack);
        let err = pack.validate_for_create().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingDescriptive);
    }
}

#[test]
fn negative_price_fails_with_code_02() {
    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    pack.price = -7;
    let err = pack.validate_for_create().unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingDescriptive);

    pack.price = 0;
    pack.validate_for_create().unwrap();
}

#[test]
fn invalid_sub_entities_fail_with_their_codes() {
    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    pack.pack_type = Some(PackType {
        id: 0,
        name: "data".to_string(),
    });
    assert_eq!(pack.validate_for_create().unwrap_err().code, ErrorCode::InvalidType);
    pack.pack_type = None;
    assert_eq!(pack.validate_for_create().unwrap_err().code, ErrorCode::InvalidType);

    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    pack.mno = Some(Mno {
        id: 3,
        name: String::new(),
    });
    assert_eq!(pack.validate_for_create().unwrap_err().code, ErrorCode::InvalidMno);

    let mut pack = sample_pack(0, "PROD-1", "W1GB");
    assert_eq!(pack.validate_for_create().unwrap_err().code, ErrorCode::InvalidMno);
    pack.mno = None;
    assert_eq!(pack.validate_for_create().unwrap_err().code, ErrorCode::InvalidMno);

    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    pack.term = Some(Term {
        unit_id: 0,
        unit: "day".to_string(),
        amount: 7,
    });
    assert_eq!(pack.validate_for_create().unwrap_err().code, ErrorCode::InvalidTerm);
    pack.term = Some(Term {
        unit_id: 1,
        unit: String::new(),
        amount: 7,
    });
    assert_eq!(pack.validate_for_create().unwrap_err().code, ErrorCode::InvalidTerm);
}

#[test]
fn basic_checks_win_over_complex_checks() {
    let mut pack = sample_pack(0, "PROD-1", "W1GB");
    pack.keywords.clear();
    assert_eq!(
        pack.validate_for_create().unwrap_err().code,
        ErrorCode::MissingDescriptive
    );
}

#[test]
fn keys_carry_mno_and_non_empty_business_keys() {
    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    assert_eq!(
        pack.keys(),
        PackKeys {
            mno_id: 3,
            product_id: Some("PROD-1".to_string()),
            pack_code: Some("W1GB".to_string()),
        }
    );

    pack.pack_code.clear();
    pack.mno = None;
    assert_eq!(pack.keys(), PackKeys::by_product_id(0, "PROD-1"));
}

#[test]
fn pack_serialization_uses_wire_field_names() {
    let mut pack = sample_pack(3, "PROD-1", "W1GB");
    pack.id = Some(uuid::Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap());
    pack.state = PackState::Active;

    let json = serde_json::to_value(&pack).unwrap();
    assert_eq!(json["id"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["prodid"], "PROD-1");
    assert_eq!(json["packcode"], "W1GB");
    assert_eq!(json["desc"], "1GB of data for seven days");
    assert_eq!(json["imgurl"], "https://cdn.example.com/packs/weekly-1gb.png");
    assert_eq!(json["kwds"], "data weekly");
    assert_eq!(json["ownerid"], 42);
    assert_eq!(json["type"]["id"], 1);
    assert_eq!(json["mno"]["id"], 3);
    assert_eq!(json["term"]["unit_id"], 1);
    assert_eq!(json["currency"]["name"], "COP");
    assert_eq!(json["resources"][0]["isfree"], false);
    assert_eq!(json["state"], 1);

    let decoded: Pack = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, pack);
}

#[test]
fn unstored_pack_omits_id_and_decodes_without_it() {
    let pack = sample_pack(3, "PROD-1", "W1GB");
    let json = serde_json::to_value(&pack).unwrap();
    assert!(json.get("id").is_none());

    let decoded: Pack = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.id, None);
    assert_eq!(decoded, pack);
}

#[test]
fn unknown_state_values_decode_as_active() {
    let mut json = serde_json::to_value(sample_pack(3, "PROD-1", "W1GB")).unwrap();
    json["state"] = serde_json::json!(9);
    let decoded: Pack = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.state, PackState::Active);
}
