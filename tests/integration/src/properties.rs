//! Whole-document properties: round-trips and migration idempotence

use cruise_codec::{parse_document, serialize};
use cruise_migrate::{MigrationContext, upgrade};
use cruise_secure::SecureCipher;
use cruise_test_utils::{CURRENT_VERSION, fixtures};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn upgraded(xml: &str, cipher: &SecureCipher) -> String {
    upgrade(xml.as_bytes(), &MigrationContext::new(cipher)).unwrap().xml
}

#[rstest]
#[case::two_stage(fixtures::two_stage_pipeline())]
#[case::fetch(fixtures::fetch_from_later_stage())]
#[case::v88(fixtures::v88_with_des_variable())]
#[case::v58(fixtures::v58_legacy_shapes())]
fn test_serialize_round_trip(#[case] xml: String) {
    let cipher = SecureCipher::generate();
    let current = upgraded(&xml, &cipher);

    let parsed = parse_document(current.as_bytes()).unwrap();
    let reparsed = parse_document(serialize(&parsed).as_bytes()).unwrap();
    assert_eq!(parsed, reparsed);
}

#[rstest]
#[case::v58(fixtures::v58_legacy_shapes())]
#[case::v88(fixtures::v88_with_des_variable())]
fn test_upgrade_is_idempotent(#[case] xml: String) {
    let cipher = SecureCipher::generate();
    let once = upgraded(&xml, &cipher);
    let twice = upgraded(&once, &cipher);
    assert_eq!(once, twice);
}

#[rstest]
fn test_every_starting_version_reaches_same_shape(#[values(50, 51, 87, 108, 119, 138)] version: u32) {
    let cipher = SecureCipher::generate();
    let current = fixtures::two_stage_pipeline();
    let older = current.replace(
        &format!("schemaVersion=\"{CURRENT_VERSION}\""),
        &format!("schemaVersion=\"{version}\""),
    );
    let next = current.replace(
        &format!("schemaVersion=\"{CURRENT_VERSION}\""),
        &format!("schemaVersion=\"{}\"", version + 1),
    );

    let from_older = parse_document(upgraded(&older, &cipher).as_bytes()).unwrap();
    let from_next = parse_document(upgraded(&next, &cipher).as_bytes()).unwrap();
    assert_eq!(from_older, from_next);
    assert_eq!(from_older, parse_document(current.as_bytes()).unwrap());
}
