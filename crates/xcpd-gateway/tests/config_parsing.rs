use std::{env, fs};

use xcpd_gateway::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("xcpd.toml");

    let toml_content = r#"
[gateway]
home_community_id = "urn:oid:1.1"
community_assigning_authority = "1.1.1"
community_assigning_authority_namespace = "HOSP"
minimum_degree_match_percentage = 85
max_concurrent_requests = 4
request_timeout_ms = 15000

[[responding_gateways]]
home_community_id = "urn:oid:2.1"
endpoint = "https://rg1.example.org/xcpd"
name = "North"

[[responding_gateways]]
home_community_id = "urn:oid:2.2"
endpoint = "https://rg2.example.org/xcpd"

[cache]
ttl_secs = 86400

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.gateway.home_community_id, "urn:oid:1.1");
    assert_eq!(cfg.gateway.minimum_degree_match_percentage, 85);
    assert_eq!(cfg.gateway.max_concurrent_requests, 4);
    assert!(cfg.gateway.multi_thread);
    assert_eq!(
        cfg.request_timeout(),
        Some(std::time::Duration::from_millis(15000))
    );
    assert_eq!(cfg.responding_gateways.len(), 2);
    assert_eq!(cfg.responding_gateways[0].name.as_deref(), Some("North"));
    assert_eq!(
        cfg.responding_gateways[1].endpoint.as_str(),
        "https://rg2.example.org/xcpd"
    );
    assert_eq!(cfg.community_assigning_authority().namespace_id.as_deref(), Some("HOSP"));
    assert_eq!(cfg.cache.ttl_secs, Some(86400));
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("XCPD__GATEWAY__MINIMUM_DEGREE_MATCH_PERCENTAGE", "70");
        env::set_var("XCPD__GATEWAY__MULTI_THREAD", "false");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.gateway.minimum_degree_match_percentage, 70);
    assert!(!cfg_env.gateway.multi_thread);
    // cleanup env vars
    unsafe {
        env::remove_var("XCPD__GATEWAY__MINIMUM_DEGREE_MATCH_PERCENTAGE");
        env::remove_var("XCPD__GATEWAY__MULTI_THREAD");
    }

    // 3) Defaults apply to omitted keys
    let minimal_path = dir.path().join("minimal.toml");
    let minimal_toml = r#"
[gateway]
home_community_id = "urn:oid:1.1"
community_assigning_authority = "1.1.1"
"#;
    fs::write(&minimal_path, minimal_toml).expect("write minimal toml");
    let minimal = load_config(minimal_path.to_str()).expect("minimal config should parse");
    assert_eq!(minimal.gateway.minimum_degree_match_percentage, 90);
    assert_eq!(minimal.gateway.max_concurrent_requests, 8);
    assert!(minimal.responding_gateways.is_empty());
    assert!(minimal.cache.ttl().is_none());

    // 4) Duplicate responding gateways should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[gateway]
home_community_id = "urn:oid:1.1"
community_assigning_authority = "1.1.1"

[[responding_gateways]]
home_community_id = "urn:oid:2.1"
endpoint = "https://rg1.example.org/xcpd"

[[responding_gateways]]
home_community_id = "URN:OID:2.1"
endpoint = "https://rg1-backup.example.org/xcpd"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.to_string().contains("more than once"));

    // 5) Malformed endpoint is a deserialize error
    let bad_url_path = dir.path().join("bad_url.toml");
    let bad_url_toml = r#"
[gateway]
home_community_id = "urn:oid:1.1"
community_assigning_authority = "1.1.1"

[[responding_gateways]]
home_community_id = "urn:oid:2.1"
endpoint = "not a url"
"#;
    fs::write(&bad_url_path, bad_url_toml).expect("write bad url toml");
    let err = load_config(bad_url_path.to_str()).expect_err("expected deserialize error");
    assert!(err.to_string().starts_with("config deserialize error"));
}
