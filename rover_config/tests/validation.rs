use rover_config::{Authority, load_toml};

fn base_toml() -> String {
    r#"
[pins]
left_fwd = 17
left_rev = 27
left_en = 22
right_fwd = 23
right_rev = 24
right_en = 25
sonar_trig = 5
sonar_echo = 6
"#
    .to_string()
}

#[test]
fn minimal_config_parses_with_defaults() {
    let cfg = load_toml(&base_toml()).expect("parse TOML");
    cfg.validate().expect("defaults must validate");
    assert_eq!(cfg.serial.baud, 115_200);
    assert_eq!(cfg.drive.full_turn_ms, 2000);
    assert_eq!(cfg.ranging.poll_hz, 10);
    assert_eq!(cfg.report.period_s, 5);
    assert_eq!(cfg.transport.authority, Authority::Serial);
    assert!(!cfg.hardware.dry_run);
}

#[test]
fn rejects_zero_speed_calibration() {
    let toml = base_toml()
        + r#"
[drive]
speed_m_per_s = 0.0
"#;
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject speed_m_per_s=0");
    assert!(format!("{err}").contains("drive.speed_m_per_s must be > 0"));
}

#[test]
fn rejects_zero_full_turn() {
    let toml = base_toml()
        + r#"
[drive]
full_turn_ms = 0
"#;
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject full_turn_ms=0");
    assert!(format!("{err}").contains("drive.full_turn_ms"));
}

#[test]
fn rejects_duplicate_pins() {
    let toml = r#"
[pins]
left_fwd = 17
left_rev = 17
left_en = 22
right_fwd = 23
right_rev = 24
right_en = 25
sonar_trig = 5
sonar_echo = 6
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject duplicate pins");
    assert!(format!("{err}").contains("assigned to more than one function"));
}

#[test]
fn rejects_out_of_range_default_speed() {
    let toml = base_toml()
        + r#"
[drive]
default_speed_pct = 120.0
"#;
    let cfg = load_toml(&toml).expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[test]
fn wireless_authority_needs_wireless_port() {
    let toml = base_toml()
        + r#"
[transport]
authority = "wireless"

[serial]
wireless_port = ""
"#;
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject empty wireless port");
    assert!(format!("{err}").contains("wireless_port"));
}

#[test]
fn unknown_authority_value_is_a_parse_error() {
    let toml = base_toml()
        + r#"
[transport]
authority = "telepathy"
"#;
    assert!(load_toml(&toml).is_err());
}
