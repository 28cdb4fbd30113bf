mod common;

use common::{create_mock_driver, decode_write, init_logger, MockPin, MockSpi};
use tmcdrive::tmc5160::{RampMode, RegisterProfile, TmcDriver};
use tmcdrive::TmcError;

#[test]
fn test_new_driver_starts_disabled() {
    let (mut driver, spi, pin) = create_mock_driver();
    assert!(pin.is_high());
    assert_eq!(pin.history(), [true]);
    assert_eq!(driver.is_enabled(), Ok(false));
    assert!(spi.sent().is_empty());
}

#[test]
fn test_enable_is_active_low() {
    let (mut driver, _spi, pin) = create_mock_driver();
    driver.enable().unwrap();
    assert!(!pin.is_high());
    assert_eq!(driver.is_enabled(), Ok(true));
    driver.disable().unwrap();
    assert!(pin.is_high());
    assert_eq!(driver.is_enabled(), Ok(false));
}

#[test]
fn test_pin_errors() {
    init_logger();
    let pin = MockPin::new();
    pin.set_failing(true);
    assert!(matches!(TmcDriver::new(MockSpi::new(), pin.clone()), Err(TmcError::GpioPinError)));

    let (mut driver, _spi, pin) = create_mock_driver();
    pin.set_failing(true);
    assert_eq!(driver.enable(), Err(TmcError::GpioPinError));
}

#[test]
fn test_drop_disables_driver() {
    let (mut driver, _spi, pin) = create_mock_driver();
    driver.enable().unwrap();
    drop(driver);
    assert!(pin.is_high());
    assert_eq!(pin.history(), [true, false, true]);
}

#[test]
fn test_target_position() {
    let (mut driver, spi, _pin) = create_mock_driver();
    driver.set_target_position(46_080_000).unwrap();
    assert_eq!(spi.sent(), [[0xAD, 0x02, 0xBF, 0x20, 0x00]]);
    assert_eq!(driver.target_position(), Ok(46_080_000));

    driver.set_target_position(-1000).unwrap();
    assert_eq!(decode_write(&spi.sent()[1]), (0x2D, 0xFFFF_FC18));
    assert_eq!(driver.target_position(), Ok(-1000));
}

#[test]
fn test_ramp_mode() {
    let (mut driver, spi, _pin) = create_mock_driver();
    driver.set_ramp_mode(RampMode::VelocityNegative).unwrap();
    assert_eq!(driver.cached("RAMPMODE"), Ok(2));
    // Only two bits fit.
    driver.set_ramp_mode(7u8).unwrap();
    assert_eq!(driver.cached("RAMPMODE"), Ok(3));
    assert_eq!(decode_write(&spi.sent()[1]), (0x20, 3));
}

#[test]
fn test_oversized_value_is_truncated() {
    let (mut driver, spi, _pin) = create_mock_driver();
    driver.apply("GLOBAL_SCALER", &[("GLOBAL_SCALER", 300)]).unwrap();
    assert_eq!(spi.sent(), [[0x8B, 0, 0, 0, 44]]);
    assert_eq!(driver.cached("GLOBAL_SCALER"), Ok(44));
}

#[test]
fn test_driver_defaults_profile() {
    let (mut driver, spi, _pin) = create_mock_driver();
    driver.apply_profile(&RegisterProfile::driver_defaults()).unwrap();

    let writes: Vec<(u8, u32)> = spi.sent().iter().map(decode_write).collect();
    assert_eq!(
        writes,
        [
            (0x6C, 0x0001_00C3),
            (0x10, 0x0006_1F04),
            (0x0B, 128),
            (0x11, 10),
            (0x00, 0x04),
            (0x13, 500),
        ]
    );
    assert_eq!(driver.field("CHOPCONF", "HEND"), Ok(1));
}

#[test]
fn test_profile_from_bytes() {
    let bytes = RegisterProfile::ramp_defaults().to_vec().unwrap();
    let profile = RegisterProfile::from_bytes(&bytes).unwrap();

    let (mut driver, spi, _pin) = create_mock_driver();
    driver.apply_profile(&profile).unwrap();
    let addresses: Vec<u8> = spi.sent().iter().map(|d| decode_write(d).0).collect();
    assert_eq!(addresses, [0x24, 0x25, 0x26, 0x27, 0x28, 0x2A, 0x2B]);
    assert_eq!(driver.cached("VMAX"), Ok(1_000_000));
}

#[test]
fn test_profile_with_unknown_field_is_not_applied() {
    let profile = RegisterProfile::new()
        .with("VMAX", &[("VMAX", 1000)])
        .with("CHOPCONF", &[("TOFF", 3), ("NOPE", 1)]);
    let (mut driver, spi, _pin) = create_mock_driver();
    assert_eq!(driver.apply_profile(&profile), Err(TmcError::UnknownField));
    assert!(spi.sent().is_empty());
    assert!(!driver.state().has_pending());
}

#[test]
fn test_shutdown_turns_chopper_off() {
    let (mut driver, spi, pin) = create_mock_driver();
    driver.apply_profile(&RegisterProfile::driver_defaults()).unwrap();
    driver.enable().unwrap();

    let (_spi, mut released) = driver.shutdown().unwrap();
    let last = spi.sent().last().copied().unwrap();
    // TOFF cleared, the rest of CHOPCONF kept.
    assert_eq!(decode_write(&last), (0x6C, 0x0001_00C0));
    assert!(pin.is_high());
    assert_eq!(
        embedded_hal::digital::StatefulOutputPin::is_set_high(&mut released),
        Ok(true)
    );
}

#[test]
fn test_shutdown_failure_still_disables() {
    let (mut driver, spi, pin) = create_mock_driver();
    driver.enable().unwrap();
    spi.fail_transfer(0);
    assert!(matches!(driver.shutdown(), Err(TmcError::SpiTransferError)));
    assert!(pin.is_high());
}

#[test]
fn test_release_sends_nothing() {
    let (mut driver, spi, pin) = create_mock_driver();
    driver.enable().unwrap();
    let (released_spi, _pin) = driver.release().unwrap();
    assert!(pin.is_high());
    assert!(released_spi.sent().is_empty());
    assert!(spi.sent().is_empty());
}
