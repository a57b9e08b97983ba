//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::ProductCode;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = MoneyError::CurrencyMismatch("INR".to_string(), "USD".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
}

#[test]
fn test_core_error_from_identifier_error() {
    let identifier_error = ProductCode::new("health").unwrap_err();
    let core_error: CoreError = identifier_error.into();

    assert!(matches!(core_error, CoreError::Identifier(_)));
    assert!(core_error.to_string().contains("health"));
}

#[test]
fn test_core_error_display() {
    let error = CoreError::validation("Test error");
    let display = format!("{}", error);

    assert!(display.contains("Validation error"));
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::configuration("Missing rate table path");

    match error {
        CoreError::Configuration(msg) => assert_eq!(msg, "Missing rate table path"),
        _ => panic!("Expected Configuration error"),
    }
}
