//! Command Tests
//!
//! Drives the command functions against files written to a per-test scratch
//! directory.

use std::path::{Path, PathBuf};

use interface_cli::{commands, CliError, LogFormat, RaterConfig, EXIT_DATA_ERR, EXIT_FAILURE, EXIT_TEMP_FAIL};
use test_utils::{
    assert_final_premium, assert_policy_number_format, assert_transaction_id_format, RequestFixtures,
    RATE_TABLES_JSON,
};

/// Creates an empty scratch directory unique to `name` and this process
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("premium-rater-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, file: &str, contents: &str) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

mod config_tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = scratch("config-defaults");
        let config = RaterConfig::load_from(&dir.join("absent")).unwrap();

        assert_eq!(config.policy_prefix, "BS");
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = scratch("config-file");
        let file = write(
            &dir,
            "rater.toml",
            "policy_prefix = \"HX\"\nmax_attempts = 4\ncheck_timeout_ms = 50\nlog_format = \"json\"\n",
        );

        let config = RaterConfig::load_from(&file).unwrap();
        assert_eq!(config.policy_prefix, "HX");
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.check_timeout().as_millis(), 50);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = scratch("config-invalid");
        let zero_attempts = write(&dir, "zero.toml", "max_attempts = 0\n");
        let bad_prefix = write(&dir, "prefix.toml", "policy_prefix = \"b-s\"\n");

        assert!(RaterConfig::load_from(&zero_attempts).is_err());
        assert!(RaterConfig::load_from(&bad_prefix).is_err());
    }
}

mod tables_command_tests {
    use super::*;

    #[test]
    fn test_validate_tables_summarizes_products() {
        let dir = scratch("validate");
        let tables = write(&dir, "tables.json", RATE_TABLES_JSON);

        let summary = commands::validate_tables(&tables).unwrap();
        assert_eq!(summary.version.as_deref(), Some("2024-04-fixture"));
        assert_eq!(summary.products.len(), 2);

        let family = summary
            .products
            .iter()
            .find(|p| p.product_id == "family-health")
            .unwrap();
        assert_eq!(family.product_code, "FHLT");
        assert_eq!(family.age_brackets, 5);
        assert_eq!(family.tenure, (1, 3));
    }

    #[test]
    fn test_invalid_tables_are_data_errors() {
        let dir = scratch("validate-bad");
        let tables = write(&dir, "tables.json", &RATE_TABLES_JSON.replace("8600", "-1"));

        let err = commands::validate_tables(&tables).unwrap_err();
        assert!(matches!(err, CliError::Tables(_)));
        assert_eq!(err.exit_code(), EXIT_DATA_ERR);
    }

    #[test]
    fn test_missing_tables_file_is_failure() {
        let dir = scratch("validate-missing");
        let err = commands::validate_tables(&dir.join("absent.json")).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }
}

mod rate_command_tests {
    use super::*;

    #[test]
    fn test_rate_request_from_file() {
        let dir = scratch("rate");
        let tables = write(&dir, "tables.json", RATE_TABLES_JSON);
        let request = write(&dir, "request.json", RequestFixtures::single_adult_with_rider_json());

        let result = commands::rate_request(&tables, &request).unwrap();
        assert_final_premium(&result, 12632);
    }

    #[test]
    fn test_malformed_request_is_data_error() {
        let dir = scratch("rate-malformed");
        let tables = write(&dir, "tables.json", RATE_TABLES_JSON);
        let request = write(&dir, "request.json", "{ \"product_id\": ");

        let err = commands::rate_request(&tables, &request).unwrap_err();
        assert!(matches!(err, CliError::Request { .. }));
        assert_eq!(err.exit_code(), EXIT_DATA_ERR);
    }

    #[test]
    fn test_rejected_request_is_data_error() {
        let dir = scratch("rate-rejected");
        let tables = write(&dir, "tables.json", RATE_TABLES_JSON);
        let request = write(
            &dir,
            "request.json",
            r#"{ "product_id": "family-health", "coverage": { "tier": "5L" }, "members": [] }"#,
        );

        let err = commands::rate_request(&tables, &request).unwrap_err();
        assert!(matches!(err, CliError::Rating(_)));
        assert!(err.to_string().contains("no_insured_members"));
        assert_eq!(err.exit_code(), EXIT_DATA_ERR);
    }
}

mod identifier_command_tests {
    use super::*;

    fn config() -> RaterConfig {
        RaterConfig {
            max_attempts: 3,
            ..RaterConfig::default()
        }
    }

    #[test]
    fn test_load_existing_skips_blanks_and_comments() {
        let dir = scratch("existing");
        let file = write(&dir, "issued.txt", "# issued\nBS-FHLT-2024-1001\n\n  TXN-ABCD1234  \n");

        let existing = commands::load_existing(Some(&file)).unwrap();
        assert_eq!(existing.len(), 2);
        assert!(existing.contains("BS-FHLT-2024-1001"));
        assert!(existing.contains("TXN-ABCD1234"));
        assert!(commands::load_existing(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_policy_number_for_known_product() {
        let dir = scratch("policy-number");
        let tables = write(&dir, "tables.json", RATE_TABLES_JSON);

        let number = commands::mint_policy_number(&config(), &tables, "family-health", None, Some(2024))
            .await
            .unwrap();
        assert_policy_number_format(&number.to_string());
        assert!(number.to_string().starts_with("BS-FHLT-2024-"));
    }

    #[tokio::test]
    async fn test_policy_number_for_unknown_product_is_data_error() {
        let dir = scratch("policy-number-unknown");
        let tables = write(&dir, "tables.json", RATE_TABLES_JSON);

        let err = commands::mint_policy_number(&config(), &tables, "dental", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_DATA_ERR);
    }

    #[tokio::test]
    async fn test_transaction_id_is_well_formed() {
        let id = commands::mint_transaction_id(&config(), None).await.unwrap();
        assert_transaction_id_format(&id.to_string());
    }

    #[tokio::test]
    async fn test_exhaustion_is_temporary_failure() {
        let dir = scratch("exhausted");
        let tables = write(&dir, "tables.json", RATE_TABLES_JSON);
        let mut issued = String::new();
        for serial in 1000..=9999 {
            issued.push_str(&format!("BS-FHLT-2024-{serial}\n"));
        }
        let existing = write(&dir, "issued.txt", &issued);

        let err = commands::mint_policy_number(&config(), &tables, "family-health", Some(&existing), Some(2024))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_TEMP_FAIL);
    }
}
