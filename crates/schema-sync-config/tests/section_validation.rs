//! Section validation tests for schema-sync-config.
// crates/schema-sync-config/tests/section_validation.rs
// =============================================================================
// Module: Config Section Validation Tests
// Description: Validate per-section limits and defaults.
// Purpose: Ensure invalid settings are rejected before the service starts.
// =============================================================================

use std::time::Duration;

use schema_sync_config::ConfigError;
use schema_sync_config::DEFAULT_BUILDSPEC_FALLBACK_URL;
use schema_sync_config::DEFAULT_YAML_SCHEME;
use schema_sync_config::SchemaSyncConfig;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<SchemaSyncConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(ConfigError::Invalid(message)) => {
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Err(other) => Err(format!("expected invalid config, got {other}")),
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn empty_document_uses_defaults() -> TestResult {
    let config = SchemaSyncConfig::from_toml("").map_err(|err| err.to_string())?;
    if config.service.update_period() != Duration::from_millis(1_000) {
        return Err("default period must be one second".to_string());
    }
    if config.sources.buildspec_fallback_url != DEFAULT_BUILDSPEC_FALLBACK_URL {
        return Err("default fallback url not applied".to_string());
    }
    if config.yaml.scheme != DEFAULT_YAML_SCHEME {
        return Err("default yaml scheme not applied".to_string());
    }
    if config.http.timeout() != Duration::from_secs(30) {
        return Err("default http timeout not applied".to_string());
    }
    Ok(())
}

#[test]
fn default_config_validates() -> TestResult {
    SchemaSyncConfig::default().validate().map_err(|err| err.to_string())
}

#[test]
fn zero_update_period_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[service]\nupdate_period_ms = 0"),
        "update_period_ms must be greater than zero",
    )
}

#[test]
fn excessive_update_period_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[service]\nupdate_period_ms = 999999999"),
        "update_period_ms must be at most",
    )
}

#[test]
fn empty_manifest_url_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[sources]\nmanifest_url = \"\""),
        "sources.manifest_url must be non-empty",
    )
}

#[test]
fn unsupported_url_scheme_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[sources]\nbuildspec_primary_url = \"ftp://example.com/b.json\""),
        "unsupported scheme",
    )
}

#[test]
fn template_without_placeholder_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml(
            "[sources]\ncfn_url_template = \"https://example.com/cfn.schema.json\"",
        ),
        "sources.cfn_url_template must contain {version}",
    )
}

#[test]
fn templates_expand_version_tag() -> TestResult {
    let config = SchemaSyncConfig::from_toml(
        "[sources]\nsam_url_template = \"https://example.com/{version}/sam.schema.json\"",
    )
    .map_err(|err| err.to_string())?;
    let url = config.sources.sam_url("v1.2.3");
    if url != "https://example.com/v1.2.3/sam.schema.json" {
        return Err(format!("unexpected url {url}"));
    }
    if !config.sources.cfn_url("v9").contains("/v9/schema/cloudformation.schema.json") {
        return Err("default cfn template did not expand".to_string());
    }
    Ok(())
}

#[test]
fn version_cache_must_be_file_name() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[storage]\nversion_cache = \"nested/versions.json\""),
        "storage.version_cache must be a file name",
    )
}

#[test]
fn zero_http_timeout_rejected() -> TestResult {
    assert_invalid(SchemaSyncConfig::from_toml("[http]\ntimeout_ms = 0"), "http.timeout_ms")
}

#[test]
fn blank_user_agent_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[http]\nuser_agent = \"  \""),
        "http.user_agent must be non-empty",
    )
}

#[test]
fn blank_settings_key_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[json]\nsettings_key = \"\""),
        "json.settings_key must be non-empty",
    )
}

#[test]
fn blank_stale_suffix_rejected() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[json]\nstale_url_suffixes = [\"\"]"),
        "json.stale_url_suffixes entries must be non-empty",
    )
}

#[test]
fn invalid_yaml_scheme_rejected() -> TestResult {
    assert_invalid(SchemaSyncConfig::from_toml("[yaml]\nscheme = \"1aws\""), "yaml.scheme")
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(
        SchemaSyncConfig::from_toml("[logging]\nsink = \"file\""),
        "logging.sink=file requires logging.path",
    )
}

#[test]
fn unknown_sink_fails_to_parse() -> TestResult {
    match SchemaSyncConfig::from_toml("[logging]\nsink = \"syslog\"") {
        Err(ConfigError::Parse(_)) => Ok(()),
        Err(other) => Err(format!("expected parse error, got {other}")),
        Ok(_) => Err("expected parse error".to_string()),
    }
}
