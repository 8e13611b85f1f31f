use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use dealwise_cli::commands::{catalog, config, doctor, feed, recommend};
use dealwise_core::config::LoadOptions;
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn recommend_returns_industry_override() {
    let fixture = catalog_fixture();
    with_env(&[("DEALWISE_CATALOG_DIR", fixture.dir().as_str())], || {
        let result = recommend::run(&LoadOptions::default(), "Widget", "Apparel", true);
        assert_eq!(result.exit_code, 0, "expected successful recommendation");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "recommend");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["recommendation"]["Recommended Product"], "Widget-A");
        assert_eq!(payload["recommendation"]["Recommended Code"], "WA1");
        assert_eq!(payload["recommendation"]["MOQ"], 50);
        assert_eq!(payload["recommendation"]["Payment Terms"], "Net 30");
        assert_eq!(payload["insights"], Value::Null);
        assert_eq!(payload["warnings"].as_array().map(Vec::len), Some(0));
        assert!(payload["correlation_id"].as_str().is_some_and(|id| id.starts_with("REQ-")));
    });
}

#[test]
fn recommend_with_unknown_industry_keeps_base_values() {
    let fixture = catalog_fixture();
    with_env(&[("DEALWISE_CATALOG_DIR", fixture.dir().as_str())], || {
        let result = recommend::run(&LoadOptions::default(), "Widget", "Mining", true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["recommendation"]["Recommended Code"], "W1");
        assert_eq!(payload["recommendation"]["MOQ"], 10);
        assert_eq!(payload["recommendation"]["Industry"], "Mining");
    });
}

#[test]
fn recommend_without_llm_key_warns_but_succeeds() {
    let fixture = catalog_fixture();
    with_env(&[("DEALWISE_CATALOG_DIR", fixture.dir().as_str())], || {
        let result = recommend::run(&LoadOptions::default(), "Gadget", "Energy", false);
        assert_eq!(result.exit_code, 0, "missing LLM credentials must not fail the command");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["recommendation"]["Recommended Code"], "GE1");
        assert_eq!(payload["insights"], Value::Null);
        let warning = payload["warnings"][0].as_str().unwrap_or_default();
        assert!(warning.starts_with("A required credential is not configured"), "{warning}");
    });
}

#[test]
fn recommend_unknown_product_returns_not_found() {
    let fixture = catalog_fixture();
    with_env(&[("DEALWISE_CATALOG_DIR", fixture.dir().as_str())], || {
        let result = recommend::run(&LoadOptions::default(), "Doohickey", "Apparel", true);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "product_not_found");
    });
}

#[test]
fn recommend_non_numeric_quantity_returns_invalid_data() {
    let fixture = catalog_fixture();
    with_env(&[("DEALWISE_CATALOG_DIR", fixture.dir().as_str())], || {
        let result = recommend::run(&LoadOptions::default(), "Broken", "", true);
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_catalog_data");
    });
}

#[test]
fn recommend_missing_catalogue_returns_catalog_failure() {
    let empty = TempDir::new().expect("tempdir");
    let dir = empty.path().display().to_string();
    with_env(&[("DEALWISE_CATALOG_DIR", dir.as_str())], || {
        let result = recommend::run(&LoadOptions::default(), "Widget", "Apparel", true);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "catalog_load");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("The catalogue could not be used."), "{message}");
        assert!(message.contains("Base.csv"), "{message}");
    });
}

#[test]
fn recommend_invalid_config_returns_config_failure() {
    let fixture = catalog_fixture();
    with_env(
        &[("DEALWISE_CATALOG_DIR", fixture.dir().as_str()), ("DEALWISE_LLM_TIMEOUT_SECS", "0")],
        || {
            let result = recommend::run(&LoadOptions::default(), "Widget", "Apparel", true);
            assert_eq!(result.exit_code, 2, "expected config validation failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "recommend");
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn catalog_lists_products_and_industries_in_order() {
    let fixture = catalog_fixture();
    with_env(&[("DEALWISE_CATALOG_DIR", fixture.dir().as_str())], || {
        let result = catalog::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["products"], serde_json::json!(["Widget", "Gadget", "Broken"]));
        let labels = payload["industries"]
            .as_array()
            .map(|industries| {
                industries.iter().filter_map(|entry| entry["label"].as_str()).collect::<Vec<_>>()
            })
            .unwrap_or_default();
        assert_eq!(labels, ["Apparel", "Construction", "Energy", "Hospitality", "Transportation"]);
        assert_eq!(payload["industries"][0]["rows"], 1);
    });
}

#[test]
fn feed_preview_reads_local_upload() {
    let fixture = catalog_fixture();
    let feed_path = fixture.write_feed();
    with_env(
        &[
            ("DEALWISE_CATALOG_DIR", fixture.dir().as_str()),
            ("DEALWISE_FEED_SOURCE", "local"),
            ("DEALWISE_FEED_PATH", feed_path.as_str()),
        ],
        || {
            let result = feed::run(&LoadOptions::default(), None, true);
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["source"], "local");
            assert_eq!(payload["loaded"], true);
            assert_eq!(payload["rows"], 3);
            assert_eq!(payload["preview"][1]["Product"], "Widget");
            assert_eq!(payload["preview"][1]["Industry"], "Apparel");
        },
    );
}

#[test]
fn feed_row_runs_recommendation_with_column_fallback() {
    let fixture = catalog_fixture();
    let feed_path = fixture.write_feed();
    with_env(
        &[
            ("DEALWISE_CATALOG_DIR", fixture.dir().as_str()),
            ("DEALWISE_FEED_SOURCE", "local"),
            ("DEALWISE_FEED_PATH", feed_path.as_str()),
        ],
        || {
            let result = feed::run(&LoadOptions::default(), Some(1), true);
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "feed");
            assert_eq!(payload["feed_row"]["product"], "Widget");
            assert_eq!(payload["recommendation"]["Recommended Code"], "WA1");
        },
    );
}

#[test]
fn feed_row_with_unmatched_product_is_not_found() {
    let fixture = catalog_fixture();
    let feed_path = fixture.write_feed();
    with_env(
        &[
            ("DEALWISE_CATALOG_DIR", fixture.dir().as_str()),
            ("DEALWISE_FEED_SOURCE", "local"),
            ("DEALWISE_FEED_PATH", feed_path.as_str()),
        ],
        || {
            let result = feed::run(&LoadOptions::default(), Some(2), true);
            assert_eq!(result.exit_code, 3);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "product_not_found");
            assert!(payload["message"]
                .as_str()
                .is_some_and(|message| message.starts_with("Upload feed product not matched")));
        },
    );
}

#[test]
fn missing_feed_file_is_a_warning() {
    let fixture = catalog_fixture();
    let missing = fixture.path().join("nope.csv").display().to_string();
    with_env(
        &[
            ("DEALWISE_CATALOG_DIR", fixture.dir().as_str()),
            ("DEALWISE_FEED_SOURCE", "local"),
            ("DEALWISE_FEED_PATH", missing.as_str()),
        ],
        || {
            let result = feed::run(&LoadOptions::default(), None, true);
            assert_eq!(result.exit_code, 0, "feed failures must not change the exit code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["loaded"], false);
            let warning = payload["warnings"][0].as_str().unwrap_or_default();
            assert!(warning.starts_with("error loading upload feed"), "{warning}");
        },
    );
}

#[test]
fn s3_feed_without_bucket_reports_missing_credentials() {
    let fixture = catalog_fixture();
    with_env(
        &[("DEALWISE_CATALOG_DIR", fixture.dir().as_str()), ("DEALWISE_FEED_SOURCE", "s3")],
        || {
            let result = feed::run(&LoadOptions::default(), None, true);
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["source"], "s3");
            assert_eq!(
                payload["warnings"][0],
                "upload feed credentials not found: feed.bucket is not set"
            );
        },
    );
}

#[test]
fn doctor_passes_with_local_provider_and_no_feed() {
    let fixture = catalog_fixture();
    with_env(
        &[("DEALWISE_CATALOG_DIR", fixture.dir().as_str()), ("DEALWISE_LLM_PROVIDER", "ollama")],
        || {
            let result = doctor::run(&LoadOptions::default(), true);
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "pass");
            let statuses = payload["checks"]
                .as_array()
                .map(|checks| {
                    checks
                        .iter()
                        .map(|check| {
                            format!(
                                "{}={}",
                                check["name"].as_str().unwrap_or_default(),
                                check["status"].as_str().unwrap_or_default()
                            )
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            assert_eq!(
                statuses,
                [
                    "config_validation=pass",
                    "catalog_load=pass",
                    "upload_feed=skipped",
                    "llm_credential=pass",
                ]
            );
        },
    );
}

#[test]
fn doctor_skips_dependent_checks_when_config_is_invalid() {
    with_env(&[("DEALWISE_LOGGING_LEVEL", "loud")], || {
        let result = doctor::run(&LoadOptions::default(), true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][3]["status"], "skipped");
    });
}

#[test]
fn config_output_redacts_secrets_and_names_sources() {
    let fixture = catalog_fixture();
    with_env(
        &[
            ("DEALWISE_CATALOG_DIR", fixture.dir().as_str()),
            ("DEALWISE_LLM_API_KEY", "sk-test-very-secret"),
            ("DEALWISE_FEED_SECRET_ACCESS_KEY", "wJalrXUtnFEMI"),
        ],
        || {
            let result = config::run(&LoadOptions::default());
            assert_eq!(result.exit_code, 0);
            let output = result.output;

            assert!(output.contains("- llm.api_key = sk-*** (source: env (DEALWISE_LLM_API_KEY))"));
            assert!(output.contains("- feed.secret_access_key = <redacted>"));
            assert!(output.contains("- llm.model = gpt-3.5-turbo (source: default)"));
            assert!(!output.contains("very-secret"));
            assert!(!output.contains("wJalrXUtnFEMI"));
        },
    );
}

#[test]
fn openai_key_fallback_is_attributed() {
    let fixture = catalog_fixture();
    with_env(
        &[("DEALWISE_CATALOG_DIR", fixture.dir().as_str()), ("OPENAI_API_KEY", "sk-fallback")],
        || {
            let output = config::run(&LoadOptions::default()).output;
            assert!(output.contains("- llm.api_key = sk-*** (source: env (OPENAI_API_KEY))"));
        },
    );
}

#[test]
fn config_with_invalid_settings_exits_with_config_code() {
    with_env(&[("DEALWISE_LLM_TIMEOUT_SECS", "0")], || {
        let result = config::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["error_class"], "config_validation");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("The configuration is invalid."), "{message}");
        assert!(message.contains("llm.timeout_secs"), "{message}");
    });
}

#[test]
fn anthropic_provider_reports_its_own_default_model() {
    let fixture = catalog_fixture();
    with_env(
        &[
            ("DEALWISE_CATALOG_DIR", fixture.dir().as_str()),
            ("DEALWISE_LLM_PROVIDER", "anthropic"),
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
        ],
        || {
            let output = config::run(&LoadOptions::default()).output;
            assert!(output
                .contains("- llm.provider = anthropic (source: env (DEALWISE_LLM_PROVIDER))"));
            assert!(output.contains("- llm.model = claude-3-5-haiku-latest (source: default)"));
        },
    );
}

struct CatalogFixture {
    dir: TempDir,
}

impl CatalogFixture {
    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn dir(&self) -> String {
        self.path().display().to_string()
    }

    fn write_feed(&self) -> String {
        let path = self.path().join("uploaded_from_salesforce.csv");
        fs::write(
            &path,
            "Base Name,Product,Industry\nGadget,,Energy\n,Widget,Apparel\nMystery,,Energy\n",
        )
        .expect("write feed");
        path.display().to_string()
    }
}

fn catalog_fixture() -> CatalogFixture {
    let dir = TempDir::new().expect("tempdir");
    let header = "Name,Code,Minimum Order Quantity,Payment Terms\n";
    let write = |file: &str, contents: &str| {
        fs::write(dir.path().join(file), contents).expect("write catalogue table");
    };

    write(
        "Base.csv",
        "Base Name,Base Code,Minimum Order Quantity,Payment Terms\n\
         Widget,W1,10,Net 15\n\
         Gadget,G1,5,Net 45\n\
         Broken,B1,lots,Net 15\n",
    );
    write("Apparel.csv", &format!("{header}Widget-A,WA1,50,Net 30\n"));
    write("Construction.csv", header);
    write("Energy.csv", &format!("{header}Gadget-E,GE1,20,Net 20\n"));
    write("Hospitality.csv", header);
    write("Transportation.csv", header);

    CatalogFixture { dir }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "DEALWISE_CATALOG_DIR",
        "DEALWISE_CATALOG_BASE_FILE",
        "DEALWISE_CATALOG_INDUSTRIES",
        "DEALWISE_FEED_SOURCE",
        "DEALWISE_FEED_PATH",
        "DEALWISE_FEED_BUCKET",
        "DEALWISE_FEED_KEY",
        "DEALWISE_FEED_REGION",
        "DEALWISE_FEED_ENDPOINT_URL",
        "DEALWISE_FEED_ACCESS_KEY_ID",
        "DEALWISE_FEED_SECRET_ACCESS_KEY",
        "DEALWISE_LLM_PROVIDER",
        "DEALWISE_LLM_API_KEY",
        "DEALWISE_LLM_BASE_URL",
        "DEALWISE_LLM_MODEL",
        "DEALWISE_LLM_TIMEOUT_SECS",
        "DEALWISE_LLM_MAX_TOKENS",
        "DEALWISE_LOGGING_LEVEL",
        "DEALWISE_LOGGING_FORMAT",
        "DEALWISE_LOG_LEVEL",
        "DEALWISE_LOG_FORMAT",
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
