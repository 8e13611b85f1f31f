use dealwise_core::catalog::load_catalog;
use dealwise_core::config::{AppConfig, FeedSource, LoadOptions};
use dealwise_storage::load_upload_feed;
use serde::Serialize;

use crate::commands::{build_runtime, feed_warning, CommandResult};

pub const EXIT_CHECKS_FAILED: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub overall_status: CheckStatus,
    pub summary: String,
    pub checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_CHECKS_FAILED } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

pub fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_catalog(&config));
            checks.push(check_upload_feed(&config));
            checks.push(check_llm_credential(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_load", "upload_feed", "llm_credential"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    match load_catalog(&config.catalog) {
        Ok(catalog) => DoctorCheck {
            name: "catalog_load",
            status: CheckStatus::Pass,
            details: format!(
                "{} base rows and {} industry tables from `{}`",
                catalog.base_len(),
                catalog.industry_len(),
                config.catalog.dir.display()
            ),
        },
        Err(error) => DoctorCheck {
            name: "catalog_load",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_upload_feed(config: &AppConfig) -> DoctorCheck {
    if config.feed.source == FeedSource::None {
        return DoctorCheck {
            name: "upload_feed",
            status: CheckStatus::Skipped,
            details: "no upload feed source configured".to_string(),
        };
    }

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "upload_feed",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    match runtime.block_on(load_upload_feed(&config.feed)) {
        Ok(Some(feed)) => DoctorCheck {
            name: "upload_feed",
            status: CheckStatus::Pass,
            details: format!("{} rows loaded", feed.len()),
        },
        Ok(None) => DoctorCheck {
            name: "upload_feed",
            status: CheckStatus::Skipped,
            details: "no upload feed source configured".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "upload_feed",
            status: CheckStatus::Fail,
            details: feed_warning(&error),
        },
    }
}

fn check_llm_credential(config: &AppConfig) -> DoctorCheck {
    let provider = config.llm.provider.as_str();
    if config.llm_credential_present() {
        DoctorCheck {
            name: "llm_credential",
            status: CheckStatus::Pass,
            details: format!("provider `{provider}` is usable with model `{}`", config.llm.model),
        }
    } else {
        DoctorCheck {
            name: "llm_credential",
            status: CheckStatus::Fail,
            details: format!(
                "no API key configured for provider `{provider}`; deal insights will be skipped"
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn human_output_marks_each_check() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck {
                    name: "config_validation",
                    status: CheckStatus::Pass,
                    details: "ok".to_string(),
                },
                DoctorCheck {
                    name: "upload_feed",
                    status: CheckStatus::Skipped,
                    details: "no upload feed source configured".to_string(),
                },
                DoctorCheck {
                    name: "llm_credential",
                    status: CheckStatus::Fail,
                    details: "missing".to_string(),
                },
            ],
        };

        let rendered = render_human(&report);
        assert!(rendered.starts_with("doctor: one or more readiness checks failed"));
        assert!(rendered.contains("- [ok] config_validation: ok"));
        assert!(rendered.contains("- [skip] upload_feed: no upload feed source configured"));
        assert!(rendered.contains("- [fail] llm_credential: missing"));
    }
}
