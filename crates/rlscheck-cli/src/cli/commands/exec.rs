use rlscheck_core::config::load_config;
use rlscheck_core::report::json::read_test_cases;
use rlscheck_core::{ConfigError, Credentials, RlsError, RlsTester, TesterConfig};

use super::super::args::ExecArgs;
use super::report_error;
use crate::exit_codes::{SUCCESS, TEST_FAILED};

pub async fn run(args: ExecArgs) -> anyhow::Result<i32> {
    let config = match build_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => return Ok(report_error(&RlsError::from(e), args.json)),
    };
    let cases = match read_test_cases(&args.file) {
        Ok(c) => c,
        Err(e) => return Ok(report_error(&RlsError::Config(invalid_file(&e)), args.json)),
    };
    if cases.is_empty() {
        let err = ConfigError::Invalid {
            field: "file",
            reason: format!("{} contains no test cases", args.file.display()),
        };
        return Ok(report_error(&RlsError::Config(err), args.json));
    }
    let table = args
        .table
        .clone()
        .or_else(|| cases.first().map(|c| c.path.trim_matches('/').to_string()))
        .unwrap_or_default();

    let (url, key) = match Credentials::backend_from_env() {
        Ok(pair) => pair,
        Err(e) => return Ok(report_error(&RlsError::from(e), args.json)),
    };
    let tester = match RlsTester::backend_only(config, &url, &key) {
        Ok(t) => t,
        Err(e) => return Ok(report_error(&e, args.json)),
    };

    let outcome = match tester.execute_cases(&table, &cases).await {
        Ok(o) => o,
        Err(e) => return Ok(report_error(&e, args.json)),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    }
    if !args.quiet {
        eprintln!("Results: {}", outcome.results_path.display());
    }

    Ok(if outcome.summary.all_passed() {
        SUCCESS
    } else {
        TEST_FAILED
    })
}

fn build_config(args: &ExecArgs) -> Result<TesterConfig, ConfigError> {
    let mut cfg = load_config(&args.config)?;
    if let Some(ms) = args.timeout_ms {
        cfg = cfg.with_timeout_ms(ms);
    }
    if let Some(n) = args.retries {
        cfg = cfg.with_retry_attempts(n);
    }
    if args.quiet {
        cfg = cfg.with_verbose(false);
    }
    if let Some(dir) = &args.results_dir {
        let tests_dir = cfg.tests_dir.clone();
        cfg = cfg.with_output_dirs(tests_dir, dir.clone());
    }
    cfg.validate()?;
    Ok(cfg)
}

/// A case file we cannot read is a usage problem, not an infrastructure one.
fn invalid_file(err: &RlsError) -> ConfigError {
    ConfigError::Invalid {
        field: "file",
        reason: err.to_string(),
    }
}
