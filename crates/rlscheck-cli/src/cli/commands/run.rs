use rlscheck_core::config::load_config;
use rlscheck_core::{ConfigError, Credentials, RlsError, RlsTester, TesterConfig};

use super::super::args::RunArgs;
use super::report_error;
use crate::exit_codes::{SUCCESS, TEST_FAILED};

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let config = match build_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => return Ok(report_error(&RlsError::from(e), args.json)),
    };
    let creds = match Credentials::from_env(config.llm.provider) {
        Ok(c) => c,
        Err(e) => return Ok(report_error(&RlsError::from(e), args.json)),
    };
    let tester = match RlsTester::from_credentials(config, &creds) {
        Ok(t) => t,
        Err(e) => return Ok(report_error(&e, args.json)),
    };

    let outcome = match tester.run(&args.table).await {
        Ok(outcome) => outcome,
        Err(e) => return Ok(report_error(&e, args.json)),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    }
    if !args.quiet {
        if let Some(p) = &outcome.test_cases_path {
            eprintln!("Test cases: {}", p.display());
        }
        eprintln!("Results:    {}", outcome.results_path.display());
    }

    Ok(if outcome.summary.all_passed() {
        SUCCESS
    } else {
        TEST_FAILED
    })
}

/// File config first, then flags.
pub(crate) fn build_config(args: &RunArgs) -> Result<TesterConfig, ConfigError> {
    let mut cfg = load_config(&args.config)?;

    if let Some(ms) = args.timeout_ms {
        cfg = cfg.with_timeout_ms(ms);
    }
    if let Some(n) = args.retries {
        cfg = cfg.with_retry_attempts(n);
    }
    if let Some(level) = args.coverage {
        cfg = cfg.with_coverage(level);
    }
    if let Some(n) = args.test_count {
        cfg = cfg.with_test_count(n);
    }
    if args.quiet {
        cfg = cfg.with_verbose(false);
    }
    if args.suggest_fixes {
        cfg = cfg.with_suggest_fixes(true);
    }
    if let Some(provider) = args.provider {
        cfg.llm.provider = provider;
        // A model configured for another vendor would not resolve.
        if args.model.is_none() {
            cfg.llm.model = None;
        }
    }
    if let Some(model) = &args.model {
        cfg.llm.model = Some(model.clone());
    }
    if args.tests_dir.is_some() || args.results_dir.is_some() {
        let tests_dir = args.tests_dir.clone().unwrap_or_else(|| cfg.tests_dir.clone());
        let results_dir = args
            .results_dir
            .clone()
            .unwrap_or_else(|| cfg.results_dir.clone());
        cfg = cfg.with_output_dirs(tests_dir, results_dir);
    }

    cfg.validate()?;
    Ok(cfg)
}
