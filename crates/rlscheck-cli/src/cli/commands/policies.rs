use rlscheck_core::{ConfigError, Credentials, PolicySource, RestClient, RlsError};

use super::super::args::PoliciesArgs;
use super::report_error;
use crate::exit_codes::SUCCESS;

pub async fn run(args: PoliciesArgs) -> anyhow::Result<i32> {
    let (url, key) = match Credentials::backend_from_env() {
        Ok(pair) => pair,
        Err(e) => return Ok(report_error(&RlsError::from(e), args.json)),
    };
    let client = match RestClient::new(&url, key) {
        Ok(c) => c,
        Err(e) => {
            let err = RlsError::Config(ConfigError::Invalid {
                field: "SUPABASE_URL",
                reason: e.to_string(),
            });
            return Ok(report_error(&err, args.json));
        }
    };

    let policies = match client.fetch_policies(&args.table).await {
        Ok(p) => p,
        Err(e) => return Ok(report_error(&e, args.json)),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&policies)?);
        return Ok(SUCCESS);
    }

    if policies.is_empty() {
        eprintln!("No RLS policies found on {}", args.table);
        return Ok(SUCCESS);
    }
    println!("Policies on {} ({}):", args.table, policies.len());
    for p in &policies {
        println!(
            "  {:<32} {:?} {:?}\n      {}",
            p.policy_name, p.command, p.permissive, p.definition
        );
    }
    Ok(SUCCESS)
}
