pub mod dispatch;
pub mod exec;
pub mod policies;
pub mod run;
pub mod sql;

pub use dispatch::dispatch;

use rlscheck_core::RlsError;
use serde_json::json;

/// Print a pipeline failure and return its exit code. With `--json` the error also goes to
/// stdout so scripts always get a parseable document.
pub(crate) fn report_error(err: &RlsError, as_json: bool) -> i32 {
    let code = err.exit_code();
    eprintln!("❌ {} failed: {}", err.stage(), err);
    if as_json {
        let doc = json!({
            "error": err.to_string(),
            "stage": err.stage(),
            "exit_code": code,
        });
        println!("{doc}");
    }
    code
}
