//! Exit codes for the `rlscheck` binary. Part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const TEST_FAILED: i32 = 1; // At least one case did not get its expected status
pub const CONFIG_ERROR: i32 = 2; // Bad config, missing credentials, or get_policies not installed
pub const INFRA_ERROR: i32 = 3; // Backend or LLM failure, or artifacts could not be written
