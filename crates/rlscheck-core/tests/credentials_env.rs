//! Credentials resolved from the process environment. Serialized: tests mutate env vars.

use rlscheck_core::{ConfigError, Credentials, LlmProvider};
use serial_test::serial;

const VARS: &[&str] = &[
    "SUPABASE_URL",
    "SUPABASE_KEY",
    "SUPABASE_SERVICE_ROLE_KEY",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "CLAUDE_API_KEY",
];

fn clear() {
    for v in VARS {
        std::env::remove_var(v);
    }
}

#[test]
#[serial]
fn reads_openai_credentials() {
    clear();
    std::env::set_var("SUPABASE_URL", "https://abc.supabase.co");
    std::env::set_var("SUPABASE_KEY", "service-key");
    std::env::set_var("OPENAI_API_KEY", "sk-test");

    let creds = Credentials::from_env(LlmProvider::OpenAI).unwrap();
    assert_eq!(creds.supabase_url, "https://abc.supabase.co");
    assert_eq!(creds.llm_api_key, "sk-test");
    assert!(!format!("{creds:?}").contains("sk-test"));
    clear();
}

#[test]
#[serial]
fn falls_back_to_service_role_and_claude_keys() {
    clear();
    std::env::set_var("SUPABASE_URL", "https://abc.supabase.co");
    std::env::set_var("SUPABASE_SERVICE_ROLE_KEY", "role-key");
    std::env::set_var("CLAUDE_API_KEY", "claude-key");

    let creds = Credentials::from_env(LlmProvider::Anthropic).unwrap();
    assert_eq!(creds.supabase_key, "role-key");
    assert_eq!(creds.llm_api_key, "claude-key");
    clear();
}

#[test]
#[serial]
fn missing_url_is_config_error() {
    clear();
    std::env::set_var("SUPABASE_KEY", "service-key");

    let err = Credentials::backend_from_env().unwrap_err();
    assert_eq!(err, ConfigError::MissingCredential("SUPABASE_URL"));
    clear();
}
