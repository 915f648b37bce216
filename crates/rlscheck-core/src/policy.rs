//! Policy fetcher: lists the active RLS policies of a table through an RPC.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::backend::RestClient;
use crate::errors::{BackendError, RlsError};
use crate::model::Policy;

/// Name of the server-side function that exposes `pg_policies`.
pub const POLICY_FUNCTION: &str = "get_policies";

/// SQL that installs [`POLICY_FUNCTION`]; printed by `rlscheck sql`.
pub const GET_POLICIES_SQL: &str = r#"CREATE OR REPLACE FUNCTION public.get_policies(target_table text)
RETURNS TABLE (
    table_name text,
    policy_name text,
    definition text,
    command text,
    permissive text
)
LANGUAGE sql
SECURITY DEFINER
SET search_path = public, pg_catalog
AS $$
    SELECT
        p.tablename::text,
        p.policyname::text,
        coalesce(p.qual, '') || CASE WHEN p.with_check IS NOT NULL
            THEN ' WITH CHECK ' || p.with_check ELSE '' END,
        p.cmd::text,
        p.permissive::text
    FROM pg_catalog.pg_policies p
    WHERE p.schemaname = 'public'
      AND p.tablename = target_table;
$$;

REVOKE ALL ON FUNCTION public.get_policies(text) FROM anon, authenticated;
"#;

/// Source of policies for a table.
#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn fetch_policies(&self, table: &str) -> Result<Vec<Policy>, RlsError>;
}

#[async_trait]
impl PolicySource for RestClient {
    async fn fetch_policies(&self, table: &str) -> Result<Vec<Policy>, RlsError> {
        info!(table = %table, "fetching policies");

        let raw = match self
            .rpc(POLICY_FUNCTION, &json!({ "target_table": table }))
            .await
        {
            Ok(raw) => raw,
            Err(e) if is_missing_function(&e) => {
                return Err(RlsError::SetupRequired {
                    function: POLICY_FUNCTION.to_string(),
                })
            }
            Err(source) => {
                return Err(RlsError::PolicyFetch {
                    table: table.to_string(),
                    source,
                })
            }
        };

        let policies = decode_policies(raw).map_err(|source| RlsError::PolicyFetch {
            table: table.to_string(),
            source,
        })?;
        debug!(table = %table, count = policies.len(), "received policies");
        Ok(policies)
    }
}

fn decode_policies(raw: serde_json::Value) -> Result<Vec<Policy>, BackendError> {
    if raw.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(raw).map_err(|e| BackendError::InvalidResponse {
        message: format!("failed to decode policies: {}", e),
    })
}

/// PostgREST reports an unknown RPC as `PGRST202`; older stacks surface Postgres `42883`.
pub(crate) fn is_missing_function(err: &BackendError) -> bool {
    let BackendError::Status { code, message, .. } = err else {
        return false;
    };
    if matches!(code.as_deref(), Some("PGRST202") | Some("42883")) {
        return true;
    }
    let msg = message.to_lowercase();
    msg.contains(POLICY_FUNCTION)
        && (msg.contains("does not exist") || msg.contains("could not find the function"))
}
