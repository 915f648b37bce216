use rlscheck_core::GET_POLICIES_SQL;

use crate::exit_codes::SUCCESS;

/// Install SQL on stdout, hints on stderr, so the output can be piped into psql.
pub fn run() -> i32 {
    eprintln!("-- Run this once in the Supabase SQL editor (or psql) to enable policy listing:");
    print!("{GET_POLICIES_SQL}");
    SUCCESS
}
