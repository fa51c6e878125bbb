// handlers/protected/mod.rs - Protected handlers (session cookie required)
//
// Every route here writes data or lists it by the caller's email. The
// require_auth middleware injects an AuthUser extension before these run;
// with ENFORCE_AUTH=false the extension is absent, hence the Option.
use serde::Deserialize;

pub mod applications;
pub mod jobs;

/// `?email=` filter shared by the per-user listings
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}
