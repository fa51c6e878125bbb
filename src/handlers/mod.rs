// handlers/mod.rs - Route handlers split by security tier
//
// Public (no session) → Protected (session cookie, when ENFORCE_AUTH is on)
pub mod public;
pub mod protected;
