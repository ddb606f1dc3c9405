// handlers/mod.rs - two-tier handler layout
//
// Public (no session required) → Protected (Supabase session required)
pub mod protected;
pub mod public;
