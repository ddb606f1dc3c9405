pub mod stripe;
pub mod supabase;

pub use stripe::{StripeClient, StripeError, StripeEvent};
pub use supabase::{AuthSession, SignUpOutcome, SupabaseClient, SupabaseError, SupabaseUser};
