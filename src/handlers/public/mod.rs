// handlers/public/mod.rs - routes reachable without a session
//
// Marketing and legal pages, the login/signup forms, public handbooks, the
// Supabase forwarder, the Stripe webhook and the health/debug probes.
pub mod auth;
pub mod debug;
pub mod handbook;
pub mod health;
pub mod pages;
pub mod proxy;
pub mod webhook;
