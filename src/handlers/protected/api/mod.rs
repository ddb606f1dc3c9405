// handlers/protected/api/mod.rs - JSON API under /api
//
// Every handler takes `AuthUser` and resolves the organization with
// `authorize`, which enforces the role the action needs.
pub mod billing;
pub mod documents;
pub mod handbook;
pub mod me;
pub mod members;
pub mod organizations;
