pub mod copy_data;
pub mod grant_role;
pub mod migrate;
