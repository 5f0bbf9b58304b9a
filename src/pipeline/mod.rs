pub mod backend;
pub mod cards;
pub mod followup;
pub mod import;
pub mod safety;
