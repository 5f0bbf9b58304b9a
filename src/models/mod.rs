pub mod card;
pub mod enums;
pub mod turn;

pub use card::*;
pub use enums::*;
pub use turn::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}
