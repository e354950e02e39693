pub mod professionals;
pub mod surgeries;
pub mod token;
