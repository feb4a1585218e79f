pub mod replay;
pub mod score;
pub mod validate;
