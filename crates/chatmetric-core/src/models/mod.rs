pub mod message;
pub mod score;
pub mod session;
