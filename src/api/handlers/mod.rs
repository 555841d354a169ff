pub mod files;
pub mod health;
pub mod selections;
pub mod transfers;
