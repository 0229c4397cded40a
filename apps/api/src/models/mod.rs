pub mod inspection;
pub mod property;
