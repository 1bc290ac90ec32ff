pub mod awards;
pub mod health;
