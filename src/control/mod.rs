pub mod controller;
pub mod fuzzy;

pub use controller::Controller;
pub use fuzzy::FuzzyController;
