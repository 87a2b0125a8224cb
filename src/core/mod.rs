pub mod draw;
pub mod gallery;
pub mod name;
pub mod roster;
pub mod round;
pub mod settings;
