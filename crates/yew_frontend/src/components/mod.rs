pub mod controls;
pub mod display;
pub mod history;
pub mod upload;
