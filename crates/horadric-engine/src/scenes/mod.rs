//! Built-in front end scenes

mod credits;
mod main_menu;

pub use credits::Credits;
pub use main_menu::MainMenu;
