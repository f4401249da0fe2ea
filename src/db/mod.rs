pub mod dashboard;
pub mod menu_items;
pub mod orders;
pub mod restaurants;
pub mod users;
