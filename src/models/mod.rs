pub mod menu_item;
pub mod order;
pub mod restaurant;
pub mod user;

pub use menu_item::{MenuItem, NutritionalInfo};
pub use order::{LocationType, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
pub use restaurant::{Restaurant, RestaurantSettings};
pub use user::{Role, User};
