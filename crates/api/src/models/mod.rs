//! Domain types.
//!
//! These types represent validated domain objects separate from database row
//! types. Structs that double as API response bodies serialize with camelCase
//! field names, matching what the single-page client expects.

pub mod category;
pub mod notification;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use category::Category;
pub use notification::{NewNotification, Notification};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, ShippingAddress};
pub use payment::Payment;
pub use product::{NewProduct, Product};
pub use user::{Address, CartEntry, CartItem, OtpChallenge, User, UserProfile};
