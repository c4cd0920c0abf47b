//! Domain types for the bookstore API.

mod book;
mod cart;
mod id;
mod order;
mod query;
mod user;

pub use book::Book;
pub use cart::{Cart, CartItem};
pub use id::{BookId, CartId, CartItemId, OrderId, UserId};
pub use order::{Order, OrderItem, OrderStatus};
pub use query::{BookFilters, BookQuery, FilterPatch, SortKey};
pub use user::User;
