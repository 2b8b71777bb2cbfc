// storefront/src/models/mod.rs

//! Data structures representing database entities and request payloads.

pub mod checkout;
pub mod inventory;
pub mod order;
pub mod order_item;
pub mod product;

pub use checkout::{CheckoutItem, CheckoutRequest, ValidCheckout};
pub use inventory::{InventorySettings, InventorySummary, SettingUpdate};
pub use order::{NewOrder, Order, OrderStatus, OrderWithItems};
pub use order_item::{NewLineItem, OrderLineItem};
pub use product::{NewProduct, Product, ProductFilter, ProductPatch};
