//! Headless counterparts of the pin list, pin item and pin manager elements.

pub mod item;
pub mod list;
pub mod manager;

pub use item::PinItemView;
pub use list::{PinList, INVITE_PARAM};
pub use manager::{PinManager, PINNING_SERVICES};
