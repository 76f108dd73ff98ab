// Per record type validators and mutators

pub mod holdings;
pub mod instance;
pub mod item;
pub mod shared;
pub mod user;

pub use holdings::{HoldingsHandler, HoldingsKind};
pub use instance::{InstanceHandler, InstanceKind};
pub use item::{is_status_transition_allowed, ItemHandler, ItemKind};
pub use user::{parse_expiration_date, UserHandler, UserKind};
