pub mod note;
pub mod item;
pub mod holdings;
pub mod instance;
pub mod user;
pub mod tenant_record;
pub mod traits;

pub use note::{CirculationNote, CirculationNoteType, Note, NoteBearing};
pub use item::{Item, ItemStatus, NamedReference};
pub use holdings::{ElectronicAccess, Holdings};
pub use instance::{Instance, CONSORTIUM_SOURCE_PREFIX, MARC_SOURCE};
pub use user::{Personal, User};
pub use tenant_record::TenantRecord;
pub use traits::{HasElectronicAccess, HasStatisticalCodes};
