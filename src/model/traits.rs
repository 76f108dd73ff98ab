use super::holdings::{ElectronicAccess, Holdings};
use super::instance::Instance;
use super::item::Item;

/// Records carrying a list of statistical code ids
pub trait HasStatisticalCodes {
    fn statistical_code_ids(&self) -> &[String];
    fn set_statistical_code_ids(&mut self, ids: Vec<String>);
}

/// Records carrying electronic access entries
pub trait HasElectronicAccess {
    fn electronic_access(&self) -> &[ElectronicAccess];
    fn set_electronic_access(&mut self, entries: Vec<ElectronicAccess>);
}

macro_rules! statistical_codes {
    ($($ty:ty),*) => {
        $(
            impl HasStatisticalCodes for $ty {
                fn statistical_code_ids(&self) -> &[String] {
                    &self.statistical_code_ids
                }

                fn set_statistical_code_ids(&mut self, ids: Vec<String>) {
                    self.statistical_code_ids = ids;
                }
            }
        )*
    };
}

macro_rules! electronic_access {
    ($($ty:ty),*) => {
        $(
            impl HasElectronicAccess for $ty {
                fn electronic_access(&self) -> &[ElectronicAccess] {
                    &self.electronic_access
                }

                fn set_electronic_access(&mut self, entries: Vec<ElectronicAccess>) {
                    self.electronic_access = entries;
                }
            }
        )*
    };
}

statistical_codes!(Instance, Holdings, Item);
electronic_access!(Holdings, Item);
