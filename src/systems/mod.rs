mod bookkeeping;
pub mod catastrophe;
pub mod climate;
pub mod ecosystem;

pub use bookkeeping::BookkeepingSystem;
pub use catastrophe::CatastropheSystem;
pub use climate::ClimateSystem;
pub use ecosystem::EcosystemSystem;
