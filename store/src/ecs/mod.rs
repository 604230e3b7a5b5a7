pub mod component;
pub mod entity;
pub mod query;
pub mod storage;
pub(crate) mod util;
pub mod world;

pub use component::Component;
pub use entity::Handle;
pub use query::View;
pub use storage::Storage;
pub use world::World;
