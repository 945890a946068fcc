pub mod architecture;
pub mod root;
pub mod value;

pub use architecture::*;
pub use root::*;
pub use value::{Value, ValueType};
