pub mod clock;
pub mod draft;
pub mod errors;
pub mod money;
pub mod order;
pub mod ports;
