pub mod area_cache;
pub mod availability;
pub mod composer;
pub mod numbering;
pub mod order_list;

pub use area_cache::AreaCache;
pub use availability::AreaAvailabilityChecker;
pub use composer::{ComposerSnapshot, ComposerState, EntryPoint, OrderComposer};
pub use numbering::{daily_number, number_orders, DailyNumber};
pub use order_list::{OrderListQuery, OrderRow, SortDirection, SortKey};
