//! Domain types for ReplayLab

pub mod bar;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use ids::{IdGen, PositionId};
pub use order::{CloseAllTerms, CloseTerms, EntryTerms, ExitReason, OrderRequest, OrderType};
pub use position::{Position, PositionSide, Protection};
pub use trade::ClosedTrade;
