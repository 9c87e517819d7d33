//! Incremental pagination module
//!
//! This module walks dynamically loading page content:
//! - Clicking a "reveal more" control until a target count or a stall
//! - Scrolling a page until its height stops growing
//! - Parsing item counts from indicator text

mod carousel;
mod count;
mod scroll;

pub use carousel::{CarouselLayout, CollectionReport, PaginationCollector, StopReason};
pub use count::{find_item_count, parse_item_count};
pub use scroll::{ScrollLayout, SCROLL_HEIGHT_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT};
