//! Social network clients used by followgraph.
//!
//! [`api::SocialApi`] is the seam the scraper talks to; [`twitter::TwitterApi`] is the
//! production implementation and [`paginate`] turns its page-level calls into complete
//! ID lists and bounded item lists.
pub mod api;
pub mod paginate;
pub mod twitter;

pub use api::{IdEndpoint, ItemEndpoint, SocialApi};
pub use paginate::{id_pages, paginate_ids, paginate_items};
pub use twitter::{PlatformError, TwitterApi};
