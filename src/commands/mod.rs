pub mod admin;
mod general;
pub mod listing;
pub mod pricing;
pub mod utils;

pub use admin::{
    admin_clear_user_listings, admin_delete_listing, admin_edit_listing, admin_list,
    admin_listings,
};
pub use general::{help, pets, ping};
pub use listing::{create_listing, delete_listing, edit_listing, my_listings, search};
pub use pricing::{market_overview, price_chart, record_trade};
