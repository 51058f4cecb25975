pub mod connection;
pub mod listings;
pub mod pets;
pub(crate) mod schema;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod trades;

pub use connection::{DbPool, init_db};
pub use listings::{
    UpdateListingArgs, create_listing, delete_listing, delete_user_listings, get_all_listings,
    get_listing, get_user_listings, search_listings, update_listing,
};
pub use pets::{get_all_pets, get_pet_by_name, seed_pets, suggest_pet_names};
pub use trades::{RecordTradeArgs, get_trades_where_gave, record_trade};
