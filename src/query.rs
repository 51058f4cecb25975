//! Listing query engine: filter and sort selectors over a user's listing
//! set, and offer/request classification of search hits.
//!
//! Selectors arrive from the command layer as raw strings and parse via
//! `FromStr`; an unknown value is an `Error::InvalidSelector`, never a
//! silent default. Filtering happens before sorting, and both are total
//! over any listing set, including the empty one.

use crate::db::{self, DbPool};
use crate::errors::{Error, Result};
use crate::models::Listing;
use std::cmp::Ordering;
use std::str::FromStr;

/// Which subset of a user's listings to return.
///
/// `Have`/`Want`/`Both` are presence predicates over the two quantity maps:
/// together with the doubly-empty degenerate listing (which matches none of
/// them) they partition the listing set, and `All` covers the union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFilter {
    All,
    Have,
    Want,
    Both,
}

impl FromStr for ListingFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ListingFilter::All),
            "have" => Ok(ListingFilter::Have),
            "want" => Ok(ListingFilter::Want),
            "both" => Ok(ListingFilter::Both),
            other => Err(Error::InvalidSelector(other.to_string())),
        }
    }
}

impl ListingFilter {
    pub fn matches(self, listing: &Listing) -> bool {
        match self {
            ListingFilter::All => true,
            ListingFilter::Have => listing.has_offers() && !listing.has_requests(),
            ListingFilter::Want => listing.has_requests() && !listing.has_offers(),
            ListingFilter::Both => listing.has_offers() && listing.has_requests(),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ListingFilter::All => "All listings",
            ListingFilter::Have => "HAVE only",
            ListingFilter::Want => "WANT only",
            ListingFilter::Both => "BOTH only",
        }
    }
}

/// Ordering applied to a listing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSort {
    Newest,
    Oldest,
    Most,
    Least,
}

impl FromStr for ListingSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(ListingSort::Newest),
            "oldest" => Ok(ListingSort::Oldest),
            "most" => Ok(ListingSort::Most),
            "least" => Ok(ListingSort::Least),
            other => Err(Error::InvalidSelector(other.to_string())),
        }
    }
}

impl ListingSort {
    /// Deterministic comparator for this sort order. Newest/Oldest break
    /// `created_at` ties by `id` (descending/ascending respectively);
    /// Most/Least break total-count ties by `created_at` descending.
    fn compare(self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            ListingSort::Newest => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id)),
            ListingSort::Oldest => a
                .created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id)),
            ListingSort::Most => b
                .total_items()
                .cmp(&a.total_items())
                .then_with(|| b.created_at.cmp(&a.created_at)),
            ListingSort::Least => a
                .total_items()
                .cmp(&b.total_items())
                .then_with(|| b.created_at.cmp(&a.created_at)),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ListingSort::Newest => "Newest first",
            ListingSort::Oldest => "Oldest first",
            ListingSort::Most => "Most items first",
            ListingSort::Least => "Least items first",
        }
    }
}

/// Applies a filter selector, keeping only matching listings.
pub fn apply_filter(listings: Vec<Listing>, filter: ListingFilter) -> Vec<Listing> {
    listings
        .into_iter()
        .filter(|listing| filter.matches(listing))
        .collect()
}

/// Applies a sort selector in place.
pub fn apply_sort(listings: &mut [Listing], sort: ListingSort) {
    listings.sort_by(|a, b| sort.compare(a, b));
}

/// Returns `owner`'s listings, filtered then sorted per the selectors.
///
/// Total over any listing set; re-applying the same selectors to its own
/// output yields the same sequence.
pub async fn filtered_sorted_listings(
    pool: &DbPool,
    owner: i64,
    filter: ListingFilter,
    sort: ListingSort,
) -> Result<Vec<Listing>> {
    let listings = db::get_user_listings(pool, owner).await?;
    let mut filtered = apply_filter(listings, filter);
    apply_sort(&mut filtered, sort);
    Ok(filtered)
}

/// Which classification(s) of search hits to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    All,
    Offers,
    Requests,
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(SearchType::All),
            "offers" => Ok(SearchType::Offers),
            "requests" => Ok(SearchType::Requests),
            other => Err(Error::InvalidSelector(other.to_string())),
        }
    }
}

/// A search hit tagged with how it matched. A single listing can be both an
/// offer match (fragment hit a `haves` key) and a request match (`wants`).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub listing: Listing,
    pub is_offer: bool,
    pub is_request: bool,
}

fn name_matches(names: impl Iterator<Item = impl AsRef<str>>, needle: &str) -> bool {
    names
        .into_iter()
        .any(|name| name.as_ref().to_lowercase().contains(needle))
}

/// Classifies listings against a name fragment, keeping only those whose
/// classification is selected by `search_type`.
pub fn classify_listings(
    listings: Vec<Listing>,
    fragment: &str,
    search_type: SearchType,
) -> Vec<SearchMatch> {
    let needle = fragment.to_lowercase();

    listings
        .into_iter()
        .filter_map(|listing| {
            let is_offer = name_matches(listing.haves.keys(), &needle);
            let is_request = name_matches(listing.wants.keys(), &needle);
            let selected = match search_type {
                SearchType::All => is_offer || is_request,
                SearchType::Offers => is_offer,
                SearchType::Requests => is_request,
            };
            selected.then_some(SearchMatch {
                listing,
                is_offer,
                is_request,
            })
        })
        .collect()
}

/// Searches all listings for a pet-name fragment and returns classified
/// matches per `search_type`.
pub async fn search_classified(
    pool: &DbPool,
    fragment: &str,
    search_type: SearchType,
) -> Result<Vec<SearchMatch>> {
    let candidates = db::search_listings(pool, fragment).await?;
    Ok(classify_listings(candidates, fragment, search_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{
        DirectInsertListingArgs, direct_insert_listing, pet_entry, setup_test_db,
    };
    use crate::models::{PetQuantities, Rarity};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn listing(
        id: i64,
        haves: PetQuantities,
        wants: PetQuantities,
        created_at: DateTime<Utc>,
    ) -> Listing {
        Listing {
            id,
            owner: 1,
            haves,
            wants,
            description: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample_set() -> Vec<Listing> {
        let t = base_time();
        vec![
            // have-only
            listing(
                1,
                pet_entry("Delve", &[(Rarity::Legendary, 5)]),
                PetQuantities::new(),
                t,
            ),
            // want-only
            listing(
                2,
                PetQuantities::new(),
                pet_entry("Kragg", &[(Rarity::Mythic, 2)]),
                t + Duration::hours(1),
            ),
            // both
            listing(
                3,
                pet_entry("Luma", &[(Rarity::Legendary, 1)]),
                pet_entry("Vyra", &[(Rarity::Mythic, 3)]),
                t + Duration::hours(2),
            ),
            // degenerate: both sides empty
            listing(
                4,
                PetQuantities::new(),
                PetQuantities::new(),
                t + Duration::hours(3),
            ),
        ]
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("all".parse::<ListingFilter>().unwrap(), ListingFilter::All);
        assert_eq!("HAVE".parse::<ListingFilter>().unwrap(), ListingFilter::Have);
        assert_eq!("newest".parse::<ListingSort>().unwrap(), ListingSort::Newest);
        assert_eq!(" least ".parse::<ListingSort>().unwrap(), ListingSort::Least);
        assert_eq!("offers".parse::<SearchType>().unwrap(), SearchType::Offers);

        assert!(matches!(
            "recent".parse::<ListingSort>(),
            Err(Error::InvalidSelector(_))
        ));
        assert!(matches!(
            "everything".parse::<ListingFilter>(),
            Err(Error::InvalidSelector(_))
        ));
        assert!(matches!(
            "buyers".parse::<SearchType>(),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_filter_buckets_partition_the_set() {
        let set = sample_set();

        let have = apply_filter(set.clone(), ListingFilter::Have);
        let want = apply_filter(set.clone(), ListingFilter::Want);
        let both = apply_filter(set.clone(), ListingFilter::Both);
        let all = apply_filter(set.clone(), ListingFilter::All);

        assert_eq!(have.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(want.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(both.iter().map(|l| l.id).collect::<Vec<_>>(), vec![3]);
        // The degenerate listing matches none of have/want/both, only all.
        assert_eq!(all.len(), 4);
        assert_eq!(have.len() + want.len() + both.len(), 3);
    }

    #[test]
    fn test_sort_newest_oldest_with_id_tiebreak() {
        let t = base_time();
        let mut set = vec![
            listing(2, pet_entry("Delve", &[(Rarity::Legendary, 1)]), PetQuantities::new(), t),
            listing(5, pet_entry("Delve", &[(Rarity::Legendary, 1)]), PetQuantities::new(), t),
            listing(
                1,
                pet_entry("Delve", &[(Rarity::Legendary, 1)]),
                PetQuantities::new(),
                t + Duration::hours(1),
            ),
        ];

        apply_sort(&mut set, ListingSort::Newest);
        assert_eq!(set.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 5, 2]);

        apply_sort(&mut set, ListingSort::Oldest);
        assert_eq!(set.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2, 5, 1]);
    }

    #[test]
    fn test_sort_most_orders_by_total_quantity() {
        let t = base_time();
        let mut set = vec![
            listing(1, pet_entry("Delve", &[(Rarity::Legendary, 5)]), PetQuantities::new(), t),
            listing(
                2,
                pet_entry("Delve", &[(Rarity::Legendary, 30)]),
                pet_entry("Kragg", &[(Rarity::Mythic, 20)]),
                t,
            ),
            listing(3, pet_entry("Luma", &[(Rarity::Mythic, 1)]), PetQuantities::new(), t),
        ];

        apply_sort(&mut set, ListingSort::Most);
        let totals: Vec<u64> = set.iter().map(Listing::total_items).collect();
        assert_eq!(totals, vec![50, 5, 1]);

        apply_sort(&mut set, ListingSort::Least);
        let totals: Vec<u64> = set.iter().map(Listing::total_items).collect();
        assert_eq!(totals, vec![1, 5, 50]);
    }

    #[test]
    fn test_sort_most_ties_broken_by_created_at_desc() {
        let t = base_time();
        let mut set = vec![
            listing(1, pet_entry("Delve", &[(Rarity::Legendary, 5)]), PetQuantities::new(), t),
            listing(
                2,
                pet_entry("Luma", &[(Rarity::Legendary, 5)]),
                PetQuantities::new(),
                t + Duration::hours(1),
            ),
        ];
        apply_sort(&mut set, ListingSort::Most);
        assert_eq!(set.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2, 1]);
        apply_sort(&mut set, ListingSort::Least);
        assert_eq!(set.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_filter_and_sort_are_idempotent_on_own_output() {
        let set = sample_set();
        let mut once = apply_filter(set, ListingFilter::All);
        apply_sort(&mut once, ListingSort::Most);

        let mut twice = apply_filter(once.clone(), ListingFilter::All);
        apply_sort(&mut twice, ListingSort::Most);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_and_sort_total_over_empty_input() {
        let mut empty: Vec<Listing> = Vec::new();
        apply_sort(&mut empty, ListingSort::Newest);
        assert!(apply_filter(empty, ListingFilter::Both).is_empty());
    }

    #[test]
    fn test_classification_offer_vs_request() {
        let t = base_time();
        let offer_listing = listing(
            1,
            pet_entry("Delve", &[(Rarity::Legendary, 5)]),
            PetQuantities::new(),
            t,
        );
        let request_listing = listing(
            2,
            PetQuantities::new(),
            pet_entry("Delve", &[(Rarity::Mythic, 1)]),
            t,
        );

        let matches = classify_listings(
            vec![offer_listing.clone(), request_listing.clone()],
            "del",
            SearchType::All,
        );
        assert_eq!(matches.len(), 2);
        assert!(matches[0].is_offer && !matches[0].is_request);
        assert!(!matches[1].is_offer && matches[1].is_request);

        // Narrowing the search type drops the other classification.
        let offers = classify_listings(
            vec![offer_listing.clone(), request_listing.clone()],
            "del",
            SearchType::Offers,
        );
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].listing.id, 1);

        let requests =
            classify_listings(vec![offer_listing, request_listing], "del", SearchType::Requests);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].listing.id, 2);
    }

    #[test]
    fn test_classification_listing_can_be_both() {
        let t = base_time();
        let both_sides = listing(
            1,
            pet_entry("Delve", &[(Rarity::Legendary, 5)]),
            pet_entry("Delve", &[(Rarity::Mythic, 2)]),
            t,
        );
        let matches = classify_listings(vec![both_sides], "Delve", SearchType::All);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].is_offer && matches[0].is_request);
    }

    #[tokio::test]
    async fn test_filtered_sorted_listings_end_to_end() -> Result<()> {
        let pool = setup_test_db().await?;
        let t = base_time();
        {
            let conn = pool.lock().unwrap();
            direct_insert_listing(&DirectInsertListingArgs {
                conn: &conn,
                owner: 10,
                haves: &pet_entry("Delve", &[(Rarity::Legendary, 5)]),
                wants: &PetQuantities::new(),
                description: None,
                created_at: t,
            })?;
            direct_insert_listing(&DirectInsertListingArgs {
                conn: &conn,
                owner: 10,
                haves: &pet_entry("Luma", &[(Rarity::Legendary, 2)]),
                wants: &PetQuantities::new(),
                description: None,
                created_at: t + Duration::hours(1),
            })?;
            // Another user's listing must never appear.
            direct_insert_listing(&DirectInsertListingArgs {
                conn: &conn,
                owner: 99,
                haves: &pet_entry("Kragg", &[(Rarity::Mythic, 9)]),
                wants: &PetQuantities::new(),
                description: None,
                created_at: t,
            })?;
        }

        let newest =
            filtered_sorted_listings(&pool, 10, ListingFilter::Have, ListingSort::Newest).await?;
        assert_eq!(newest.len(), 2);
        assert!(newest[0].created_at > newest[1].created_at);
        assert!(newest.iter().all(|l| l.owner == 10));

        let none =
            filtered_sorted_listings(&pool, 10, ListingFilter::Want, ListingSort::Newest).await?;
        assert!(none.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_search_classified_end_to_end() -> Result<()> {
        let pool = setup_test_db().await?;
        {
            let conn = pool.lock().unwrap();
            direct_insert_listing(&DirectInsertListingArgs {
                conn: &conn,
                owner: 1,
                haves: &pet_entry("Delve", &[(Rarity::Legendary, 5)]),
                wants: &pet_entry("Oblivion", &[(Rarity::Mythic, 1)]),
                description: Some("looking for Oblivion"),
                created_at: base_time(),
            })?;
        }

        let matches = search_classified(&pool, "obliv", SearchType::All).await?;
        assert_eq!(matches.len(), 1);
        assert!(matches[0].is_request);
        assert!(!matches[0].is_offer);

        let offers = search_classified(&pool, "obliv", SearchType::Offers).await?;
        assert!(offers.is_empty());
        Ok(())
    }
}
