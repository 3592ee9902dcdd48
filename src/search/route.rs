use crate::search::{RESULT_LIMIT, Routed};
use crate::store::{CandidateSource, StoreError};

/// Active candidates whose origin address mentions `from_city` and whose
/// destination address mentions `to_city`, newest first.
///
/// Plain case-insensitive substring matching on the free-text addresses, so
/// "Almaty" matches "Almaty, Abay street 10" as well as "near almaty". City
/// names are expected non-empty; an empty name matches every address.
pub fn find_by_route<T, S>(source: &S, from_city: &str, to_city: &str) -> Result<Vec<T>, StoreError>
where
    T: Routed,
    S: CandidateSource<T> + ?Sized,
{
    let from_city = from_city.trim().to_lowercase();
    let to_city = to_city.trim().to_lowercase();

    let mut matched: Vec<T> = source
        .all_active()?
        .into_iter()
        .filter(|candidate| {
            mentions(candidate.from_address(), &from_city)
                && mentions(candidate.to_address(), &to_city)
        })
        .collect();

    matched.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    matched.truncate(RESULT_LIMIT);
    Ok(matched)
}

fn mentions(address: &str, city: &str) -> bool {
    address.to_lowercase().contains(city)
}
