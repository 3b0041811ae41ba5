use super::RecordRepository;
use crate::error::StoreError;
use crate::record::{Record, Storable};

/// Types that can be used as `get` arguments: a single id yields an
/// `Option`, a list of ids yields the records that exist, in list order.
pub trait Gettable<T: Storable> {
    type Output;
    fn get_from(&self, repo: &RecordRepository<'_, T>) -> Result<Self::Output, StoreError>;
}

fn get_many<T: Storable>(
    repo: &RecordRepository<'_, T>,
    ids: &[&str],
) -> Result<Vec<Record<T>>, StoreError> {
    let mut found = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = repo.find_one(id)? {
            found.push(record);
        }
    }
    Ok(found)
}

// Single ID (&str)
impl<T: Storable> Gettable<T> for &str {
    type Output = Option<Record<T>>;

    fn get_from(&self, repo: &RecordRepository<'_, T>) -> Result<Self::Output, StoreError> {
        repo.find_one(self)
    }
}

// Single ID (String)
impl<T: Storable> Gettable<T> for String {
    type Output = Option<Record<T>>;

    fn get_from(&self, repo: &RecordRepository<'_, T>) -> Result<Self::Output, StoreError> {
        repo.find_one(self.as_str())
    }
}

// Single ID (&String)
impl<T: Storable> Gettable<T> for &String {
    type Output = Option<Record<T>>;

    fn get_from(&self, repo: &RecordRepository<'_, T>) -> Result<Self::Output, StoreError> {
        repo.find_one(self.as_str())
    }
}

// Slice of &str
impl<'a, T: Storable> Gettable<T> for &[&'a str] {
    type Output = Vec<Record<T>>;

    fn get_from(&self, repo: &RecordRepository<'_, T>) -> Result<Self::Output, StoreError> {
        get_many(repo, self)
    }
}

// Fixed-size arrays
impl<'a, T: Storable, const N: usize> Gettable<T> for [&'a str; N] {
    type Output = Vec<Record<T>>;

    fn get_from(&self, repo: &RecordRepository<'_, T>) -> Result<Self::Output, StoreError> {
        get_many(repo, self.as_slice())
    }
}

// Vec of &str
impl<'a, T: Storable> Gettable<T> for Vec<&'a str> {
    type Output = Vec<Record<T>>;

    fn get_from(&self, repo: &RecordRepository<'_, T>) -> Result<Self::Output, StoreError> {
        get_many(repo, self.as_slice())
    }
}
