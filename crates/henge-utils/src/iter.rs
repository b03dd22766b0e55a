//! Iterator adapters.

/// Zips two iterators of known and equal lengths.
///
/// # Panics
///
/// Panics if the iterators report different lengths.
pub fn zip_exact<A, B>(a: A, b: B) -> std::iter::Zip<A::IntoIter, B::IntoIter>
where
    A: IntoIterator,
    B: IntoIterator,
    A::IntoIter: ExactSizeIterator,
    B::IntoIter: ExactSizeIterator,
{
    let a = a.into_iter();
    let b = b.into_iter();
    assert_eq!(
        a.len(),
        b.len(),
        "zip_exact: iterator lengths do not match"
    );
    a.zip(b)
}
