/// Scans `items` once and reports every maximal run of mutually equal
/// neighbours as a half-open `[start, end)` range.
///
/// A run is reported only when `filter` accepts its first element. This is the
/// single primitive behind style runs, entity runs, decoration grouping and
/// raw encoding.
pub fn find_ranges<T, I, E, F, R>(items: I, mut are_equal: E, mut filter: F, mut on_range: R)
where
    I: IntoIterator<Item = T>,
    E: FnMut(&T, &T) -> bool,
    F: FnMut(&T) -> bool,
    R: FnMut(usize, usize),
{
    let mut iter = items.into_iter();
    let Some(mut run_value) = iter.next() else {
        return;
    };
    let mut cursor = 0usize;
    let mut index = 1usize;

    for next in iter {
        if !are_equal(&run_value, &next) {
            if filter(&run_value) {
                on_range(cursor, index);
            }
            cursor = index;
            run_value = next;
        }
        index += 1;
    }

    if filter(&run_value) {
        on_range(cursor, index);
    }
}

pub fn collect_ranges<T, I, E, F>(items: I, are_equal: E, filter: F) -> Vec<(usize, usize)>
where
    I: IntoIterator<Item = T>,
    E: FnMut(&T, &T) -> bool,
    F: FnMut(&T) -> bool,
{
    let mut out = Vec::new();
    find_ranges(items, are_equal, filter, |start, end| out.push((start, end)));
    out
}
