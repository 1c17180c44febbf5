/// Joins URL segments with single slashes, skipping empty segments.
#[must_use]
pub fn join_links<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut joined = String::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        if joined.is_empty() {
            joined.push_str(segment);
            continue;
        }

        let kept = joined.trim_end_matches('/').len();
        joined.truncate(kept);
        joined.push('/');
        joined.push_str(segment.trim_start_matches('/'));
    }
    joined
}
