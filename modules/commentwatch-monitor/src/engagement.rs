/// True when a comment has at most `max_likes` likes.
/// A negative count is bad source data and never qualifies.
pub fn is_low_engagement(like_count: i64, max_likes: i64) -> bool {
    like_count >= 0 && like_count <= max_likes
}
