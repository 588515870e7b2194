// Expand a there-and-back route into one traversable path: A B C -> A B C B A.
pub fn double_route<T: Clone>(stops: &[T]) -> Vec<T> {
    let mut route = Vec::with_capacity(stops.len() * 2);
    route.extend_from_slice(stops);
    if stops.len() > 1 {
        route.extend(stops.iter().rev().skip(1).cloned());
    }
    route
}

// Length of the forward part of a stored route (inverse of `double_route`).
pub const fn forward_len(stored_len: usize, is_round_trip: bool) -> usize {
    if is_round_trip { stored_len } else { stored_len.div_ceil(2) }
}

pub fn get_time_str(minutes: f64) -> String {
    let total_seconds = (minutes * 60.0).round() as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
