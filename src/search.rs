use crate::remote::UserRecord;

/// Users whose name contains `query`, ignoring case, in their original order.
///
/// An empty query matches everyone.
pub fn filter_by_name<'a>(users: &'a [UserRecord], query: &str) -> Vec<&'a UserRecord> {
    let q = query.to_lowercase();
    if q.is_empty() {
        return users.iter().collect();
    }
    users
        .iter()
        .filter(|u| u.name.to_lowercase().contains(&q))
        .collect()
}
