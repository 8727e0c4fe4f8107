use std::cmp::Ordering;

use saphy_database::model::leveling::UserProgress;

/// Leaderboard order: level descending, then XP descending.
pub fn rank_order(left: &UserProgress, right: &UserProgress) -> Ordering {
    right
        .level
        .cmp(&left.level)
        .then_with(|| right.xp.cmp(&left.xp))
}

/// Stable sort, so equal entries keep the order the store returned them in.
pub fn sort_for_leaderboard(entries: &mut [UserProgress]) {
    entries.sort_by(rank_order);
}

#[cfg(test)]
mod tests {
    use saphy_database::model::leveling::UserProgress;

    use super::sort_for_leaderboard;

    fn entry(user_id: u64, level: u64, xp: u64) -> UserProgress {
        UserProgress { user_id, xp, level }
    }

    #[test]
    fn orders_by_level_then_xp() {
        let mut entries = vec![entry(1, 2, 150), entry(2, 3, 10), entry(3, 2, 80)];
        sort_for_leaderboard(&mut entries);

        let pairs: Vec<(u64, u64)> = entries.iter().map(|e| (e.level, e.xp)).collect();
        assert_eq!(pairs, vec![(3, 10), (2, 150), (2, 80)]);
    }

    #[test]
    fn ties_keep_input_order() {
        let mut entries = vec![entry(7, 1, 5), entry(3, 1, 5), entry(9, 1, 5)];
        sort_for_leaderboard(&mut entries);

        let ids: Vec<u64> = entries.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![7, 3, 9]);
    }
}
