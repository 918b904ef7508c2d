//! Urgency header text for a number of whole days.

/// Formats whole days remaining as a band header.
///
/// ```rust
/// use doomsday_core::duration_label;
///
/// assert_eq!(duration_label(0), "NOW");
/// assert_eq!(duration_label(8), "1 WEEK, 1 DAY");
/// assert_eq!(duration_label(21), "3 WEEKS");
/// ```
pub fn duration_label(days: i64) -> String {
    match days {
        i64::MIN..=-1 => "THE DAWN OF TIME".to_string(),
        0 => "NOW".to_string(),
        1 => "1 DAY".to_string(),
        2..=6 => format!("{days} DAYS"),
        _ => {
            let weeks = days / 7;
            let remainder = days % 7;
            let mut label = if weeks == 1 {
                "1 WEEK".to_string()
            } else {
                format!("{weeks} WEEKS")
            };
            if remainder > 0 {
                label.push_str(", ");
                label.push_str(&duration_label(remainder));
            }
            label
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_day_and_week_rules() {
        let cases = [
            (-3, "THE DAWN OF TIME"),
            (-1, "THE DAWN OF TIME"),
            (0, "NOW"),
            (1, "1 DAY"),
            (2, "2 DAYS"),
            (6, "6 DAYS"),
            (7, "1 WEEK"),
            (8, "1 WEEK, 1 DAY"),
            (13, "1 WEEK, 6 DAYS"),
            (14, "2 WEEKS"),
            (39, "5 WEEKS, 4 DAYS"),
            (89, "12 WEEKS, 5 DAYS"),
        ];

        for (days, expected) in cases {
            assert_eq!(duration_label(days), expected, "days = {days}");
        }
    }
}
