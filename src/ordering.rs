//! Display order for news listings and comment threads.
//!
//! The store hands back rows in whatever order SQLite produces; these
//! functions decide what the pages show.

use std::cmp::Reverse;

use crate::models::{Comment, News};

/// Newest first, at most `page_size` items. Equal dates fall back to id so the
/// order is total.
pub fn home_page(mut news: Vec<News>, page_size: usize) -> Vec<News> {
    news.sort_by(|a, b| {
        Reverse(a.date)
            .cmp(&Reverse(b.date))
            .then_with(|| a.id.cmp(&b.id))
    });
    news.truncate(page_size);
    news
}

/// Oldest first, independent of insertion order.
pub fn comment_thread(mut comments: Vec<Comment>) -> Vec<Comment> {
    comments.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
    comments
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn news(id: &str, date: NaiveDate) -> News {
        News {
            id: id.to_string(),
            title: format!("Новость {}", id),
            text: "Просто текст.".to_string(),
            date,
        }
    }

    fn comment(id: &str, offset_days: i64) -> Comment {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Comment {
            id: id.to_string(),
            news_id: "n".to_string(),
            author_id: "a".to_string(),
            text: format!("Tекст {}", id),
            created: base + Duration::days(offset_days),
        }
    }

    #[test]
    fn test_home_page_caps_and_sorts_descending() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let page_size = 10;

        // Shuffled insertion order, one more item than fits
        let mut all = Vec::new();
        for index in [3, 10, 0, 7, 1, 9, 4, 2, 8, 6, 5] {
            all.push(news(&index.to_string(), today - Duration::days(index)));
        }

        let page = home_page(all, page_size);
        assert_eq!(page.len(), page_size);

        let dates: Vec<_> = page.iter().map(|n| n.date).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);

        // The oldest one is the one dropped
        assert!(page.iter().all(|n| n.id != "10"));
    }

    #[test]
    fn test_home_page_with_arbitrary_page_sizes() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let all: Vec<_> = (0..5)
            .map(|i| news(&i.to_string(), today - Duration::days(i)))
            .collect();

        assert!(home_page(all.clone(), 0).is_empty());
        assert_eq!(home_page(all.clone(), 3).len(), 3);
        assert_eq!(home_page(all, 50).len(), 5);
    }

    #[test]
    fn test_home_page_ties_are_deterministic() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let first = home_page(vec![news("b", day), news("a", day)], 10);
        let second = home_page(vec![news("a", day), news("b", day)], 10);
        assert_eq!(first, second);
        assert_eq!(first[0].id, "a");
    }

    #[test]
    fn test_comment_thread_sorts_ascending() {
        let comments = vec![
            comment("c5", 5),
            comment("c0", 0),
            comment("c9", 9),
            comment("c2", 2),
            comment("c1", 1),
        ];

        let thread = comment_thread(comments);
        let timestamps: Vec<_> = thread.iter().map(|c| c.created).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
        assert_eq!(thread[0].id, "c0");
        assert_eq!(thread[4].id, "c9");
    }

    #[test]
    fn test_comment_thread_empty() {
        assert!(comment_thread(Vec::new()).is_empty());
    }
}
