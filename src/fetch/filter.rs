//! Channel filter predicates.
//!
//! Every predicate is an independent conjunct, so the order they are checked
//! in does not change the result. Filtering only looks at the records it is
//! given and never calls Slack.

use crate::models::ChannelRecord;
use chrono::{DateTime, TimeDelta, Utc};

/// Restrict by the archived flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelStatus {
    #[default]
    All,
    Active,
    Archived,
}

impl ChannelStatus {
    pub fn matches(&self, channel: &ChannelRecord) -> bool {
        match self {
            ChannelStatus::All => true,
            ChannelStatus::Active => !channel.archived,
            ChannelStatus::Archived => channel.archived,
        }
    }
}

/// Channel creator given either as a user ID or an email address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorMatch {
    Id(String),
    Email(String),
}

impl CreatorMatch {
    /// Anything containing `@` is an email address
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains('@') {
            CreatorMatch::Email(raw.to_string())
        } else {
            CreatorMatch::Id(raw.to_string())
        }
    }

    pub fn matches(&self, channel: &ChannelRecord) -> bool {
        match self {
            CreatorMatch::Id(id) => channel.creator_id.as_deref() == Some(id.as_str()),
            CreatorMatch::Email(email) => channel
                .creator_email()
                .is_some_and(|e| e.eq_ignore_ascii_case(email)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelFilter {
    pub status: ChannelStatus,
    pub creator: Option<CreatorMatch>,
    /// Archived no more than N days ago (inclusive); 0 disables the window
    pub archived_within_days: Option<u32>,
    /// Created no more than N days ago (inclusive); 0 disables the window
    pub created_within_days: Option<u32>,
    pub zero_members: bool,
}

/// A window reaching past the representable date range has no lower bound.
fn within_days(timestamp: DateTime<Utc>, days: u32, now: DateTime<Utc>) -> bool {
    match TimeDelta::try_days(i64::from(days)).and_then(|window| now.checked_sub_signed(window)) {
        Some(cutoff) => timestamp >= cutoff,
        None => true,
    }
}

impl ChannelFilter {
    pub fn matches(&self, channel: &ChannelRecord, now: DateTime<Utc>) -> bool {
        if !self.status.matches(channel) {
            return false;
        }

        if let Some(creator) = &self.creator {
            if !creator.matches(channel) {
                return false;
            }
        }

        if let Some(days) = self.archived_within_days.filter(|d| *d > 0) {
            let recently_archived = channel.archived
                && channel
                    .archived_at
                    .is_some_and(|at| within_days(at, days, now));
            if !recently_archived {
                return false;
            }
        }

        if let Some(days) = self.created_within_days.filter(|d| *d > 0) {
            if !within_days(channel.created_at, days, now) {
                return false;
            }
        }

        !self.zero_members || channel.member_count == 0
    }

    /// Matching channels, in their original order
    pub fn apply(&self, channels: &[ChannelRecord], now: DateTime<Utc>) -> Vec<ChannelRecord> {
        channels
            .iter()
            .filter(|c| self.matches(c, now))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelId, CreatorInfo};
    use chrono::Duration;

    fn channel(id: &str, archived_days_ago: Option<i64>, members: u64) -> ChannelRecord {
        let now = Utc::now();
        ChannelRecord {
            id: ChannelId::new(id),
            name: id.to_lowercase(),
            creator_id: Some("U1".to_string()),
            creator: Some(CreatorInfo {
                id: "U1".to_string(),
                email: Some("Owner@Example.com".to_string()),
                ..Default::default()
            }),
            created_at: now - Duration::days(100),
            archived: archived_days_ago.is_some(),
            archived_at: archived_days_ago.map(|d| now - Duration::days(d)),
            updated_at: None,
            member_count: members,
            topic: None,
            purpose: None,
        }
    }

    fn ids(channels: &[ChannelRecord]) -> Vec<&str> {
        channels.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let channels = vec![channel("C1", None, 3), channel("C2", Some(5), 0)];
        let kept = ChannelFilter::default().apply(&channels, Utc::now());
        assert_eq!(ids(&kept), vec!["C1", "C2"]);
    }

    #[test]
    fn test_status_filter() {
        let channels = vec![channel("C1", None, 3), channel("C2", Some(5), 0)];
        let now = Utc::now();

        let active = ChannelFilter {
            status: ChannelStatus::Active,
            ..Default::default()
        };
        assert_eq!(ids(&active.apply(&channels, now)), vec!["C1"]);

        let archived = ChannelFilter {
            status: ChannelStatus::Archived,
            ..Default::default()
        };
        assert_eq!(ids(&archived.apply(&channels, now)), vec!["C2"]);
    }

    #[test]
    fn test_archived_and_zero_members_is_intersection() {
        let channels = vec![
            channel("ARCHIVED_EMPTY", Some(5), 0),
            channel("ARCHIVED_FULL", Some(5), 4),
            channel("ACTIVE_EMPTY", None, 0),
            channel("ACTIVE_FULL", None, 9),
        ];
        let filter = ChannelFilter {
            status: ChannelStatus::Archived,
            zero_members: true,
            ..Default::default()
        };
        assert_eq!(
            ids(&filter.apply(&channels, Utc::now())),
            vec!["ARCHIVED_EMPTY"]
        );
    }

    #[test]
    fn test_archived_days_ago_boundaries() {
        let now = Utc::now();
        let mut exactly_thirty = channel("C30", None, 1);
        exactly_thirty.archived = true;
        exactly_thirty.archived_at = Some(now - Duration::days(30));

        let channels = vec![
            channel("C29", Some(29), 1),
            exactly_thirty,
            channel("C31", Some(31), 1),
        ];
        let filter = ChannelFilter {
            archived_within_days: Some(30),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&channels, now)), vec!["C29", "C30"]);
    }

    #[test]
    fn test_archived_days_ago_skips_active_and_unknown_archive_time() {
        let mut unknown = channel("UNKNOWN", Some(1), 1);
        unknown.archived_at = None;
        let channels = vec![channel("ACTIVE", None, 1), unknown];

        let filter = ChannelFilter {
            archived_within_days: Some(365),
            ..Default::default()
        };
        assert!(filter.apply(&channels, Utc::now()).is_empty());
    }

    #[test]
    fn test_created_days_ago() {
        let now = Utc::now();
        let mut recent = channel("RECENT", None, 1);
        recent.created_at = now - Duration::days(2);
        let channels = vec![recent, channel("OLD", None, 1)];

        let filter = ChannelFilter {
            created_within_days: Some(7),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&channels, now)), vec!["RECENT"]);
    }

    #[test]
    fn test_huge_day_window_keeps_everything_in_range() {
        let now = Utc::now();
        let mut ancient = channel("ANCIENT", Some(1), 1);
        ancient.created_at = DateTime::<Utc>::MIN_UTC;
        let channels = vec![ancient, channel("ACTIVE", None, 1)];

        let filter = ChannelFilter {
            archived_within_days: Some(u32::MAX),
            created_within_days: Some(u32::MAX),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&channels, now)), vec!["ANCIENT"]);
    }

    #[test]
    fn test_zero_days_means_no_window() {
        let now = Utc::now();
        let channels = vec![channel("OLD_ARCHIVE", Some(400), 1), channel("ACTIVE", None, 1)];

        let created = ChannelFilter {
            created_within_days: Some(0),
            ..Default::default()
        };
        assert_eq!(ids(&created.apply(&channels, now)), vec!["OLD_ARCHIVE", "ACTIVE"]);

        let archived = ChannelFilter {
            archived_within_days: Some(0),
            ..Default::default()
        };
        assert_eq!(ids(&archived.apply(&channels, now)), vec!["OLD_ARCHIVE", "ACTIVE"]);
    }

    #[test]
    fn test_creator_by_id_and_email() {
        let mut other = channel("OTHER", None, 1);
        other.creator_id = Some("U2".to_string());
        other.creator = None;
        let channels = vec![channel("MINE", None, 1), other];
        let now = Utc::now();

        let by_id = ChannelFilter {
            creator: Some(CreatorMatch::parse("U2")),
            ..Default::default()
        };
        assert_eq!(ids(&by_id.apply(&channels, now)), vec!["OTHER"]);

        let by_email = ChannelFilter {
            creator: Some(CreatorMatch::parse("owner@example.com")),
            ..Default::default()
        };
        assert_eq!(ids(&by_email.apply(&channels, now)), vec!["MINE"]);
    }

    #[test]
    fn test_creator_parse() {
        assert_eq!(
            CreatorMatch::parse(" a@b.co "),
            CreatorMatch::Email("a@b.co".to_string())
        );
        assert_eq!(CreatorMatch::parse("U123"), CreatorMatch::Id("U123".to_string()));
    }

    #[test]
    fn test_three_channel_scenario() {
        let channels = vec![
            channel("TEN_DAYS", Some(10), 2),
            channel("ACTIVE", None, 2),
            channel("FORTY_DAYS", Some(40), 2),
        ];
        let filter = ChannelFilter {
            status: ChannelStatus::Archived,
            archived_within_days: Some(30),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&channels, Utc::now())), vec!["TEN_DAYS"]);
    }
}
