//! Dashboard aggregates: account counters and chart series.
//!
//! All windows are computed against an injected `now` so the aggregates are
//! deterministic under test.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::Serialize;

use crate::store::DirectorySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    /// Active means `active && !blocked`, the same gate the login path uses.
    pub active_users: usize,
    pub blocked_users: usize,
    pub new_users_today: usize,
    pub new_users_week: usize,
    pub new_users_month: usize,
    pub users_with_two_factor: usize,
    pub total_roles: usize,
    pub total_permissions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardCharts {
    /// Daily account creations over the trailing 30 days, oldest day first.
    pub user_growth: ChartSeries,
    /// Accounts per role, in role creation order.
    pub role_distribution: ChartSeries,
}

pub fn stats(snapshot: &DirectorySnapshot, now: DateTime<Utc>) -> DashboardStats {
    let week_ago = now - Duration::days(7);
    let month_ago = now - Months::new(1);

    DashboardStats {
        total_users: snapshot.users.len(),
        active_users: snapshot
            .users
            .iter()
            .filter(|u| u.active && !u.blocked)
            .count(),
        blocked_users: snapshot.users.iter().filter(|u| u.blocked).count(),
        new_users_today: snapshot
            .users
            .iter()
            .filter(|u| u.created_at.date_naive() == now.date_naive())
            .count(),
        new_users_week: snapshot
            .users
            .iter()
            .filter(|u| u.created_at >= week_ago)
            .count(),
        new_users_month: snapshot
            .users
            .iter()
            .filter(|u| u.created_at >= month_ago)
            .count(),
        users_with_two_factor: snapshot
            .users
            .iter()
            .filter(|u| u.two_factor_confirmed_at.is_some())
            .count(),
        total_roles: snapshot.roles.len(),
        total_permissions: snapshot.permissions.len(),
    }
}

pub fn charts(snapshot: &DirectorySnapshot, now: DateTime<Utc>) -> DashboardCharts {
    let mut labels = Vec::with_capacity(30);
    let mut data = Vec::with_capacity(30);
    for offset in (0..30).rev() {
        let day = (now - Duration::days(offset)).date_naive();
        labels.push(format!("{:02}.{:02}.", day.day(), day.month()));
        data.push(
            snapshot
                .users
                .iter()
                .filter(|u| u.created_at.date_naive() == day)
                .count(),
        );
    }

    let role_labels = snapshot
        .roles
        .iter()
        .map(|r| r.name.as_str().to_string())
        .collect();
    let role_data = snapshot
        .roles
        .iter()
        .map(|role| {
            snapshot
                .users
                .iter()
                .filter(|u| u.roles.contains(&role.id))
                .count()
        })
        .collect();

    DashboardCharts {
        user_growth: ChartSeries { labels, data },
        role_distribution: ChartSeries {
            labels: role_labels,
            data: role_data,
        },
    }
}
