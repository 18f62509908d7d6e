/// Completion reports over task records
///
/// Admins and managers read every record of their company in a date range,
/// or narrow it to one member; sellers read only their own. Statistics and
/// the per-member ranking cover the whole range while the returned records
/// are paged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::auth::session::Session;
use crate::models::task::TaskStatus;
use crate::models::task_record::TaskRecord;
use crate::store::{ReportFilter, StoreError, TaskStore, UserStore};

/// Longest range a single report may span, in days
pub const MAX_RANGE_DAYS: i64 = 366;

/// Default and maximum page sizes
pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 500;

/// Report errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("User is not a member of the company")]
    UnknownMember,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Report request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,

    /// Member to report on; ignored for sellers, who always get their own
    pub user_id: Option<Uuid>,

    pub limit: usize,
    pub offset: usize,
}

/// Counts by status over the report range
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,

    /// `completed / total` in percent, rounded to one decimal; 0 when empty
    pub completion_rate: f64,
}

impl CompletionStats {
    pub fn from_records(records: &[TaskRecord]) -> Self {
        let mut stats = CompletionStats {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            match record.status {
                TaskStatus::Done => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Pending => stats.pending += 1,
            }
        }

        if stats.total > 0 {
            let rate = stats.completed as f64 * 100.0 / stats.total as f64;
            stats.completion_rate = (rate * 10.0).round() / 10.0;
        }

        stats
    }
}

/// One member's line in the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStats {
    pub user_id: Uuid,
    pub user_name: String,
    pub stats: CompletionStats,
}

/// Groups records by user, most completions first
///
/// Ties go to the higher completion rate, then to the name.
pub fn rank_members(records: &[TaskRecord]) -> Vec<MemberStats> {
    let mut by_user: HashMap<Uuid, Vec<TaskRecord>> = HashMap::new();
    for record in records {
        by_user.entry(record.user_id).or_default().push(record.clone());
    }

    let mut ranking: Vec<MemberStats> = by_user
        .into_iter()
        .map(|(user_id, records)| MemberStats {
            user_id,
            user_name: records[0].user_name.clone(),
            stats: CompletionStats::from_records(&records),
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.stats
            .completed
            .cmp(&a.stats.completed)
            .then(b.stats.completion_rate.total_cmp(&a.stats.completion_rate))
            .then_with(|| a.user_name.cmp(&b.user_name))
    });

    ranking
}

/// A page of records plus range-wide statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub user_id: Option<Uuid>,
    pub stats: CompletionStats,
    pub per_user: Vec<MemberStats>,
    pub records: Vec<TaskRecord>,
    pub limit: usize,
    pub offset: usize,
}

/// Builds the report visible to the session
///
/// # Errors
///
/// - `InvalidRange` if `from` is after `to` or the range is too long
/// - `UnknownMember` if the requested member is not in the session's company
pub async fn task_report<S>(
    store: &S,
    session: &Session,
    query: ReportQuery,
) -> Result<TaskReport, ReportError>
where
    S: TaskStore + UserStore + ?Sized,
{
    if query.from > query.to {
        return Err(ReportError::InvalidRange(
            "`from` must not be after `to`".to_string(),
        ));
    }
    if (query.to - query.from).num_days() >= MAX_RANGE_DAYS {
        return Err(ReportError::InvalidRange(format!(
            "range must span fewer than {} days",
            MAX_RANGE_DAYS
        )));
    }

    let user_id = if !session.role.can_view_company_reports() {
        Some(session.user_id)
    } else if let Some(member) = query.user_id {
        let profile = store.find_profile(member).await?;
        if !profile.map_or(false, |p| p.company_id == session.company_id) {
            return Err(ReportError::UnknownMember);
        }
        Some(member)
    } else {
        None
    };

    let filter = ReportFilter {
        from: query.from,
        to: query.to,
        user_id,
    };

    let records = store.list_records(session.company_id, &filter).await?;
    let stats = CompletionStats::from_records(&records);
    let per_user = rank_members(&records);
    let limit = query.limit.clamp(1, MAX_LIMIT);

    debug!(
        user_id = %session.user_id,
        from = %query.from,
        to = %query.to,
        member = ?user_id,
        total = stats.total,
        "Report built"
    );

    Ok(TaskReport {
        from: query.from,
        to: query.to,
        user_id,
        stats,
        per_user,
        records: records.into_iter().skip(query.offset).take(limit).collect(),
        limit,
        offset: query.offset,
    })
}
