/// Report endpoint
///
/// ```text
/// GET /v1/reports/tasks?from=2025-04-01&to=2025-04-30&user_id=...&limit=100&offset=0
/// ```
///
/// `to` defaults to today and `from` to 29 days before `to`. Admins and
/// managers may narrow the report to one member with `user_id`; sellers get
/// their own records only.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use tasktrack_shared::{
    auth::session::Session,
    report::{self, ReportQuery, TaskReport, DEFAULT_LIMIT},
};
use uuid::Uuid;

/// Report query parameters
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub user_id: Option<Uuid>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ReportParams {
    fn into_query(self) -> Result<ReportQuery, ApiError> {
        let to = self.to.unwrap_or_else(|| Utc::now().date_naive());
        let from = match self.from {
            Some(from) => from,
            None => to
                .checked_sub_signed(Duration::days(29))
                .ok_or_else(|| ApiError::BadRequest("`to` is out of range".to_string()))?,
        };

        Ok(ReportQuery {
            from,
            to,
            user_id: self.user_id,
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}

pub async fn task_report(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<ReportParams>,
) -> ApiResult<Json<TaskReport>> {
    let report = report::task_report(&*state.store, &session, params.into_query()?).await?;

    Ok(Json(report))
}
