use crate::{
    error::AppError,
    model::{attendance::AttendanceRecord, student::StudentRecord},
    scan::{AttendancePipeline, LedgerClock, ScanOutcome, ScanReport},
};
use actix_web::{HttpResponse, Responder, http::StatusCode, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Text decoded from the student's QR code
    #[schema(example = r#"{"id":42,"name":"Ali","CNIC":"4130112345671"}"#)]
    pub code_data: String,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    #[schema(value_type = String, format = "uuid")]
    pub scan_id: Uuid,
    #[schema(example = "committed")]
    pub outcome: String,
    #[schema(example = "Attendance marked successfully for Ali!")]
    pub message: String,
    pub student: Option<StudentRecord>,
}

impl From<ScanReport> for ScanResponse {
    fn from(report: ScanReport) -> Self {
        Self {
            scan_id: report.scan_id,
            outcome: report.outcome.kind().to_string(),
            message: report.outcome.message(),
            student: report.student,
        }
    }
}

fn status_for(outcome: &ScanOutcome) -> StatusCode {
    match outcome {
        ScanOutcome::Committed { .. } => StatusCode::OK,
        ScanOutcome::AlreadyMarked => StatusCode::CONFLICT,
        ScanOutcome::InvalidPayload => StatusCode::BAD_REQUEST,
        ScanOutcome::NotFound { .. } => StatusCode::NOT_FOUND,
        ScanOutcome::LookupError | ScanOutcome::WriteError => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Mark attendance from a scanned QR code
#[utoipa::path(
    post,
    path = "/api/attendance/scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Attendance committed", body = ScanResponse),
        (status = 400, description = "Invalid QR code", body = ScanResponse),
        (status = 404, description = "Student not found in the admission records", body = ScanResponse),
        (status = 409, description = "Attendance already marked for today", body = ScanResponse),
        (status = 503, description = "Store unavailable, scan again", body = ScanResponse)
    ),
    tag = "Attendance"
)]
pub async fn scan(
    pipeline: web::Data<AttendancePipeline>,
    payload: web::Json<ScanRequest>,
) -> impl Responder {
    let report = pipeline.process(&payload.code_data, pipeline.clock().now()).await;
    let status = status_for(&report.outcome);

    HttpResponse::build(status).json(ScanResponse::from(report))
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// Calendar date, defaults to today on the ledger clock
    #[schema(example = "2024-05-01", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    #[schema(example = "2024-05-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// (page, per_page, offset)
fn paging(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    (page, per_page, (page - 1) * per_page)
}

/// Ledger rows for one day
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance for the day", body = AttendanceListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    clock: web::Data<LedgerClock>,
    query: web::Query<AttendanceQuery>,
) -> Result<impl Responder, AppError> {
    let date = query.date.unwrap_or_else(|| clock.today());
    let (page, per_page, offset) = paging(query.page, query.per_page);

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance_ledger WHERE date = ?",
    )
    .bind(date)
    .fetch_one(pool.get_ref())
    .await?;

    debug!(%date, page, per_page, offset, "Fetching attendance");

    let data = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT code_data, date, time, scanned_at
        FROM attendance_ledger
        WHERE date = ?
        ORDER BY scanned_at DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(date)
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        date,
        data,
        page,
        per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{IdentityResolver, LedgerWriter};
    use crate::store::memory::MemoryStore;
    use crate::utils::student_cache::StudentCache;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;

    const ALI_CODE: &str = r#"{"id":42,"name":"Ali","CNIC":"4130112345671"}"#;

    fn pipeline(store: Arc<MemoryStore>) -> web::Data<AttendancePipeline> {
        web::Data::new(AttendancePipeline::new(
            IdentityResolver::new(store.clone(), StudentCache::new(10, Duration::from_secs(60))),
            LedgerWriter::new(store),
        ))
    }

    #[actix_web::test]
    async fn scan_endpoint_maps_outcomes_to_statuses() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let app = actix_test::init_service(
            App::new()
                .app_data(pipeline(store.clone()))
                .route("/attendance/scan", web::post().to(scan)),
        )
        .await;

        let cases = [
            (ALI_CODE, StatusCode::OK, "committed"),
            (ALI_CODE, StatusCode::CONFLICT, "already_marked"),
            ("not json", StatusCode::BAD_REQUEST, "invalid_payload"),
            (r#"{"id":999}"#, StatusCode::NOT_FOUND, "not_found"),
        ];

        for (code, status, outcome) in cases {
            let req = actix_test::TestRequest::post()
                .uri("/attendance/scan")
                .set_json(json!({ "code_data": code }))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), status, "code: {code}");

            let body: Value = actix_test::read_body_json(resp).await;
            assert_eq!(body["outcome"], outcome);
        }

        assert_eq!(store.mark_count(), 1);
    }

    #[actix_web::test]
    async fn committed_scan_returns_student_details() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        let app = actix_test::init_service(
            App::new()
                .app_data(pipeline(store))
                .route("/attendance/scan", web::post().to(scan)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/attendance/scan")
            .set_json(json!({ "code_data": ALI_CODE }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["message"], "Attendance marked successfully for Ali!");
        assert_eq!(body["student"]["id"], 42);
        assert_eq!(body["student"]["national_id"], "4130112345671");
    }

    #[actix_web::test]
    async fn store_faults_are_service_unavailable() {
        let store = Arc::new(MemoryStore::with_students([MemoryStore::student(42, "Ali")]));
        store.fail_writes(true);
        let app = actix_test::init_service(
            App::new()
                .app_data(pipeline(store))
                .route("/attendance/scan", web::post().to(scan)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/attendance/scan")
            .set_json(json!({ "code_data": ALI_CODE }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn paging_clamps_inputs() {
        assert_eq!(paging(None, None), (1, 20, 0));
        assert_eq!(paging(Some(0), Some(500)), (1, 100, 0));
        assert_eq!(paging(Some(3), Some(10)), (3, 10, 20));
    }
}
