use crate::api::admission::{AdmissionCreated, CreateAdmission};
use crate::api::attendance::{AttendanceListResponse, AttendanceQuery, ScanRequest, ScanResponse};
use crate::api::id_card::{IdCard, IdCardRequest};
use crate::model::attendance::AttendanceRecord;
use crate::model::result::ExamResult;
use crate::model::student::StudentRecord;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Academy API",
        version = "0.1.0",
        description = r#"
## Shaheed Nasrullah Gadani Academy

Backend for the academy website.

### Features
- **Attendance**
  - QR code check-in, at most once per code per day
  - Daily attendance listing
- **Admissions**
  - Admission form intake with CNIC de-duplication
- **Results**
  - Result lookup by roll number and CNIC
- **ID Cards**
  - Printable student card data with an attendance QR code

Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::scan,
        crate::api::attendance::list_attendance,

        crate::api::admission::create_admission,
        crate::api::admission::admission_options,

        crate::api::result::get_result,

        crate::api::id_card::generate_id_card
    ),
    components(
        schemas(
            ScanRequest,
            ScanResponse,
            AttendanceQuery,
            AttendanceListResponse,
            AttendanceRecord,
            StudentRecord,
            CreateAdmission,
            AdmissionCreated,
            ExamResult,
            IdCardRequest,
            IdCard
        )
    ),
    tags(
        (name = "Attendance", description = "QR attendance APIs"),
        (name = "Admission", description = "Admission form APIs"),
        (name = "Result", description = "Result lookup APIs"),
        (name = "ID Card", description = "Student ID card APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance/scan",
            "/api/attendance",
            "/api/admissions",
            "/api/admissions/options",
            "/api/results",
            "/api/id-card",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
