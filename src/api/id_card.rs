use crate::{error::AppError, model::student::Admission, scan::ScanPayload};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use qrcode::QrCode;
use qrcode::render::svg;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct IdCardRequest {
    #[schema(example = "Ali")]
    pub name: String,
    #[schema(example = "4130112345671")]
    pub cnic: String,
}

#[derive(Serialize, ToSchema)]
pub struct IdCard {
    #[schema(example = "SNG-0042")]
    pub roll_number: String,
    pub name: String,
    pub father: String,
    pub cnic: String,
    #[schema(example = "2010-04-12", format = "date", value_type = String)]
    pub birth: NaiveDate,
    pub course: String,
    pub campus: String,
    pub slot: String,
    pub time_table: String,
    /// Text encoded in the QR code; what the attendance scanner reads back
    #[schema(example = r#"{"id":42,"name":"Ali","CNIC":"4130112345671"}"#)]
    pub qr_payload: String,
    /// QR code as an SVG document
    pub qr_svg: String,
}

fn validate(req: &IdCardRequest) -> Result<(String, String), AppError> {
    let name = req.name.trim();
    let cnic = req.cnic.trim();

    if name.is_empty() || cnic.is_empty() {
        return Err(AppError::Validation("Both fields are required!".into()));
    }
    if cnic.chars().count() != 13 {
        return Err(AppError::Validation("CNIC must be exactly 13 digits.".into()));
    }

    Ok((name.to_string(), cnic.to_string()))
}

pub fn qr_svg(payload: &str) -> Result<String, AppError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(160, 160)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

fn card_for(admission: Admission) -> Result<IdCard, AppError> {
    let qr_payload =
        ScanPayload::for_card(admission.id, &admission.name, &admission.cnic).encode()?;
    let qr_svg = qr_svg(&qr_payload)?;

    Ok(IdCard {
        roll_number: admission.roll_number().to_string(),
        name: admission.name,
        father: admission.father,
        cnic: admission.cnic,
        birth: admission.birth,
        course: admission.course,
        campus: admission.campus,
        slot: admission.slot,
        time_table: admission.time_table,
        qr_payload,
        qr_svg,
    })
}

/// Generate a printable student ID card
#[utoipa::path(
    post,
    path = "/api/id-card",
    request_body = IdCardRequest,
    responses(
        (status = 200, description = "Card data with QR code", body = IdCard),
        (status = 400, description = "Invalid input", body = Object, example = json!({
            "message": "Both fields are required!"
        })),
        (status = 404, description = "No admission matches", body = Object, example = json!({
            "message": "No record found."
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "ID Card"
)]
pub async fn generate_id_card(
    pool: web::Data<MySqlPool>,
    payload: web::Json<IdCardRequest>,
) -> Result<impl Responder, AppError> {
    let (name, cnic) = validate(&payload)?;

    let admission = sqlx::query_as::<_, Admission>(
        r#"
        SELECT id, name, father, email, phone, address, cnic, birth, qualification,
               campus, course, slot, time_table, created_at
        FROM admissions
        WHERE cnic = ? AND name = ?
        "#,
    )
    .bind(&cnic)
    .bind(&name)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("No record found.".into()))?;

    info!(admission_id = admission.id, "ID card generated");

    Ok(HttpResponse::Ok().json(card_for(admission)?))
}
