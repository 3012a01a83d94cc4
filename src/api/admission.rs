use crate::{
    error::AppError,
    model::student::{RollNumber, StudentRecord},
    scan::AttendancePipeline,
    store::is_unique_violation,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

pub const CAMPUSES: [&str; 4] = [
    "Village Qabool Khan Gadani",
    "Village Khud Bux Gadani",
    "Village Ghul Beg Gadani",
    "Village Murad Bux Gadani",
];

pub const COURSES: [&str; 4] = [
    "English Grammar",
    "Basic Mathematics",
    "Basic Science",
    "Other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum Slot {
    Morning,
    Evening,
}

impl Slot {
    pub fn time_options(&self) -> &'static [&'static str] {
        match self {
            Slot::Morning => &["08:30 AM - 10:30 AM", "10:35 AM - 11:35 AM"],
            Slot::Evening => &["02:30 PM - 4:30 PM", "4:40 PM - 6:00 PM"],
        }
    }
}

/// Strips dashes from `xxxxx-xxxxxxx-x`; the result must be 13 digits.
pub fn normalize_cnic(raw: &str) -> Option<String> {
    let digits: String = raw.trim().chars().filter(|c| *c != '-').collect();
    if digits.len() == 13 && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdmission {
    #[schema(example = "Ali")]
    pub name: String,
    #[schema(example = "Ahmed")]
    pub father: String,
    #[schema(example = "ali@example.com", format = "email")]
    pub email: String,
    #[schema(example = "+92 300 1234567")]
    pub phone: String,
    #[schema(example = "Village Qabool Khan Gadani")]
    pub address: String,
    #[schema(example = "41301-1234567-1")]
    pub cnic: String,
    #[schema(example = "2010-04-12", format = "date", value_type = String)]
    pub birth: NaiveDate,
    #[schema(example = "Matric")]
    pub qualification: String,
    #[schema(example = "Village Khud Bux Gadani")]
    pub campus: String,
    #[schema(example = "Basic Science")]
    pub course: String,
    #[schema(example = "Morning")]
    pub slot: String,
    #[schema(example = "08:30 AM - 10:30 AM")]
    pub time_table: String,
}

/// Trimmed and checked admission, ready to insert.
#[derive(Debug, PartialEq)]
struct NewAdmission {
    name: String,
    father: String,
    email: String,
    phone: String,
    address: String,
    cnic: String,
    birth: NaiveDate,
    qualification: String,
    campus: String,
    course: String,
    slot: Slot,
    time_table: String,
}

fn required(value: &str, label: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{label} is required")));
    }
    Ok(value.to_string())
}

fn validate(payload: &CreateAdmission) -> Result<NewAdmission, AppError> {
    let name = required(&payload.name, "Full name")?;
    let father = required(&payload.father, "Father's name")?;
    let email = required(&payload.email, "Email")?;
    let phone = required(&payload.phone, "Phone number")?;
    let address = required(&payload.address, "Address")?;
    let qualification = required(&payload.qualification, "Qualification")?;

    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => {}
        _ => return Err(AppError::Validation("Email is not valid".into())),
    }

    let cnic = normalize_cnic(&payload.cnic)
        .ok_or_else(|| AppError::Validation("CNIC must be exactly 13 digits.".into()))?;

    let campus = payload.campus.trim();
    if !CAMPUSES.contains(&campus) {
        return Err(AppError::Validation("Select a valid campus".into()));
    }

    let course = payload.course.trim();
    if !COURSES.contains(&course) {
        return Err(AppError::Validation("Select a valid course".into()));
    }

    let slot = Slot::from_str(payload.slot.trim())
        .map_err(|_| AppError::Validation("Slot must be Morning or Evening".into()))?;

    let time_table = payload.time_table.trim();
    if !slot.time_options().contains(&time_table) {
        return Err(AppError::Validation(format!(
            "Select a valid time for the {slot} slot"
        )));
    }

    Ok(NewAdmission {
        name,
        father,
        email,
        phone,
        address,
        cnic,
        birth: payload.birth,
        qualification,
        campus: campus.to_string(),
        course: course.to_string(),
        slot,
        time_table: time_table.to_string(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct AdmissionCreated {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "SNG-0042")]
    pub roll_number: String,
    #[schema(example = "Application submitted successfully!")]
    pub message: String,
}

/// Submit an admission form
#[utoipa::path(
    post,
    path = "/api/admissions",
    request_body = CreateAdmission,
    responses(
        (status = 201, description = "Application submitted", body = AdmissionCreated),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "message": "CNIC must be exactly 13 digits."
        })),
        (status = 409, description = "CNIC already registered", body = Object, example = json!({
            "message": "A user with this CNIC already exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admission"
)]
#[instrument(name = "admission_create", skip(pool, pipeline, payload))]
pub async fn create_admission(
    pool: web::Data<MySqlPool>,
    pipeline: web::Data<AttendancePipeline>,
    payload: web::Json<CreateAdmission>,
) -> Result<impl Responder, AppError> {
    let admission = validate(&payload)?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admissions WHERE cnic = ?")
        .bind(&admission.cnic)
        .fetch_one(pool.get_ref())
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict("A user with this CNIC already exists".into()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO admissions
        (name, father, email, phone, address, cnic, birth, qualification, campus, course, slot, time_table)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&admission.name)
    .bind(&admission.father)
    .bind(&admission.email)
    .bind(&admission.phone)
    .bind(&admission.address)
    .bind(&admission.cnic)
    .bind(admission.birth)
    .bind(&admission.qualification)
    .bind(&admission.campus)
    .bind(&admission.course)
    .bind(admission.slot.to_string())
    .bind(&admission.time_table)
    .execute(pool.get_ref())
    .await;

    let id = match result {
        Ok(done) => done.last_insert_id(),
        // submitted twice at once: the pre-check passed on both
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict("A user with this CNIC already exists".into()));
        }
        Err(e) => {
            error!(error = %e, "Failed to submit admission");
            return Err(e.into());
        }
    };

    pipeline
        .resolver()
        .cache()
        .insert(StudentRecord {
            id,
            name: admission.name.clone(),
            national_id: admission.cnic.clone(),
            course: admission.course.clone(),
        })
        .await;

    info!(admission_id = id, "Admission submitted");

    Ok(HttpResponse::Created().json(AdmissionCreated {
        id,
        roll_number: RollNumber(id).to_string(),
        message: "Application submitted successfully!".to_string(),
    }))
}

/// Choices offered on the admission form
#[utoipa::path(
    get,
    path = "/api/admissions/options",
    responses(
        (status = 200, description = "Campuses, courses and slot timings", body = Object, example = json!({
            "campuses": ["Village Qabool Khan Gadani"],
            "courses": ["English Grammar"],
            "slots": { "Morning": ["08:30 AM - 10:30 AM", "10:35 AM - 11:35 AM"] }
        }))
    ),
    tag = "Admission"
)]
pub async fn admission_options() -> impl Responder {
    let slots: BTreeMap<String, &[&str]> = Slot::iter()
        .map(|slot| (slot.to_string(), slot.time_options()))
        .collect();

    HttpResponse::Ok().json(json!({
        "campuses": CAMPUSES,
        "courses": COURSES,
        "slots": slots,
    }))
}
