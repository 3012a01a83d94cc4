use crate::{error::AppError, model::result::ExamResult};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ResultQuery {
    /// Printed roll number, e.g. SNG-0042
    pub roll_number: Option<String>,
    /// 13 digit CNIC / B-Form
    pub cnic: Option<String>,
}

fn validate(query: &ResultQuery) -> Result<(String, String), AppError> {
    let roll_number = query.roll_number.as_deref().map(str::trim).unwrap_or_default();
    let cnic = query.cnic.as_deref().map(str::trim).unwrap_or_default();

    if roll_number.is_empty() || cnic.is_empty() {
        return Err(AppError::Validation(
            "Please enter both CNIC and Roll Number.".into(),
        ));
    }
    if cnic.len() != 13 || !cnic.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("CNIC must be 13 numeric digits.".into()));
    }

    Ok((roll_number.to_string(), cnic.to_string()))
}

/// Look up an exam result
#[utoipa::path(
    get,
    path = "/api/results",
    params(ResultQuery),
    responses(
        (status = 200, description = "Result found", body = ExamResult),
        (status = 400, description = "Missing or malformed input", body = Object, example = json!({
            "message": "CNIC must be 13 numeric digits."
        })),
        (status = 404, description = "Result not found", body = Object, example = json!({
            "message": "Result not found."
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Result"
)]
pub async fn get_result(
    pool: web::Data<MySqlPool>,
    query: web::Query<ResultQuery>,
) -> Result<impl Responder, AppError> {
    let (roll_number, cnic) = validate(&query)?;
    debug!(%roll_number, "Fetching result");

    let result = sqlx::query_as::<_, ExamResult>(
        r#"
        SELECT roll_number, cnic, name, course, slot, total_marks, obtained_marks,
               percentage, position, test, campus
        FROM results
        WHERE roll_number = ? AND cnic = ?
        "#,
    )
    .bind(&roll_number)
    .bind(&cnic)
    .fetch_optional(pool.get_ref())
    .await?;

    match result {
        Some(r) => Ok(HttpResponse::Ok().json(r)),
        None => Err(AppError::NotFound("Result not found.".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(roll: Option<&str>, cnic: Option<&str>) -> ResultQuery {
        ResultQuery {
            roll_number: roll.map(String::from),
            cnic: cnic.map(String::from),
        }
    }

    #[test]
    fn both_fields_are_required() {
        let err = validate(&query(Some("SNG-0042"), None)).unwrap_err();
        assert_eq!(err.to_string(), "Please enter both CNIC and Roll Number.");

        let err = validate(&query(Some("  "), Some("4130112345671"))).unwrap_err();
        assert_eq!(err.to_string(), "Please enter both CNIC and Roll Number.");
    }

    #[test]
    fn cnic_must_be_numeric() {
        let err = validate(&query(Some("SNG-0042"), Some("41301-1234567"))).unwrap_err();
        assert_eq!(err.to_string(), "CNIC must be 13 numeric digits.");
    }

    #[test]
    fn trims_valid_input() {
        let (roll, cnic) = validate(&query(Some(" SNG-0042 "), Some("4130112345671"))).unwrap();
        assert_eq!(roll, "SNG-0042");
        assert_eq!(cnic, "4130112345671");
    }
}
