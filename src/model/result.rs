use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "roll_number": "SNG-0042",
        "cnic": "4130112345671",
        "name": "Ali",
        "course": "Basic Mathematics",
        "slot": "Morning",
        "total_marks": 100,
        "obtained_marks": 87,
        "percentage": 87.0,
        "position": "1st",
        "test": "Monthly Test",
        "campus": "Village Qabool Khan Gadani"
    })
)]
pub struct ExamResult {
    pub roll_number: String,
    pub cnic: String,
    pub name: String,
    pub course: String,
    pub slot: String,
    pub total_marks: u32,
    pub obtained_marks: u32,
    pub percentage: f64,
    pub position: String,
    pub test: String,
    pub campus: String,
}
