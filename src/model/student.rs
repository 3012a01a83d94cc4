use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The slice of an admission the attendance scanner works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "name": "Ali",
        "national_id": "4130112345671",
        "course": "English Grammar"
    })
)]
pub struct StudentRecord {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = "Ali")]
    pub name: String,

    /// CNIC / B-Form number
    #[schema(example = "4130112345671")]
    pub national_id: String,

    #[schema(example = "English Grammar")]
    pub course: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Admission {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = "Ali")]
    pub name: String,

    #[schema(example = "Ahmed")]
    pub father: String,

    #[schema(example = "ali@example.com")]
    pub email: String,

    #[schema(example = "+92 300 1234567")]
    pub phone: String,

    #[schema(example = "Village Qabool Khan Gadani")]
    pub address: String,

    #[schema(example = "4130112345671")]
    pub cnic: String,

    #[schema(example = "2010-04-12", value_type = String, format = "date")]
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

    #[schema(example = "2024-05-01T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl Admission {
    pub fn student_record(&self) -> StudentRecord {
        StudentRecord {
            id: self.id,
            name: self.name.clone(),
            national_id: self.cnic.clone(),
            course: self.course.clone(),
        }
    }

    pub fn roll_number(&self) -> RollNumber {
        RollNumber(self.id)
    }
}

/// Printed roll number, e.g. `SNG-0042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "SNG-00{}", _0)]
pub struct RollNumber(pub u64);
