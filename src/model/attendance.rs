use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One committed ledger row. `(code_data, date)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    /// Raw text read from the QR code
    #[schema(example = r#"{"id":42,"name":"Ali","CNIC":"4130112345671"}"#)]
    pub code_data: String,

    #[schema(example = "2024-05-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "09:00:00", value_type = String)]
    pub time: NaiveTime,

    #[schema(example = "2024-05-01T04:00:00.000Z", value_type = String, format = "date-time")]
    pub scanned_at: DateTime<Utc>,
}
