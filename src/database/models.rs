use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A scheduled surgical procedure. `surgery_code` is caller-assigned and
/// globally unique; the system never generates it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Surgery {
    pub surgery_code: i64,
    pub establishment_code: i64,
    pub room: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub status_code: String,
    pub status_description: String,
    pub patient_code: i64,
    pub patient_name: String,
    pub attendance_type: String,
    pub physician_code: i64,
    pub physician_name: String,
    pub physician_council_id: String,
    pub procedure_description: String,
}

/// An independently registered person eligible for surgical team assignment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Professional {
    pub id: i64,
    pub name: String,
    pub council_id: Option<String>,
}

/// One team association row joined with the professional registry, as it
/// appears inside a surgery response.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub professional_id: i64,
    pub name: String,
    pub council_id: Option<String>,
    pub role: String,
}
