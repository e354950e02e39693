use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use thiserror::Error;

use crate::database::models::{Surgery, TeamMember};
use crate::error::{from_sqlx, ApiError};

const SURGERY_COLUMNS: &str = "surgery_code, establishment_code, room, date, start_time, \
     status_code, status_description, patient_code, patient_name, attendance_type, \
     physician_code, physician_name, physician_council_id, procedure_description";

#[derive(Debug, Error)]
pub enum SurgeryError {
    #[error("Surgery {0} not found")]
    NotFound(i64),

    #[error("Surgery code {0} already exists")]
    CodeTaken(i64),

    #[error("Professional {0} not found")]
    ProfessionalNotFound(i64),

    #[error("Professional {0} listed more than once in team")]
    DuplicateMember(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<SurgeryError> for ApiError {
    fn from(err: SurgeryError) -> Self {
        match err {
            SurgeryError::NotFound(code) => {
                ApiError::not_found(format!("Surgery {} not found", code))
            }
            SurgeryError::CodeTaken(code) => {
                ApiError::conflict(format!("Surgery code {} already exists", code))
            }
            SurgeryError::ProfessionalNotFound(id) => {
                ApiError::not_found(format!("Professional {} not found", id))
            }
            SurgeryError::DuplicateMember(id) => {
                ApiError::bad_request(format!("Professional {} listed more than once in team", id))
            }
            SurgeryError::Database(e) => from_sqlx(e),
        }
    }
}

/// Request-side description of a surgery. `surgery_code` is supplied by the
/// caller and never generated here; on update the path parameter wins over
/// the body copy.
#[derive(Debug, Clone, Deserialize)]
pub struct SurgeryData {
    pub surgery_code: i64,
    pub establishment_code: i64,
    pub room: String,
    pub date: NaiveDate,
    pub start_time: chrono::NaiveTime,
    pub status_code: String,
    pub status_description: String,
    pub patient_code: i64,
    pub patient_name: String,
    pub attendance_type: String,
    pub physician_code: i64,
    pub physician_name: String,
    pub physician_council_id: String,
    pub procedure_description: String,
    #[serde(default)]
    pub team: Vec<TeamMemberSpec>,
}

/// Team member reference: an existing professional plus the role they hold
/// in this one surgery.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberSpec {
    pub professional_id: i64,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct SurgeryWithTeam {
    #[serde(flatten)]
    pub surgery: Surgery,
    pub team: Vec<TeamMember>,
}

#[derive(Debug, Default)]
pub struct SurgeryFilter {
    pub date: Option<NaiveDate>,
    pub physician_name: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

pub async fn list(pool: &PgPool, filter: &SurgeryFilter) -> Result<Vec<SurgeryWithTeam>, SurgeryError> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM surgeries WHERE 1=1", SURGERY_COLUMNS));

    if let Some(date) = filter.date {
        qb.push(" AND date = ").push_bind(date);
    }
    if let Some(name) = &filter.physician_name {
        qb.push(" AND physician_name ILIKE ").push_bind(format!("%{}%", name));
    }
    qb.push(" ORDER BY surgery_code OFFSET ").push_bind(filter.skip);
    qb.push(" LIMIT ").push_bind(filter.limit);

    let surgeries: Vec<Surgery> = qb.build_query_as().fetch_all(pool).await?;

    let codes: Vec<i64> = surgeries.iter().map(|s| s.surgery_code).collect();
    let mut teams = fetch_teams(pool, &codes).await?;

    Ok(surgeries
        .into_iter()
        .map(|surgery| {
            let team = teams.remove(&surgery.surgery_code).unwrap_or_default();
            SurgeryWithTeam { surgery, team }
        })
        .collect())
}

pub async fn get(pool: &PgPool, code: i64) -> Result<SurgeryWithTeam, SurgeryError> {
    let surgery = sqlx::query_as::<_, Surgery>(&format!(
        "SELECT {} FROM surgeries WHERE surgery_code = $1",
        SURGERY_COLUMNS
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or(SurgeryError::NotFound(code))?;

    let team = fetch_teams(pool, &[code]).await?.remove(&code).unwrap_or_default();
    Ok(SurgeryWithTeam { surgery, team })
}

pub async fn create(pool: &PgPool, data: &SurgeryData) -> Result<SurgeryWithTeam, SurgeryError> {
    let mut tx = pool.begin().await?;

    let insert = sqlx::query_as::<_, Surgery>(&format!(
        "INSERT INTO surgeries ({cols}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING {cols}",
        cols = SURGERY_COLUMNS
    ))
    .bind(data.surgery_code)
    .bind(data.establishment_code)
    .bind(&data.room)
    .bind(data.date)
    .bind(data.start_time)
    .bind(&data.status_code)
    .bind(&data.status_description)
    .bind(data.patient_code)
    .bind(&data.patient_name)
    .bind(&data.attendance_type)
    .bind(data.physician_code)
    .bind(&data.physician_name)
    .bind(&data.physician_council_id)
    .bind(&data.procedure_description)
    .fetch_one(&mut *tx)
    .await;

    let surgery = match insert {
        Ok(s) => s,
        Err(e) if is_unique_violation(&e) => return Err(SurgeryError::CodeTaken(data.surgery_code)),
        Err(e) => return Err(e.into()),
    };

    let team = replace_team(&mut tx, surgery.surgery_code, &data.team).await?;
    tx.commit().await?;

    Ok(SurgeryWithTeam { surgery, team })
}

/// Full update: every surgery field is overwritten and the team is replaced
/// wholesale. Fails with NotFound before mutating anything if the code does
/// not exist.
pub async fn update(pool: &PgPool, code: i64, data: &SurgeryData) -> Result<SurgeryWithTeam, SurgeryError> {
    let mut tx = pool.begin().await?;

    // Row lock serializes concurrent replacements of the same surgery: the
    // last committer's team fully wins, never an interleaved merge.
    let locked = sqlx::query("SELECT surgery_code FROM surgeries WHERE surgery_code = $1 FOR UPDATE")
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;
    if locked.is_none() {
        return Err(SurgeryError::NotFound(code));
    }

    let surgery = sqlx::query_as::<_, Surgery>(&format!(
        "UPDATE surgeries SET establishment_code = $2, room = $3, date = $4, start_time = $5, \
         status_code = $6, status_description = $7, patient_code = $8, patient_name = $9, \
         attendance_type = $10, physician_code = $11, physician_name = $12, \
         physician_council_id = $13, procedure_description = $14 \
         WHERE surgery_code = $1 RETURNING {}",
        SURGERY_COLUMNS
    ))
    .bind(code)
    .bind(data.establishment_code)
    .bind(&data.room)
    .bind(data.date)
    .bind(data.start_time)
    .bind(&data.status_code)
    .bind(&data.status_description)
    .bind(data.patient_code)
    .bind(&data.patient_name)
    .bind(&data.attendance_type)
    .bind(data.physician_code)
    .bind(&data.physician_name)
    .bind(&data.physician_council_id)
    .bind(&data.procedure_description)
    .fetch_one(&mut *tx)
    .await?;

    let team = replace_team(&mut tx, code, &data.team).await?;
    tx.commit().await?;

    Ok(SurgeryWithTeam { surgery, team })
}

/// Delete a surgery. Its association rows cascade away; the professionals
/// they referenced remain in the registry.
pub async fn delete(pool: &PgPool, code: i64) -> Result<(), SurgeryError> {
    let result = sqlx::query("DELETE FROM surgeries WHERE surgery_code = $1")
        .bind(code)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(SurgeryError::NotFound(code));
    }
    Ok(())
}

/// Replace the surgery's entire team inside the caller's transaction.
///
/// All-or-nothing: a duplicate member or a dangling professional reference
/// aborts before any association row is touched, leaving the prior team
/// visible to readers. There is deliberately no incremental add/remove;
/// every team mutation is a full replacement.
async fn replace_team(
    tx: &mut Transaction<'_, Postgres>,
    surgery_code: i64,
    members: &[TeamMemberSpec],
) -> Result<Vec<TeamMember>, SurgeryError> {
    if let Some(id) = find_duplicate(members) {
        return Err(SurgeryError::DuplicateMember(id));
    }

    let mut registry: HashMap<i64, (String, Option<String>)> = HashMap::new();
    if !members.is_empty() {
        let ids: Vec<i64> = members.iter().map(|m| m.professional_id).collect();
        // FOR KEY SHARE pins the referenced professionals until commit: a
        // concurrent registry delete either lands first (row missing here,
        // so a clean NotFound) or waits for this transaction, instead of
        // failing the later insert with a raw foreign-key error.
        let rows: Vec<(i64, String, Option<String>)> = sqlx::query_as(
            "SELECT id, name, council_id FROM professionals WHERE id = ANY($1) FOR KEY SHARE",
        )
        .bind(&ids)
        .fetch_all(&mut **tx)
        .await?;
        for (id, name, council_id) in rows {
            registry.insert(id, (name, council_id));
        }
        for member in members {
            if !registry.contains_key(&member.professional_id) {
                return Err(SurgeryError::ProfessionalNotFound(member.professional_id));
            }
        }
    }

    sqlx::query("DELETE FROM surgery_team WHERE surgery_code = $1")
        .bind(surgery_code)
        .execute(&mut **tx)
        .await?;

    let mut team = Vec::with_capacity(members.len());
    for member in members {
        let insert =
            sqlx::query("INSERT INTO surgery_team (surgery_code, professional_id, role) VALUES ($1, $2, $3)")
                .bind(surgery_code)
                .bind(member.professional_id)
                .bind(&member.role)
                .execute(&mut **tx)
                .await;
        match insert {
            Ok(_) => {}
            // Backstop for a registry row vanishing despite the lock above
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(SurgeryError::ProfessionalNotFound(member.professional_id))
            }
            Err(e) => return Err(e.into()),
        }

        let (name, council_id) = registry[&member.professional_id].clone();
        team.push(TeamMember {
            professional_id: member.professional_id,
            name,
            council_id,
            role: member.role.clone(),
        });
    }

    Ok(team)
}

async fn fetch_teams(pool: &PgPool, codes: &[i64]) -> Result<HashMap<i64, Vec<TeamMember>>, sqlx::Error> {
    if codes.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, i64, String, Option<String>, String)> = sqlx::query_as(
        "SELECT st.surgery_code, p.id, p.name, p.council_id, st.role \
         FROM surgery_team st JOIN professionals p ON p.id = st.professional_id \
         WHERE st.surgery_code = ANY($1) ORDER BY p.id",
    )
    .bind(codes)
    .fetch_all(pool)
    .await?;

    let mut teams: HashMap<i64, Vec<TeamMember>> = HashMap::new();
    for (surgery_code, professional_id, name, council_id, role) in rows {
        teams.entry(surgery_code).or_default().push(TeamMember {
            professional_id,
            name,
            council_id,
            role,
        });
    }
    Ok(teams)
}

fn find_duplicate(members: &[TeamMemberSpec]) -> Option<i64> {
    let mut seen = HashSet::new();
    members
        .iter()
        .find(|m| !seen.insert(m.professional_id))
        .map(|m| m.professional_id)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}
