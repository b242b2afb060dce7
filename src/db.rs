use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::AnalysisSettings;
use crate::models::{AnalysisResult, AnalysisType, Project, StoredResult};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn create_project(
    pool: &PgPool,
    name: &str,
    description: &str,
    analysis_type: AnalysisType,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO price_sensitivity.projects
        (id, name, description, analysis_type, status, created_at)
        VALUES ($1, $2, $3, $4, 'created', $5)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(analysis_type.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

fn project_from_row(row: &PgRow) -> anyhow::Result<Project> {
    let analysis_type: String = row.get("analysis_type");
    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        analysis_type: analysis_type.parse()?,
        status: row.get("status"),
        created_at: row.get("created_at"),
    })
}

pub async fn list_projects(pool: &PgPool) -> anyhow::Result<Vec<Project>> {
    let rows = sqlx::query(
        "SELECT id, name, description, analysis_type, status, created_at \
         FROM price_sensitivity.projects \
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(project_from_row).collect()
}

pub async fn fetch_project(pool: &PgPool, project_id: Uuid) -> anyhow::Result<Project> {
    let row = sqlx::query(
        "SELECT id, name, description, analysis_type, status, created_at \
         FROM price_sensitivity.projects \
         WHERE id = $1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("project {project_id} not found"))?;

    project_from_row(&row)
}

/// Removes a project together with its settings and results.
pub async fn delete_project(pool: &PgPool, project_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM price_sensitivity.projects WHERE id = $1")
        .bind(project_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn save_settings(
    pool: &PgPool,
    project_id: Uuid,
    analysis_type: AnalysisType,
    settings: &AnalysisSettings,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO price_sensitivity.analysis_settings
        (id, project_id, analysis_type, mapping, segments, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(project_id)
    .bind(analysis_type.as_str())
    .bind(Json(&settings.mapping))
    .bind(&settings.segments)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Stores a finished run and marks the project analysed. Earlier runs are
/// kept; readers pick the newest.
pub async fn save_result(
    pool: &PgPool,
    project_id: Uuid,
    result: AnalysisResult,
) -> anyhow::Result<StoredResult> {
    let stored = StoredResult {
        id: Uuid::new_v4(),
        project_id,
        created_at: Utc::now(),
        result,
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO price_sensitivity.results
        (id, project_id, analysis_type, result, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(stored.id)
    .bind(project_id)
    .bind(stored.result.analysis_type.as_str())
    .bind(Json(&stored.result))
    .bind(stored.created_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE price_sensitivity.projects SET status = 'analyzed' WHERE id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(stored)
}

pub async fn latest_result(pool: &PgPool, project_id: Uuid) -> anyhow::Result<Option<StoredResult>> {
    let row = sqlx::query(
        "SELECT id, project_id, result, created_at \
         FROM price_sensitivity.results \
         WHERE project_id = $1 \
         ORDER BY created_at DESC \
         LIMIT 1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        let Json(result): Json<AnalysisResult> = row.get("result");
        let created_at: DateTime<Utc> = row.get("created_at");
        StoredResult {
            id: row.get("id"),
            project_id: row.get("project_id"),
            created_at,
            result,
        }
    }))
}
