//! Landholding management service
//!
//! Landholdings are the supplying properties raw material originates
//! from. Each carries its compliance documents (management plans,
//! harvest permits and similar). Landholdings are archived rather than
//! deleted so past receptions keep a valid origin reference.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::validation::validate_required;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Landholding service
#[derive(Clone)]
pub struct LandholdingService {
    db: PgPool,
}

/// Landholding record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Landholding {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Tax role identifier of the property
    pub rol: String,
    pub name: String,
    pub owner: Option<String>,
    pub commune: Option<String>,
    pub area_ha: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compliance document metadata (file content fetched separately)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LandholdingDocument {
    pub id: Uuid,
    pub landholding_id: Uuid,
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub valid_until: Option<NaiveDate>,
    pub uploaded_at: DateTime<Utc>,
}

/// A registered document type
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DocumentType {
    pub code: String,
    pub display_name: String,
}

/// Input for registering a landholding
#[derive(Debug, Deserialize)]
pub struct CreateLandholdingInput {
    pub rol: String,
    pub name: String,
    pub owner: Option<String>,
    pub commune: Option<String>,
    pub area_ha: Option<Decimal>,
}

/// Input for updating a landholding
#[derive(Debug, Deserialize)]
pub struct UpdateLandholdingInput {
    pub rol: Option<String>,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub commune: Option<String>,
    pub area_ha: Option<Decimal>,
}

/// Input for attaching a compliance document
#[derive(Debug)]
pub struct AttachDocumentInput {
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub valid_until: Option<NaiveDate>,
    pub data: Vec<u8>,
}

impl LandholdingService {
    /// Create a new LandholdingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get all landholdings for a user, active first
    pub async fn list_landholdings(&self, user_id: Uuid) -> AppResult<Vec<Landholding>> {
        let landholdings = sqlx::query_as::<_, Landholding>(
            r#"
            SELECT id, user_id, rol, name, owner, commune, area_ha, status,
                   created_at, updated_at
            FROM landholdings
            WHERE user_id = $1
            ORDER BY status, name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(landholdings)
    }

    /// Get a landholding by ID
    pub async fn get_landholding(
        &self,
        user_id: Uuid,
        landholding_id: Uuid,
    ) -> AppResult<Landholding> {
        sqlx::query_as::<_, Landholding>(
            r#"
            SELECT id, user_id, rol, name, owner, commune, area_ha, status,
                   created_at, updated_at
            FROM landholdings
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(landholding_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Landholding".to_string()))
    }

    /// Register a new landholding
    pub async fn create_landholding(
        &self,
        user_id: Uuid,
        input: CreateLandholdingInput,
    ) -> AppResult<Landholding> {
        validate_required(&input.rol).map_err(|msg| AppError::Validation {
            field: "rol".to_string(),
            message: msg.to_string(),
        })?;
        validate_required(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM landholdings WHERE user_id = $1 AND rol = $2",
        )
        .bind(user_id)
        .bind(&input.rol)
        .fetch_one(&self.db)
        .await?;

        if exists > 0 {
            return Err(AppError::DuplicateEntry("rol".to_string()));
        }

        let landholding = sqlx::query_as::<_, Landholding>(
            r#"
            INSERT INTO landholdings (user_id, rol, name, owner, commune, area_ha, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING id, user_id, rol, name, owner, commune, area_ha, status,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&input.rol)
        .bind(&input.name)
        .bind(&input.owner)
        .bind(&input.commune)
        .bind(input.area_ha)
        .fetch_one(&self.db)
        .await?;

        Ok(landholding)
    }

    /// Update a landholding
    pub async fn update_landholding(
        &self,
        user_id: Uuid,
        landholding_id: Uuid,
        input: UpdateLandholdingInput,
    ) -> AppResult<Landholding> {
        let existing = self.get_landholding(user_id, landholding_id).await?;

        let rol = input.rol.unwrap_or(existing.rol);
        let name = input.name.unwrap_or(existing.name);
        let owner = input.owner.or(existing.owner);
        let commune = input.commune.or(existing.commune);
        let area_ha = input.area_ha.or(existing.area_ha);

        let landholding = sqlx::query_as::<_, Landholding>(
            r#"
            UPDATE landholdings
            SET rol = $1, name = $2, owner = $3, commune = $4, area_ha = $5, updated_at = NOW()
            WHERE id = $6 AND user_id = $7
            RETURNING id, user_id, rol, name, owner, commune, area_ha, status,
                      created_at, updated_at
            "#,
        )
        .bind(&rol)
        .bind(&name)
        .bind(&owner)
        .bind(&commune)
        .bind(area_ha)
        .bind(landholding_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(landholding)
    }

    /// Archive a landholding so it no longer appears in active listings
    pub async fn archive_landholding(
        &self,
        user_id: Uuid,
        landholding_id: Uuid,
    ) -> AppResult<Landholding> {
        sqlx::query_as::<_, Landholding>(
            r#"
            UPDATE landholdings
            SET status = 'archived', updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, rol, name, owner, commune, area_ha, status,
                      created_at, updated_at
            "#,
        )
        .bind(landholding_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Landholding".to_string()))
    }

    /// List the registered document types
    pub async fn list_document_types(&self) -> AppResult<Vec<DocumentType>> {
        let types = sqlx::query_as::<_, DocumentType>(
            "SELECT code, display_name FROM document_types ORDER BY display_name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(types)
    }

    /// Attach a compliance document to a landholding
    pub async fn attach_document(
        &self,
        user_id: Uuid,
        landholding_id: Uuid,
        input: AttachDocumentInput,
    ) -> AppResult<LandholdingDocument> {
        // Ownership check
        self.get_landholding(user_id, landholding_id).await?;

        let known_type = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM document_types WHERE code = $1",
        )
        .bind(&input.document_type)
        .fetch_one(&self.db)
        .await?;

        if known_type == 0 {
            return Err(AppError::Validation {
                field: "document_type".to_string(),
                message: "unknown document type".to_string(),
            });
        }

        if input.data.is_empty() {
            return Err(AppError::Validation {
                field: "file".to_string(),
                message: "file must not be empty".to_string(),
            });
        }

        let document = sqlx::query_as::<_, LandholdingDocument>(
            r#"
            INSERT INTO landholding_documents (landholding_id, document_type, file_name,
                                               content_type, valid_until, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, landholding_id, document_type, file_name, content_type,
                      valid_until, uploaded_at
            "#,
        )
        .bind(landholding_id)
        .bind(&input.document_type)
        .bind(&input.file_name)
        .bind(&input.content_type)
        .bind(input.valid_until)
        .bind(&input.data)
        .fetch_one(&self.db)
        .await?;

        Ok(document)
    }

    /// List documents attached to a landholding
    pub async fn list_documents(
        &self,
        user_id: Uuid,
        landholding_id: Uuid,
    ) -> AppResult<Vec<LandholdingDocument>> {
        self.get_landholding(user_id, landholding_id).await?;

        let documents = sqlx::query_as::<_, LandholdingDocument>(
            r#"
            SELECT id, landholding_id, document_type, file_name, content_type,
                   valid_until, uploaded_at
            FROM landholding_documents
            WHERE landholding_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(landholding_id)
        .fetch_all(&self.db)
        .await?;

        Ok(documents)
    }

    /// Fetch a document's metadata and file content
    pub async fn get_document_content(
        &self,
        user_id: Uuid,
        landholding_id: Uuid,
        document_id: Uuid,
    ) -> AppResult<(LandholdingDocument, Vec<u8>)> {
        self.get_landholding(user_id, landholding_id).await?;

        let row = sqlx::query_as::<_, DocumentContentRow>(
            r#"
            SELECT id, landholding_id, document_type, file_name, content_type,
                   valid_until, uploaded_at, data
            FROM landholding_documents
            WHERE id = $1 AND landholding_id = $2
            "#,
        )
        .bind(document_id)
        .bind(landholding_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Document".to_string()))?;

        let document = LandholdingDocument {
            id: row.id,
            landholding_id: row.landholding_id,
            document_type: row.document_type,
            file_name: row.file_name,
            content_type: row.content_type,
            valid_until: row.valid_until,
            uploaded_at: row.uploaded_at,
        };
        Ok((document, row.data))
    }

    /// Remove a document from a landholding
    pub async fn delete_document(
        &self,
        user_id: Uuid,
        landholding_id: Uuid,
        document_id: Uuid,
    ) -> AppResult<()> {
        self.get_landholding(user_id, landholding_id).await?;

        let result =
            sqlx::query("DELETE FROM landholding_documents WHERE id = $1 AND landholding_id = $2")
                .bind(document_id)
                .bind(landholding_id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Document".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DocumentContentRow {
    id: Uuid,
    landholding_id: Uuid,
    document_type: String,
    file_name: String,
    content_type: String,
    valid_until: Option<NaiveDate>,
    uploaded_at: DateTime<Utc>,
    data: Vec<u8>,
}
