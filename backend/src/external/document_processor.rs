//! Document Processor Client
//!
//! Client for the external extraction service that turns uploaded
//! spreadsheets and scanned documents into movement records. The
//! service only extracts; nothing it returns is written to the
//! database until the caller pushes it through bulk ingestion.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Client for the document processing microservice
#[derive(Clone)]
pub struct DocumentProcessorClient {
    endpoint: String,
    http_client: Client,
}

/// Extracted reception record as returned by the service
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedReception {
    pub reception_date: String,
    pub product_code: String,
    pub supplier: String,
    pub guide_number: String,
    pub volume_m3: String,
    pub certification: String,
    pub landholding_rol: Option<String>,
    pub origin: Option<String>,
    pub commune: Option<String>,
}

/// Extracted sale record as returned by the service
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedSale {
    pub sale_date: String,
    pub product_code: String,
    pub customer: String,
    pub invoice_number: String,
    pub volume_m3: String,
    pub certification: String,
    pub unit_price: Option<String>,
}

/// Response from the document processing service
#[derive(Debug, Deserialize)]
pub struct ProcessDocumentResponse {
    pub records_processed: i32,
    pub sheets_processed: i32,
    pub total_sheets: i32,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub reception_records: Vec<ExtractedReception>,
    #[serde(default)]
    pub sale_records: Vec<ExtractedSale>,
    /// Legacy output shape: raw INSERT statements instead of records
    #[serde(default)]
    pub insert_statements: Vec<String>,
}

impl DocumentProcessorClient {
    /// Create a new document processor client
    pub fn new(endpoint: String, timeout_secs: u64) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            http_client,
        }
    }

    /// Send a document for extraction
    pub async fn process_document(
        &self,
        function_id: &str,
        user_id: Uuid,
        file_name: &str,
        content_type: &str,
        file_bytes: Vec<u8>,
    ) -> AppResult<ProcessDocumentResponse> {
        let part = Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::DocumentProcessor(format!("Invalid content type: {}", e)))?;

        let form = Form::new()
            .text("function_id", function_id.to_string())
            .text("user_id", user_id.to_string())
            .part("file", part);

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::DocumentProcessor(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::DocumentProcessor(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: ProcessDocumentResponse = response.json().await.map_err(|e| {
            AppError::DocumentProcessor(format!("Failed to parse response: {}", e))
        })?;

        Ok(result)
    }
}
