use serde_json::json;

use super::ApiClient;
use crate::errors::Result;
use crate::models::{ApiMessage, NewReport, Report, ReportMessage, ResolveReport, SupportRequest};

impl ApiClient {
    pub async fn contact_support(&self, request: &SupportRequest) -> Result<ApiMessage> {
        self.post("/support", request).await
    }

    pub async fn submit_report(&self, report: &NewReport) -> Result<Report> {
        self.post("/reports", report).await
    }

    pub async fn my_reports(&self) -> Result<Vec<Report>> {
        self.get("/reports/me").await
    }

    /// Admin only.
    pub async fn all_reports(&self) -> Result<Vec<Report>> {
        self.get("/reports").await
    }

    pub async fn report_messages(&self, report_id: &str) -> Result<Vec<ReportMessage>> {
        self.get(&format!("/reports/{report_id}/messages")).await
    }

    pub async fn send_report_message(&self, report_id: &str, message: &str) -> Result<ReportMessage> {
        self.post(&format!("/reports/{report_id}/messages"), &json!({ "message": message })).await
    }

    pub async fn resolve_report(&self, report_id: &str, resolution: &ResolveReport) -> Result<Report> {
        self.put(&format!("/reports/{report_id}/resolve"), resolution).await
    }

    pub async fn delete_report(&self, report_id: &str) -> Result<()> {
        self.delete(&format!("/reports/{report_id}")).await
    }
}
