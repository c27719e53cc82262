use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Accounts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    #[default]
    User,
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user together with the bearer token issued at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Login, signup and verification all answer with the user object plus an optional banner.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub user: AuthenticatedUser,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyEmailRequest {
    pub code: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub invoice_path: Option<String>,
}

impl Payment {
    /// File name of the invoice, whatever separator the server used in its path.
    pub fn invoice_file_name(&self) -> Option<&str> {
        let path = self.invoice_path.as_deref()?;
        path.rsplit(|c: char| c == '/' || c == '\\').next().filter(|name| !name.is_empty())
    }
}

/// Generic `{ message }` / `{ error }` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Agents ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "name")]
    pub agent_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "vendorId")]
    pub owner: Option<String>,
    #[serde(default)]
    pub vendor_email: Option<String>,
}

/// Fields an admin or vendor may set when creating or editing an agent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ── Chat ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    #[serde(alias = "assistant")]
    Model,
    Vendor,
    Admin,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
            MessageRole::Vendor => "vendor",
            MessageRole::Admin => "admin",
        }
    }

    /// Maps a backend `senderType`/`senderRole` field; absent or unknown senders are users.
    pub fn from_sender(sender: Option<&str>) -> Self {
        sender
            .and_then(|s| MessageRole::try_from(s.to_string()).ok())
            .unwrap_or(MessageRole::User)
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "model" | "assistant" => Ok(MessageRole::Model),
            "vendor" => Ok(MessageRole::Vendor),
            "admin" => Ok(MessageRole::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// One entry of a conversation timeline. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(alias = "_id")]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// A locally-originated message with a fresh client-generated id.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[serde(alias = "id", alias = "_id")]
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => "Untitled Session",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(alias = "id", alias = "_id")]
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    #[serde(alias = "id", alias = "_id")]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub content: String,
    pub history: Vec<Message>,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    pub client_message_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

// ── Notifications ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Alert,
    Success,
    #[default]
    #[serde(other)]
    Info,
}

/// Set by the backend; the client never infers it from message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    AgentReview,
    #[default]
    #[serde(other)]
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub category: NotificationCategory,
}

// ── Support tickets ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportRequest {
    pub email: String,
    pub issue_type: String,
    pub message: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TryFrom<String> for ReportPriority {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ReportPriority::Low),
            "medium" => Ok(ReportPriority::Medium),
            "high" => Ok(ReportPriority::High),
            other => Err(format!("Unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReport {
    #[serde(rename = "type")]
    pub report_type: String,
    pub description: String,
    pub priority: ReportPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub report_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: ReportPriority,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution_note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport {
    pub status: ReportStatus,
    pub resolution_note: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMessage {
    #[serde(alias = "_id")]
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub sender_role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReportMessage> for Message {
    fn from(m: ReportMessage) -> Self {
        Self {
            id: m.id,
            role: MessageRole::from_sender(m.sender_role.as_deref()),
            content: m.message,
            timestamp: m.created_at,
        }
    }
}

// ── Vendor support chat ───────────────────────────────────────────────────────

/// `{ success, data }` wrapper used by the vendor messaging endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
}

/// One stored inquiry; a vendor's answer may be attached to it as `replyMessage`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorMessageRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sender_type: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reply_message: Option<String>,
    #[serde(default)]
    pub replied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorInbox {
    #[serde(default)]
    pub messages: Vec<VendorMessageRecord>,
}

/// Identifies one user ↔ vendor conversation about one agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    pub user_id: String,
    pub vendor_id: String,
    pub agent_id: String,
}

impl ThreadKey {
    pub fn query(&self) -> [(&'static str, &str); 3] {
        [
            ("userId", self.user_id.as_str()),
            ("vendorId", self.vendor_id.as_str()),
            ("agentId", self.agent_id.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactVendorRequest {
    pub agent_id: String,
    pub vendor_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub subject: String,
    pub message: String,
    pub sender_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorReplyRequest {
    pub user_id: String,
    pub agent_id: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_accepts_mongo_ids_and_defaults_role() {
        let user: AuthenticatedUser = serde_json::from_str(
            r#"{"_id":"u1","name":"Ada","email":"ada@example.com","token":"t0k"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn auth_response_flattens_user() {
        let resp: AuthResponse = serde_json::from_str(
            r#"{"message":"Welcome back","id":"u2","email":"v@example.com","role":"vendor","token":"abc"}"#,
        )
        .unwrap();
        assert_eq!(resp.message.as_deref(), Some("Welcome back"));
        assert_eq!(resp.user.role, Role::Vendor);
    }

    #[test]
    fn sender_roles_are_parsed_explicitly() {
        assert_eq!(MessageRole::from_sender(Some("Vendor")), MessageRole::Vendor);
        assert_eq!(MessageRole::from_sender(Some("ADMIN")), MessageRole::Admin);
        assert_eq!(MessageRole::from_sender(None), MessageRole::User);
        assert_eq!(MessageRole::from_sender(Some("robot")), MessageRole::User);
    }

    #[test]
    fn chat_messages_use_millisecond_timestamps() {
        let msg: Message = serde_json::from_str(
            r#"{"id":"m1","role":"model","content":"hi","timestamp":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(msg.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(msg.role, MessageRole::Model);
    }

    #[test]
    fn notification_kinds_and_categories() {
        let n: Notification = serde_json::from_str(
            r#"{"_id":"n1","title":"Approved","message":"good work","type":"SUCCESS","createdAt":"2024-05-01T10:00:00Z","category":"agentReview"}"#,
        )
        .unwrap();
        assert_eq!(n.kind, NotificationKind::Success);
        assert_eq!(n.category, NotificationCategory::AgentReview);
        assert!(!n.is_read);

        let odd: Notification = serde_json::from_str(
            r#"{"_id":"n2","message":"x","type":"WEIRD","createdAt":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(odd.kind, NotificationKind::Info);
        assert_eq!(odd.category, NotificationCategory::General);
    }

    #[test]
    fn unknown_notification_category_falls_back_to_general() {
        let n: Notification = serde_json::from_str(
            r#"{"_id":"n3","message":"x","type":"ALERT","createdAt":"2024-05-01T10:00:00Z","category":"billing"}"#,
        )
        .unwrap();
        assert_eq!(n.kind, NotificationKind::Alert);
        assert_eq!(n.category, NotificationCategory::General);
        assert_eq!(serde_json::to_value(n.kind).unwrap(), "ALERT");
    }

    #[test]
    fn untitled_sessions_get_a_fallback_title() {
        let blank = SessionSummary { session_id: "s1".into(), title: Some("  ".into()), last_modified: None };
        assert_eq!(blank.display_title(), "Untitled Session");
        let named = SessionSummary { session_id: "s2".into(), title: Some("Trip plan".into()), last_modified: None };
        assert_eq!(named.display_title(), "Trip plan");
    }

    #[test]
    fn invoice_file_name_handles_both_separators() {
        let mut p = Payment {
            id: "p1".into(),
            agent_name: None,
            amount: 9.5,
            currency: None,
            status: None,
            created_at: Utc::now(),
            invoice_path: Some(r"C:\invoices\2024\inv-7.pdf".into()),
        };
        assert_eq!(p.invoice_file_name(), Some("inv-7.pdf"));
        p.invoice_path = Some("/srv/invoices/inv-8.pdf".into());
        assert_eq!(p.invoice_file_name(), Some("inv-8.pdf"));
        p.invoice_path = None;
        assert_eq!(p.invoice_file_name(), None);
    }
}
