//! Plain-text rendering for the terminal client. Pure functions over state.

use crate::models::{Message, MessageRole, Notification, NotificationKind, SessionSummary};
use crate::service::ActiveSession;
use crate::sync::ConversationState;

fn speaker(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "You",
        MessageRole::Model => "Agent",
        MessageRole::Vendor => "Vendor",
        MessageRole::Admin => "Support",
    }
}

pub fn message_line(message: &Message, pending: bool) -> String {
    let marker = if pending { " (sending…)" } else { "" };
    format!(
        "[{}] {}{marker}: {}",
        message.timestamp.format("%H:%M"),
        speaker(message.role),
        message.content
    )
}

/// The conversation in timestamp order; entries not yet confirmed are marked.
pub fn timeline_lines(state: &ConversationState) -> Vec<String> {
    state
        .timeline()
        .iter()
        .map(|m| message_line(m, state.is_pending(&m.id)))
        .collect()
}

pub fn sidebar_lines(sessions: &[SessionSummary], active: &ActiveSession) -> Vec<String> {
    let mut lines = Vec::with_capacity(sessions.len() + 1);
    let new_marker = if *active == ActiveSession::New { '>' } else { ' ' };
    lines.push(format!("{new_marker} + New chat"));
    for session in sessions {
        let marker = if active.id() == Some(session.session_id.as_str()) { '>' } else { ' ' };
        lines.push(format!("{marker} {}  ({})", session.display_title(), session.session_id));
    }
    lines
}

pub fn notification_badge(unread: usize) -> String {
    match unread {
        0 => "Notifications".to_string(),
        n if n > 9 => "Notifications (9+)".to_string(),
        n => format!("Notifications ({n})"),
    }
}

pub fn notification_lines(notifications: &[Notification]) -> Vec<String> {
    let unread = notifications.iter().filter(|n| !n.is_read).count();
    let mut lines = vec![notification_badge(unread)];
    lines.extend(notifications.iter().map(|n| {
        let dot = if n.is_read { ' ' } else { '*' };
        let kind = match n.kind {
            NotificationKind::Info => "info",
            NotificationKind::Alert => "alert",
            NotificationKind::Success => "ok",
        };
        format!("{dot} [{kind}] {}: {}  ({})", n.title, n.message, n.created_at.format("%Y-%m-%d %H:%M"))
    }));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationCategory;
    use crate::sync::Reconciled;
    use chrono::{TimeZone, Utc};

    fn message(id: &str, role: MessageRole, content: &str, minute: u32) -> Message {
        Message {
            id: id.into(),
            role,
            content: content.into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn pending_entries_are_marked() {
        let mut state = ConversationState::default();
        state.apply_snapshot(1, vec![message("a", MessageRole::Model, "Hello!", 0)]);
        state.push_pending(message("b", MessageRole::User, "Hi", 1));

        let lines = timeline_lines(&state);
        assert_eq!(lines[0], "[10:00] Agent: Hello!");
        assert_eq!(lines[1], "[10:01] You (sending…): Hi");
    }

    #[test]
    fn sidebar_marks_active_and_untitled() {
        let sessions = vec![
            SessionSummary { session_id: "s1".into(), title: None, last_modified: None },
            SessionSummary { session_id: "s2".into(), title: Some("Taxes".into()), last_modified: None },
        ];
        let lines = sidebar_lines(&sessions, &ActiveSession::Existing("s2".into()));
        assert_eq!(lines, vec!["  + New chat", "  Untitled Session  (s1)", "> Taxes  (s2)"]);
    }

    #[test]
    fn badge_caps_at_nine() {
        assert_eq!(notification_badge(0), "Notifications");
        assert_eq!(notification_badge(3), "Notifications (3)");
        assert_eq!(notification_badge(12), "Notifications (9+)");
    }

    #[test]
    fn unread_notifications_get_a_dot() {
        let n = Notification {
            id: "n1".into(),
            title: "Agent approved".into(),
            message: "Your agent is live".into(),
            kind: NotificationKind::Success,
            is_read: false,
            created_at: Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 0).unwrap(),
            target_id: None,
            category: NotificationCategory::AgentReview,
        };
        let lines = notification_lines(&[n]);
        assert_eq!(lines[0], "Notifications (1)");
        assert_eq!(lines[1], "* [ok] Agent approved: Your agent is live  (2024-02-03 04:05)");
    }
}
