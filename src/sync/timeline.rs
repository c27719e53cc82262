//! Flattening server records into display timelines.

use std::collections::HashMap;

use crate::models::{Message, MessageRole, VendorMessageRecord};

/// Orders by timestamp. Stable, so equal timestamps keep their arrival order.
pub fn sort_timeline(messages: &mut [Message]) {
    messages.sort_by_key(|m| m.timestamp);
}

/// Turns vendor inquiry records into timeline entries.
///
/// A record carrying a non-empty `replyMessage` contributes a second entry, id
/// `<id>_reply`, authored by the vendor and timestamped with `repliedAt`, falling
/// back to `updatedAt` and then `createdAt`.
pub fn expand_vendor_records(records: Vec<VendorMessageRecord>) -> Vec<Message> {
    let mut entries = Vec::with_capacity(records.len() * 2);
    for record in records {
        let reply_at = record.replied_at.or(record.updated_at).unwrap_or(record.created_at);
        let reply_id = format!("{}_reply", record.id);
        entries.push(Message {
            id: record.id,
            role: MessageRole::from_sender(record.sender_type.as_deref()),
            content: record.message,
            timestamp: record.created_at,
        });
        if let Some(reply) = record.reply_message.filter(|r| !r.is_empty()) {
            entries.push(Message {
                id: reply_id,
                role: MessageRole::Vendor,
                content: reply,
                timestamp: reply_at,
            });
        }
    }
    sort_timeline(&mut entries);
    entries
}

/// One row per agent: the most recent record, newest threads first.
pub fn inbox_threads(records: Vec<VendorMessageRecord>) -> Vec<VendorMessageRecord> {
    let mut latest: HashMap<String, VendorMessageRecord> = HashMap::new();
    for record in records {
        let key = record.agent_id.clone().unwrap_or_default();
        match latest.get(&key) {
            Some(existing) if existing.created_at >= record.created_at => {}
            _ => {
                latest.insert(key, record);
            }
        }
    }
    let mut threads: Vec<_> = latest.into_values().collect();
    threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    threads
}
