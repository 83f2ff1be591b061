use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::tickets::repo::{Attachment, MessageRecord, TicketCounts, TicketRecord, TicketStatus};

/// Create request. Fields are optional at the serde level so that a missing
/// field reaches validation (and maps to 400) instead of failing extraction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub ticket_name: Option<String>,
    pub description: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub manager_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub text: Option<String>,
    pub sender: Option<String>,
}

/// Public identity of a ticket's creator or assignee.
#[derive(Debug, Clone, Serialize)]
pub struct Party {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub sender: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub attachments: Vec<Attachment>,
}

impl From<MessageRecord> for MessageDto {
    fn from(m: MessageRecord) -> Self {
        Self {
            id: m.id,
            sender: m.sender,
            text: m.text,
            timestamp: m.sent_at,
            attachments: m.attachments.0,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    pub id: Uuid,
    pub ticket_name: String,
    pub description: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub status: TicketStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub created_by: Party,
    pub assigned_to: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<MessageDto>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TicketDto {
    pub fn from_record(rec: TicketRecord, messages: Option<Vec<MessageRecord>>) -> Self {
        let assigned_to = match (rec.assigned_to, rec.assignee_name, rec.assignee_email) {
            (Some(id), Some(name), Some(email)) => Some(Party { id, name, email }),
            _ => None,
        };
        Self {
            id: rec.id,
            ticket_name: rec.ticket_name,
            description: rec.description,
            contact_name: rec.contact_name,
            email: rec.email,
            phone: rec.phone,
            status: rec.status,
            due_date: rec.due_date,
            created_by: Party {
                id: rec.created_by,
                name: rec.creator_name,
                email: rec.creator_email,
            },
            assigned_to,
            messages: messages.map(|ms| ms.into_iter().map(MessageDto::from).collect()),
            created_at: rec.created_at,
            updated_at: rec.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketEnvelope {
    pub ticket: TicketDto,
}

#[derive(Debug, Serialize)]
pub struct TicketListEnvelope {
    pub count: usize,
    pub tickets: Vec<TicketDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub open: i64,
    pub closed: i64,
    pub on_hold: i64,
    pub total: i64,
}

impl From<TicketCounts> for Stats {
    fn from(c: TicketCounts) -> Self {
        Self {
            open: c.open,
            closed: c.closed,
            on_hold: c.on_hold,
            total: c.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsEnvelope {
    pub stats: Stats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEnvelope {
    pub deleted_ticket_id: Uuid,
}
