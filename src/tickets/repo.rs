use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Ticket workflow status. Transitions are unrestricted among the three
/// values; only the set itself is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status")]
pub enum TicketStatus {
    Open,
    Closed,
    #[sqlx(rename = "On Hold")]
    #[serde(rename = "On Hold")]
    OnHold,
}

impl FromStr for TicketStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(TicketStatus::Open),
            "Closed" => Ok(TicketStatus::Closed),
            "On Hold" => Ok(TicketStatus::OnHold),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketStatus::Open => "Open",
            TicketStatus::Closed => "Closed",
            TicketStatus::OnHold => "On Hold",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

/// Message row. Append-only: no update or delete queries exist for it.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRecord {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub sender: String,
    pub text: String,
    pub attachments: Json<Vec<Attachment>>,
    pub sent_at: OffsetDateTime,
}

/// Ticket row joined with the public identity of its creator and assignee.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRecord {
    pub id: Uuid,
    pub ticket_name: String,
    pub description: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub status: TicketStatus,
    pub due_date: OffsetDateTime,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub creator_name: String,
    pub creator_email: String,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct TicketCounts {
    pub open: i64,
    pub closed: i64,
    pub on_hold: i64,
    pub total: i64,
}

const SELECT_TICKET: &str = r#"
SELECT t.id, t.ticket_name, t.description, t.contact_name, t.email, t.phone,
       t.status, t.due_date, t.created_by, t.assigned_to, t.created_at, t.updated_at,
       c.name AS creator_name, c.email AS creator_email,
       a.name AS assignee_name, a.email AS assignee_email
FROM tickets t
JOIN users c ON c.id = t.created_by
LEFT JOIN users a ON a.id = t.assigned_to
"#;

impl TicketRecord {
    pub async fn insert(
        db: &PgPool,
        ticket_name: &str,
        description: &str,
        contact_name: &str,
        email: &str,
        phone: &str,
        due_date: OffsetDateTime,
        created_by: Uuid,
    ) -> anyhow::Result<TicketRecord> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO tickets (ticket_name, description, contact_name, email, phone, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(ticket_name)
        .bind(description)
        .bind(contact_name)
        .bind(email)
        .bind(phone)
        .bind(due_date)
        .bind(created_by)
        .fetch_one(db)
        .await?;

        Self::find(db, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("inserted ticket {id} not found"))
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<TicketRecord>> {
        let query = format!("{SELECT_TICKET} WHERE t.id = $1");
        let ticket = sqlx::query_as::<_, TicketRecord>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(ticket)
    }

    /// List tickets newest-first. `owner` restricts to a creator (non-manager
    /// scope), `status` and `search` are the optional query filters.
    pub async fn list(
        db: &PgPool,
        owner: Option<Uuid>,
        status: Option<TicketStatus>,
        search: Option<&str>,
    ) -> anyhow::Result<Vec<TicketRecord>> {
        let query = format!(
            r#"{SELECT_TICKET}
            WHERE ($1::uuid IS NULL OR t.created_by = $1)
              AND ($2::ticket_status IS NULL OR t.status = $2)
              AND ($3::text IS NULL
                   OR t.ticket_name ILIKE $3
                   OR t.contact_name ILIKE $3
                   OR t.email ILIKE $3)
            ORDER BY t.created_at DESC
            "#
        );
        let pattern = search.map(|s| format!("%{s}%"));
        let tickets = sqlx::query_as::<_, TicketRecord>(&query)
            .bind(owner)
            .bind(status)
            .bind(pattern)
            .fetch_all(db)
            .await?;
        Ok(tickets)
    }

    pub async fn update_status(
        db: &PgPool,
        id: Uuid,
        status: TicketStatus,
    ) -> anyhow::Result<Option<TicketRecord>> {
        let updated: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE tickets
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(db)
        .await?;
        match updated {
            Some(_) => Self::find(db, id).await,
            None => Ok(None),
        }
    }

    pub async fn assign(
        db: &PgPool,
        id: Uuid,
        manager_id: Uuid,
    ) -> anyhow::Result<Option<TicketRecord>> {
        let updated: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE tickets
            SET assigned_to = $2, updated_at = now()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(manager_id)
        .fetch_optional(db)
        .await?;
        match updated {
            Some(_) => Self::find(db, id).await,
            None => Ok(None),
        }
    }

    /// Delete a ticket; its messages cascade. Returns false if absent.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let deleted: Option<(Uuid,)> = sqlx::query_as(
            r#"DELETE FROM tickets WHERE id = $1 RETURNING id"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(deleted.is_some())
    }

    /// Per-status counts scoped like `list`. The total is computed in the
    /// same query, so it always equals the sum of the three.
    pub async fn counts(db: &PgPool, owner: Option<Uuid>) -> anyhow::Result<TicketCounts> {
        let counts = sqlx::query_as::<_, TicketCounts>(
            r#"
            SELECT count(*) FILTER (WHERE status = 'Open')    AS open,
                   count(*) FILTER (WHERE status = 'Closed')  AS closed,
                   count(*) FILTER (WHERE status = 'On Hold') AS on_hold,
                   count(*)                                   AS total
            FROM tickets
            WHERE ($1::uuid IS NULL OR created_by = $1)
            "#,
        )
        .bind(owner)
        .fetch_one(db)
        .await?;
        Ok(counts)
    }
}

impl MessageRecord {
    pub async fn list_for_ticket(
        db: &PgPool,
        ticket_id: Uuid,
    ) -> anyhow::Result<Vec<MessageRecord>> {
        let messages = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, ticket_id, sender, text, attachments, sent_at
            FROM messages
            WHERE ticket_id = $1
            ORDER BY sent_at
            "#,
        )
        .bind(ticket_id)
        .fetch_all(db)
        .await?;
        Ok(messages)
    }

    /// Append a message and bump the ticket's updated_at in one transaction.
    /// Returns None when the ticket does not exist.
    pub async fn append(
        db: &PgPool,
        ticket_id: Uuid,
        sender: &str,
        text: &str,
    ) -> anyhow::Result<Option<MessageRecord>> {
        let mut tx = db.begin().await?;

        let touched: Option<(Uuid,)> = sqlx::query_as(
            r#"UPDATE tickets SET updated_at = now() WHERE id = $1 RETURNING id"#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?;

        if touched.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let message = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (ticket_id, sender, text)
            VALUES ($1, $2, $3)
            RETURNING id, ticket_id, sender, text, attachments, sent_at
            "#,
        )
        .bind(ticket_id)
        .bind(sender)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_exactly_three_values() {
        assert_eq!("Open".parse(), Ok(TicketStatus::Open));
        assert_eq!("Closed".parse(), Ok(TicketStatus::Closed));
        assert_eq!("On Hold".parse(), Ok(TicketStatus::OnHold));
        assert!(TicketStatus::from_str("open").is_err());
        assert!(TicketStatus::from_str("Pending").is_err());
        assert!(TicketStatus::from_str("").is_err());
    }

    #[test]
    fn status_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::OnHold).unwrap(),
            "\"On Hold\""
        );
        let parsed: TicketStatus = serde_json::from_str("\"On Hold\"").unwrap();
        assert_eq!(parsed, TicketStatus::OnHold);
    }

    #[test]
    fn status_display_matches_parse() {
        for s in [TicketStatus::Open, TicketStatus::Closed, TicketStatus::OnHold] {
            assert_eq!(s.to_string().parse(), Ok(s));
        }
    }
}
