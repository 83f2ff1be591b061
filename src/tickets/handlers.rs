use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::{AuthUser, ManagerUser};
use crate::auth::repo::User;
use crate::auth::{Claims, Role};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::tickets::dto::{
    AddMessageRequest, AssignRequest, CreateTicketRequest, DeleteEnvelope, ListQuery, Stats,
    StatsEnvelope, TicketDto, TicketEnvelope, TicketListEnvelope, UpdateStatusRequest,
};
use crate::tickets::repo::{MessageRecord, TicketRecord, TicketStatus};
use crate::tickets::validate::{validate_message, validate_new_ticket};

/// Managers see everything; everyone else only their own tickets.
fn owner_scope(claims: &Claims) -> Option<Uuid> {
    if claims.role.can_moderate() {
        None
    } else {
        Some(claims.sub)
    }
}

fn parse_status(raw: &str) -> ApiResult<TicketStatus> {
    raw.parse()
        .map_err(|_| ApiError::InvalidInput("Invalid status".into()))
}

#[instrument(skip(state, payload))]
pub async fn create_ticket(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<TicketEnvelope>)> {
    let new = validate_new_ticket(&payload).map_err(ApiError::InvalidInput)?;

    let ticket = TicketRecord::insert(
        &state.db,
        &new.ticket_name,
        &new.description,
        &new.contact_name,
        &new.email,
        &new.phone,
        new.due_date,
        claims.sub,
    )
    .await?;

    info!(ticket_id = %ticket.id, user_id = %claims.sub, "ticket created");
    Ok((
        StatusCode::CREATED,
        Json(TicketEnvelope {
            ticket: TicketDto::from_record(ticket, None),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_tickets(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<TicketListEnvelope>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let tickets = TicketRecord::list(
        &state.db,
        owner_scope(&claims),
        status,
        query.search.as_deref(),
    )
    .await?;

    let tickets: Vec<TicketDto> = tickets
        .into_iter()
        .map(|t| TicketDto::from_record(t, None))
        .collect();
    Ok(Json(TicketListEnvelope {
        count: tickets.len(),
        tickets,
    }))
}

#[instrument(skip(state))]
pub async fn ticket_stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<StatsEnvelope>> {
    let counts = TicketRecord::counts(&state.db, owner_scope(&claims)).await?;
    Ok(Json(StatsEnvelope {
        stats: Stats::from(counts),
    }))
}

#[instrument(skip(state))]
pub async fn get_ticket(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TicketEnvelope>> {
    let ticket = TicketRecord::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".into()))?;

    if !claims.role.can_moderate() && ticket.created_by != claims.sub {
        warn!(ticket_id = %id, user_id = %claims.sub, "ticket view denied");
        return Err(ApiError::Forbidden(
            "Not authorized to view this ticket".into(),
        ));
    }

    let messages = MessageRecord::list_for_ticket(&state.db, id).await?;
    Ok(Json(TicketEnvelope {
        ticket: TicketDto::from_record(ticket, Some(messages)),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_ticket_status(
    State(state): State<AppState>,
    ManagerUser(claims): ManagerUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<TicketEnvelope>> {
    let status = payload
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?
        .ok_or_else(|| ApiError::InvalidInput("Invalid status".into()))?;

    let ticket = TicketRecord::update_status(&state.db, id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".into()))?;

    info!(ticket_id = %id, user_id = %claims.sub, status = %status, "ticket status updated");
    Ok(Json(TicketEnvelope {
        ticket: TicketDto::from_record(ticket, None),
    }))
}

#[instrument(skip(state))]
pub async fn delete_ticket(
    State(state): State<AppState>,
    ManagerUser(claims): ManagerUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteEnvelope>> {
    if !TicketRecord::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Ticket not found".into()));
    }
    info!(ticket_id = %id, user_id = %claims.sub, "ticket deleted");
    Ok(Json(DeleteEnvelope {
        deleted_ticket_id: id,
    }))
}

#[instrument(skip(state, payload))]
pub async fn assign_ticket(
    State(state): State<AppState>,
    ManagerUser(claims): ManagerUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> ApiResult<Json<TicketEnvelope>> {
    let manager_id: Uuid = payload
        .manager_id
        .as_deref()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ApiError::InvalidInput("Invalid manager ID".into()))?;

    // The assignee must be an existing manager
    match User::find_by_id(&state.db, manager_id).await? {
        Some(user) if user.role == Role::Manager => {}
        _ => return Err(ApiError::InvalidInput("Invalid manager ID".into())),
    }

    let ticket = TicketRecord::assign(&state.db, id, manager_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".into()))?;

    info!(ticket_id = %id, manager_id = %manager_id, user_id = %claims.sub, "ticket assigned");
    Ok(Json(TicketEnvelope {
        ticket: TicketDto::from_record(ticket, None),
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_message(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMessageRequest>,
) -> ApiResult<(StatusCode, Json<TicketEnvelope>)> {
    let (text, sender) = validate_message(payload.text.as_deref(), payload.sender.as_deref())
        .map_err(ApiError::InvalidInput)?;

    let message = MessageRecord::append(&state.db, id, &sender, &text)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".into()))?;

    let ticket = TicketRecord::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".into()))?;
    let messages = MessageRecord::list_for_ticket(&state.db, id).await?;

    info!(ticket_id = %id, message_id = %message.id, user_id = %claims.sub, "message added");
    Ok((
        StatusCode::CREATED,
        Json(TicketEnvelope {
            ticket: TicketDto::from_record(ticket, Some(messages)),
        }),
    ))
}
