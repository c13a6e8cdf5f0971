use actix_web::{get, post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        notification::repository_pg::NotificationRepositoryPg,
        relationship::{
            model::{
                RelationResponse, RelationshipCounts, RequestBody, RespondBody, StatusQuery,
                StatusResponse, TargetRef, UnfriendBody,
            },
            repository_pg::RelationshipRepositoryPg,
            service::RelationshipService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub type RelationshipSvc =
    RelationshipService<RelationshipRepositoryPg, UserRepositoryPg, NotificationRepositoryPg>;

fn require_target(
    id: Option<uuid::Uuid>,
    username: Option<String>,
) -> Result<TargetRef, error::Error> {
    TargetRef::from_parts(id, username)
        .ok_or_else(|| error::Error::bad_request("userId or username is required"))
}

#[get("/status")]
pub async fn relationship_status(
    service: web::Data<RelationshipSvc>,
    query: ValidatedQuery<StatusQuery>,
    req: HttpRequest,
) -> Result<success::Success<StatusResponse>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let target = require_target(query.0.user_id, query.0.username)?;

    let status = service.status(viewer, target).await?;
    Ok(success::Success::ok(Some(StatusResponse { status })))
}

#[post("/request")]
pub async fn send_request(
    service: web::Data<RelationshipSvc>,
    body: ValidatedJson<RequestBody>,
    req: HttpRequest,
) -> Result<success::Success<StatusResponse>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let target = require_target(body.0.to_user_id, body.0.username)?;

    let status = service.request(viewer, target).await?;
    Ok(success::Success::ok(Some(StatusResponse { status })))
}

#[post("/cancel")]
pub async fn cancel_request(
    service: web::Data<RelationshipSvc>,
    body: ValidatedJson<RequestBody>,
    req: HttpRequest,
) -> Result<success::Success<StatusResponse>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let target = require_target(body.0.to_user_id, body.0.username)?;

    let status = service.cancel(viewer, target).await?;
    Ok(success::Success::ok(Some(StatusResponse { status })))
}

#[post("/accept")]
pub async fn accept_request(
    service: web::Data<RelationshipSvc>,
    body: ValidatedJson<RespondBody>,
    req: HttpRequest,
) -> Result<success::Success<StatusResponse>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let target = require_target(body.0.from_user_id, body.0.username)?;

    let status = service.accept(viewer, target).await?;
    Ok(success::Success::ok(Some(StatusResponse { status })))
}

#[post("/decline")]
pub async fn decline_request(
    service: web::Data<RelationshipSvc>,
    body: ValidatedJson<RespondBody>,
    req: HttpRequest,
) -> Result<success::Success<StatusResponse>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let target = require_target(body.0.from_user_id, body.0.username)?;

    let status = service.decline(viewer, target).await?;
    Ok(success::Success::ok(Some(StatusResponse { status })))
}

#[post("/unfriend")]
pub async fn unfriend(
    service: web::Data<RelationshipSvc>,
    body: ValidatedJson<UnfriendBody>,
    req: HttpRequest,
) -> Result<success::Success<StatusResponse>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let target = require_target(body.0.user_id, body.0.username)?;

    let status = service.unfriend(viewer, target).await?;
    Ok(success::Success::ok(Some(StatusResponse { status })))
}

#[get("/counts")]
pub async fn relationship_counts(
    service: web::Data<RelationshipSvc>,
    req: HttpRequest,
) -> Result<success::Success<RelationshipCounts>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let counts = service.counts(viewer).await?;
    Ok(success::Success::ok(Some(counts)))
}

#[get("/incoming")]
pub async fn list_incoming(
    service: web::Data<RelationshipSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<RelationResponse>>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let requests = service.incoming(viewer).await?;
    Ok(success::Success::ok(Some(requests)))
}

#[get("/outgoing")]
pub async fn list_outgoing(
    service: web::Data<RelationshipSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<RelationResponse>>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let requests = service.outgoing(viewer).await?;
    Ok(success::Success::ok(Some(requests)))
}

#[get("/list")]
pub async fn list_friends(
    service: web::Data<RelationshipSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<RelationResponse>>, error::Error> {
    let viewer = get_claims(&req)?.sub;
    let friends = service.friends(viewer).await?;
    Ok(success::Success::ok(Some(friends)))
}
