//! User commands and their handlers.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::application::{HandlerResult, Request, RequestContext, RequestHandler, RequestKind};
use crate::domain::ports::StorageError;
use crate::domain::{Entity, Success, User, user_errors};

use super::UserView;

/// Register a new user. Runs in its own transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub email: String,
    pub name: String,
}

impl Request for CreateUser {
    type Response = UserView;
    const NAME: &'static str = "CreateUser";
    const KIND: RequestKind = RequestKind::Command;
    const TRANSACTIONAL: bool = true;
}

/// Replace a user's name and email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl Request for UpdateUser {
    type Response = UserView;
    const NAME: &'static str = "UpdateUser";
    const KIND: RequestKind = RequestKind::Command;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUser {
    pub id: Uuid,
}

impl Request for DeleteUser {
    type Response = Success;
    const NAME: &'static str = "DeleteUser";
    const KIND: RequestKind = RequestKind::Command;
}

/// Re-read a user after saving so the view carries stamped audit fields.
async fn reload(ctx: &RequestContext, id: Uuid) -> Result<User, StorageError> {
    ctx.repository::<User>()
        .get_by_id(id)
        .await?
        .ok_or_else(|| StorageError::query(format!("user {id} missing after save")))
}

pub struct CreateUserHandler {
    clock: Arc<dyn Clock>,
}

impl CreateUserHandler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl RequestHandler<CreateUser> for CreateUserHandler {
    async fn handle(&self, request: CreateUser, ctx: &RequestContext) -> HandlerResult<UserView> {
        let users = ctx.repository::<User>();
        if users.email_exists(&request.email).await? {
            return Ok(Err(user_errors::email_already_exists().into()));
        }

        let user = User::create(request.email, request.name, self.clock.utc());
        let id = user.id();
        users.add(user).await;
        if let Err(errors) = ctx.save_changes().await? {
            return Ok(Err(errors));
        }

        debug!(user_id = %id, "user created");
        Ok(Ok(UserView::from(reload(ctx, id).await?)))
    }
}

pub struct UpdateUserHandler;

#[async_trait]
impl RequestHandler<UpdateUser> for UpdateUserHandler {
    async fn handle(&self, request: UpdateUser, ctx: &RequestContext) -> HandlerResult<UserView> {
        let users = ctx.repository::<User>();
        let Some(mut user) = users.get_by_id(request.id).await? else {
            return Ok(Err(user_errors::not_found().into()));
        };

        let email_taken = users
            .exists(|other| {
                other.id() != request.id && other.email().eq_ignore_ascii_case(&request.email)
            })
            .await?;
        if email_taken {
            return Ok(Err(user_errors::email_already_exists().into()));
        }

        user.rename(request.name);
        user.change_email(request.email);
        users.update(user).await;
        if let Err(errors) = ctx.save_changes().await? {
            return Ok(Err(errors));
        }

        Ok(Ok(UserView::from(reload(ctx, request.id).await?)))
    }
}

pub struct DeleteUserHandler;

#[async_trait]
impl RequestHandler<DeleteUser> for DeleteUserHandler {
    async fn handle(&self, request: DeleteUser, ctx: &RequestContext) -> HandlerResult<Success> {
        let users = ctx.repository::<User>();
        let Some(user) = users.get_by_id(request.id).await? else {
            return Ok(Err(user_errors::not_found().into()));
        };

        users.delete(user).await;
        if let Err(errors) = ctx.save_changes().await? {
            return Ok(Err(errors));
        }
        Ok(Ok(Success))
    }
}
