//! User queries and their handlers.

use async_trait::async_trait;
use pagination::{PaginatedResult, PaginationRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{HandlerResult, Request, RequestContext, RequestHandler, RequestKind};
use crate::domain::{User, user_errors};

use super::UserView;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserById {
    pub id: Uuid,
}

impl Request for GetUserById {
    type Response = UserView;
    const NAME: &'static str = "GetUserById";
    const KIND: RequestKind = RequestKind::Query;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetAllUsers;

impl Request for GetAllUsers {
    type Response = Vec<UserView>;
    const NAME: &'static str = "GetAllUsers";
    const KIND: RequestKind = RequestKind::Query;
}

/// One page of users ordered by `pagination.sort_by()`.
///
/// Sortable fields are `id`, `name`, `email`, `createdAt` and `updatedAt`;
/// anything else orders by id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetUsersPage {
    pub pagination: PaginationRequest,
}

impl Request for GetUsersPage {
    type Response = PaginatedResult<UserView>;
    const NAME: &'static str = "GetUsersPage";
    const KIND: RequestKind = RequestKind::Query;
}

pub struct GetUserByIdHandler;

#[async_trait]
impl RequestHandler<GetUserById> for GetUserByIdHandler {
    async fn handle(&self, request: GetUserById, ctx: &RequestContext) -> HandlerResult<UserView> {
        let user = ctx.repository::<User>().get_by_id(request.id).await?;
        Ok(user
            .map(UserView::from)
            .ok_or_else(|| user_errors::not_found().into()))
    }
}

pub struct GetAllUsersHandler;

#[async_trait]
impl RequestHandler<GetAllUsers> for GetAllUsersHandler {
    async fn handle(
        &self,
        _request: GetAllUsers,
        ctx: &RequestContext,
    ) -> HandlerResult<Vec<UserView>> {
        let users = ctx.repository::<User>().get_all().await?;
        Ok(Ok(users.iter().map(UserView::from).collect()))
    }
}

pub struct GetUsersPageHandler;

#[async_trait]
impl RequestHandler<GetUsersPage> for GetUsersPageHandler {
    async fn handle(
        &self,
        request: GetUsersPage,
        ctx: &RequestContext,
    ) -> HandlerResult<PaginatedResult<UserView>> {
        let page = &request.pagination;
        let window = ctx
            .repository::<User>()
            .get_counted_window(
                page.skip(),
                u64::from(page.page_size()),
                page.sort_by(),
                page.sort_descending(),
            )
            .await?;
        let views = window.items.iter().map(UserView::from).collect();
        Ok(Ok(PaginatedResult::new(views, page, window.total)))
    }
}
