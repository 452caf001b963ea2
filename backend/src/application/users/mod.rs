//! User commands, queries, and their registration.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::Fault;

use super::Dispatcher;

mod commands;
mod queries;
mod rules;
mod view;

pub use commands::{
    CreateUser, CreateUserHandler, DeleteUser, DeleteUserHandler, UpdateUser, UpdateUserHandler,
};
pub use queries::{
    GetAllUsers, GetAllUsersHandler, GetUserById, GetUserByIdHandler, GetUsersPage,
    GetUsersPageHandler,
};
pub use rules::{create_user_rules, delete_user_rules, update_user_rules};
pub use view::UserView;

/// Register every user handler with its rules.
///
/// # Errors
/// Returns [`Fault::DuplicateHandler`] if any user request is already
/// registered.
pub fn register_user_handlers(
    dispatcher: &mut Dispatcher,
    clock: Arc<dyn Clock>,
) -> Result<(), Fault> {
    dispatcher.register_validated(CreateUserHandler::new(clock), create_user_rules())?;
    dispatcher.register_validated(UpdateUserHandler, update_user_rules())?;
    dispatcher.register_validated(DeleteUserHandler, delete_user_rules())?;
    dispatcher.register(GetUserByIdHandler)?;
    dispatcher.register(GetAllUsersHandler)?;
    dispatcher.register(GetUsersPageHandler)?;
    Ok(())
}
