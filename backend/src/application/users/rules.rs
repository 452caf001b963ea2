//! Validation rules for user commands.

use crate::application::{Rule, RuleSet};
use crate::domain::messages::{USER_EMAIL_MAX_LENGTH, USER_NAME_MAX_LENGTH};
use crate::domain::{is_valid_email, user_errors};

use super::{CreateUser, DeleteUser, UpdateUser};

fn name_present(name: &str) -> bool {
    !name.trim().is_empty()
}

fn name_fits(name: &str) -> bool {
    name.chars().count() <= USER_NAME_MAX_LENGTH
}

fn email_present(email: &str) -> bool {
    !email.trim().is_empty()
}

fn email_fits(email: &str) -> bool {
    email.chars().count() <= USER_EMAIL_MAX_LENGTH
}

pub fn create_user_rules() -> RuleSet<CreateUser> {
    RuleSet::new()
        .with(Rule::new("name_required", user_errors::name_empty(), |r: &CreateUser| {
            name_present(&r.name)
        }))
        .with(Rule::new("name_length", user_errors::name_too_long(), |r: &CreateUser| {
            name_fits(&r.name)
        }))
        .with(Rule::new("email_required", user_errors::email_empty(), |r: &CreateUser| {
            email_present(&r.email)
        }))
        .with(
            Rule::new("email_format", user_errors::email_invalid(), |r: &CreateUser| {
                is_valid_email(&r.email)
            })
            .when(|r: &CreateUser| email_present(&r.email)),
        )
        .with(Rule::new("email_length", user_errors::email_too_long(), |r: &CreateUser| {
            email_fits(&r.email)
        }))
}

pub fn update_user_rules() -> RuleSet<UpdateUser> {
    RuleSet::new()
        .with(Rule::new("id_required", user_errors::id_empty(), |r: &UpdateUser| {
            !r.id.is_nil()
        }))
        .with(Rule::new("name_required", user_errors::name_empty(), |r: &UpdateUser| {
            name_present(&r.name)
        }))
        .with(Rule::new("name_length", user_errors::name_too_long(), |r: &UpdateUser| {
            name_fits(&r.name)
        }))
        .with(Rule::new("email_required", user_errors::email_empty(), |r: &UpdateUser| {
            email_present(&r.email)
        }))
        .with(
            Rule::new("email_format", user_errors::email_invalid(), |r: &UpdateUser| {
                is_valid_email(&r.email)
            })
            .when(|r: &UpdateUser| email_present(&r.email)),
        )
        .with(Rule::new("email_length", user_errors::email_too_long(), |r: &UpdateUser| {
            email_fits(&r.email)
        }))
}

pub fn delete_user_rules() -> RuleSet<DeleteUser> {
    RuleSet::new().with(Rule::new("id_required", user_errors::id_empty(), |r: &DeleteUser| {
        !r.id.is_nil()
    }))
}
