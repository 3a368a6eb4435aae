//! Field bounds for every request body. Each check reports the first failing
//! field only.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::api::{
    CreateArticleRequest, CreateCommentRequest, LoginRequest, SignupRequest,
    UpdateArticleRequest, UpdateProfileRequest,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub const USERNAME_LEN: (usize, usize) = (3, 30);
pub const EMAIL_LEN: (usize, usize) = (5, 30);
pub const PASSWORD_LEN: (usize, usize) = (5, 30);
pub const BIO_LEN: (usize, usize) = (5, 255);
pub const IMAGE_MAX: usize = 255;
pub const TITLE_LEN: (usize, usize) = (5, 70);
pub const DESCRIPTION_LEN: (usize, usize) = (5, 150);
pub const BODY_LEN: (usize, usize) = (5, 500);
pub const COMMENT_LEN: (usize, usize) = (3, 70);

/// Usernames are stored with all whitespace removed and lower-cased.
pub fn normalize_username(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Trims each tag and drops the blank ones, keeping order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(ValidationError(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn check_username(raw: &str) -> Result<(), ValidationError> {
    let username = normalize_username(raw);
    check_len("username", &username, USERNAME_LEN)?;
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError(
            "username must only contain alpha-numeric characters".into(),
        ));
    }
    Ok(())
}

fn check_email(raw: &str) -> Result<(), ValidationError> {
    let email = normalize_email(raw);
    check_len("email", &email, EMAIL_LEN)?;
    if !is_email(&email) {
        return Err(ValidationError("email must be a valid email".into()));
    }
    Ok(())
}

// Dot-atom local part, hostname labels, alphabetic TLD. Input is lower-cased first.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = r"\A[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}\z";
    Regex::new(pattern).expect("email pattern compiles")
});

fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_username(&self.username)?;
        check_email(&self.email)?;
        check_len("password", &self.password, PASSWORD_LEN)
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("username", &normalize_username(&self.username), USERNAME_LEN)?;
        check_len("password", &self.password, PASSWORD_LEN)
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            check_username(username)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(bio) = &self.bio {
            check_len("bio", bio, BIO_LEN)?;
        }
        if let Some(image) = &self.image {
            check_len("image", image, (0, IMAGE_MAX))?;
        }
        Ok(())
    }
}

impl Validate for CreateArticleRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("title", &self.title, TITLE_LEN)?;
        check_len("description", &self.description, DESCRIPTION_LEN)?;
        check_len("body", &self.body, BODY_LEN)
    }
}

impl Validate for UpdateArticleRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            check_len("title", title, TITLE_LEN)?;
        }
        if let Some(description) = &self.description {
            check_len("description", description, DESCRIPTION_LEN)?;
        }
        if let Some(body) = &self.body {
            check_len("body", body, BODY_LEN)?;
        }
        Ok(())
    }
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_len("text", &self.text, COMMENT_LEN)
    }
}
