use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a back-office account. Only `Admin` and `Editor` may sign in.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    #[default]
    User,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
            UserRole::User => "user",
        }
    }

    pub fn can_sign_in(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Editor)
    }
}

/// Shared active/inactive flag (users, videos, drawings).
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Published,
}

/// Feedback triage state. Declaration order is the sort order: pending first.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "feedback_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    #[default]
    Pending,
    Answered,
    Archived,
}

impl FeedbackStatus {
    /// Parses a `?status=` filter. `all`, empty and unknown values mean "no filter".
    pub fn from_filter(raw: Option<&str>) -> Option<FeedbackStatus> {
        match raw? {
            "pending" => Some(FeedbackStatus::Pending),
            "answered" => Some(FeedbackStatus::Answered),
            "archived" => Some(FeedbackStatus::Archived),
            _ => None,
        }
    }
}

/// `users` row. `password_hash` never leaves the server; see `FilterUserDto`.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub status: ActiveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// News article. `content` is sanitized HTML from the admin editor.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
    pub status: PostStatus,
    pub views: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub pdf_file: Option<String>,
    pub category_id: Option<i64>,
    pub status: ProjectStatus,
    pub views: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category tree node; `parent_id` points at another category.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub display_order: i32,
    pub status: ActiveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Home page carousel item.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Slide {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Downloadable AutoCAD drawing.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Drawing {
    pub id: i64,
    pub title: String,
    pub dwg_file: String,
    pub icon: Option<String>,
    pub status: ActiveStatus,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Citizen feedback and the administration's reply.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub admin_reply: Option<String>,
    pub status: FeedbackStatus,
    pub replied_at: Option<DateTime<Utc>>,
    pub replied_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The single site-configuration row.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Setting {
    pub id: i64,
    pub site_name: String,
    pub site_logo: Option<String>,
    pub site_favicon: Option<String>,
    pub footer_about: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_address: Option<String>,
    pub facebook_url: Option<String>,
    pub youtube_url: Option<String>,
    pub footer_copyright: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct About {
    pub id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_back_office_roles_sign_in() {
        assert!(UserRole::Admin.can_sign_in());
        assert!(UserRole::Editor.can_sign_in());
        assert!(!UserRole::User.can_sign_in());
    }

    #[test]
    fn feedback_filter_treats_all_as_unfiltered() {
        assert_eq!(FeedbackStatus::from_filter(Some("all")), None);
        assert_eq!(FeedbackStatus::from_filter(None), None);
        assert_eq!(
            FeedbackStatus::from_filter(Some("answered")),
            Some(FeedbackStatus::Answered)
        );
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&PostStatus::Published).unwrap(),
            "\"published\""
        );
        let parsed: UserRole = serde_json::from_str("\"editor\"").unwrap();
        assert_eq!(parsed, UserRole::Editor);
    }
}
