use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle stage of a listed project.
///
/// Stored as text with a CHECK constraint; the wire representation matches the
/// stored value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow, ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    SeekingHelp,
    OfferingHelp,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::SeekingHelp => "seeking_help",
            ProjectStatus::OfferingHelp => "offering_help",
        }
    }
}

impl ToSql<Text, Pg> for ProjectStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for ProjectStatus {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        match std::str::from_utf8(value.as_bytes())? {
            "open" => Ok(ProjectStatus::Open),
            "seeking_help" => Ok(ProjectStatus::SeekingHelp),
            "offering_help" => Ok(ProjectStatus::OfferingHelp),
            other => Err(format!("Unknown project status: {}", other).into()),
        }
    }
}

/// A user's decision on a project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow, ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Like,
    Skip,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Like => "like",
            SwipeDirection::Skip => "skip",
        }
    }
}

impl ToSql<Text, Pg> for SwipeDirection {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for SwipeDirection {
    fn from_sql(value: PgValue<'_>) -> deserialize::Result<Self> {
        match std::str::from_utf8(value.as_bytes())? {
            "like" => Ok(SwipeDirection::Like),
            "skip" => Ok(SwipeDirection::Skip),
            other => Err(format!("Unknown swipe direction: {}", other).into()),
        }
    }
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::profiles)]
pub struct Profile {
    pub id: Uuid,
    #[schema(example = "Alice Example")]
    pub name: String,
    #[schema(example = "Berlin")]
    pub location: Option<String>,
    #[schema(example = "Building small tools for indie founders")]
    pub about: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert-or-update payload for the onboarding profile upsert.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::profiles)]
pub struct ProfileUpsert {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub about: Option<String>,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::projects)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Plant-watering reminder bot")]
    pub title: String,
    #[schema(example = "Telegram bot that nags you before your ficus dies")]
    pub teaser: Option<String>,
    #[schema(example = json!(["DevTools", "IoT"]))]
    pub categories: Vec<String>,
    pub status: ProjectStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::projects)]
pub struct NewProject {
    pub owner_id: Uuid,
    pub title: String,
    pub teaser: Option<String>,
    pub categories: Vec<String>,
    pub status: ProjectStatus,
}

/// Owner-supplied edits; only present fields are written.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = crate::schema::projects)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub teaser: Option<Option<String>>,
    pub categories: Option<Vec<String>>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::swipes)]
pub struct Swipe {
    pub id: Uuid,
    pub swiper_id: Uuid,
    pub project_id: Uuid,
    pub direction: SwipeDirection,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::swipes)]
pub struct NewSwipe {
    pub swiper_id: Uuid,
    pub project_id: Uuid,
    pub direction: SwipeDirection,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::matches)]
pub struct Match {
    pub id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub project_id: Uuid,
    pub created_at: NaiveDateTime,
}

/// Match rows store the pair normalized (`user_a_id < user_b_id`) so the
/// unordered-pair uniqueness from the data model is a plain unique constraint.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::matches)]
pub struct NewMatch {
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub project_id: Uuid,
}

impl NewMatch {
    pub fn for_pair(user_a: Uuid, user_b: Uuid, project_id: Uuid) -> Self {
        let (user_a_id, user_b_id) = if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        Self {
            user_a_id,
            user_b_id,
            project_id,
        }
    }
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::messages)]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::messages)]
pub struct NewMessage {
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_status_wire_strings() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::SeekingHelp).unwrap(),
            "\"seeking_help\""
        );
        assert_eq!(
            serde_json::from_str::<ProjectStatus>("\"offering_help\"").unwrap(),
            ProjectStatus::OfferingHelp
        );
        assert_eq!(ProjectStatus::Open.as_str(), "open");
    }

    #[test]
    fn swipe_direction_wire_strings() {
        assert_eq!(
            serde_json::to_string(&SwipeDirection::Like).unwrap(),
            "\"like\""
        );
        assert_eq!(
            serde_json::from_str::<SwipeDirection>("\"skip\"").unwrap(),
            SwipeDirection::Skip
        );
    }

    #[test]
    fn match_pair_is_normalized() {
        let a = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let b = Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();
        let p = Uuid::new_v4();

        let m1 = NewMatch::for_pair(a, b, p);
        let m2 = NewMatch::for_pair(b, a, p);

        assert_eq!(m1.user_a_id, a);
        assert_eq!(m1.user_b_id, b);
        assert_eq!(m2.user_a_id, a);
        assert_eq!(m2.user_b_id, b);
    }
}
