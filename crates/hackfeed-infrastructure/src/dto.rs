//! Wire DTOs of the news API.
//!
//! The API speaks camelCase JSON. Responses are decoded leniently: fields the
//! client does not use are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hackfeed_core::model::{FavoriteRef, Identity, NewStory, Story};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub user: LoginUser<'a>,
}

#[derive(Debug, Serialize)]
pub struct LoginUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub user: SignupUser<'a>,
}

#[derive(Debug, Serialize)]
pub struct SignupUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

/// Body of requests authorized by token only.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateStoryRequest<'a> {
    pub token: &'a str,
    pub story: &'a NewStory,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub struct StoriesResponse {
    pub stories: Vec<StoryDto>,
}

#[derive(Debug, Deserialize)]
pub struct StoryResponse {
    pub story: StoryDto,
}

/// `{"error": {"message": ...}}` as sent with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Favorited stories; only their IDs are used.
    #[serde(default)]
    pub favorites: Vec<FavoriteDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteDto {
    pub story_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDto {
    pub story_id: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl UserDto {
    /// Builds the domain identity; the token comes from the response envelope
    /// or the request, never from the user object.
    pub fn into_identity(self, login_token: String) -> Identity {
        Identity {
            username: self.username,
            name: self.name,
            login_token,
            created_at: self.created_at.unwrap_or_default(),
            favorites: self.favorites.into_iter().map(|f| f.story_id).collect(),
        }
    }

    pub fn favorite_refs(&self) -> Vec<FavoriteRef> {
        self.favorites
            .iter()
            .map(|f| FavoriteRef::new(f.story_id.as_str()))
            .collect()
    }
}

impl From<StoryDto> for Story {
    fn from(dto: StoryDto) -> Self {
        Story {
            story_id: dto.story_id,
            title: dto.title,
            url: dto.url,
            author: dto.author,
            username: dto.username,
            created_at: dto.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_auth_response() {
        let json = r#"{
            "token": "tok",
            "user": {
                "username": "ada",
                "name": "Ada",
                "createdAt": "2020-02-13T21:46:54.617Z",
                "updatedAt": "2020-02-13T21:46:54.617Z",
                "favorites": [{"storyId": "s1", "title": "One"}, {"storyId": "s2"}],
                "ownStories": []
            }
        }"#;

        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let refs = response.user.favorite_refs();
        let identity = response.user.into_identity(response.token);

        assert_eq!(identity.login_token, "tok");
        assert_eq!(identity.name, "Ada");
        assert!(identity.favorites.contains("s2"));
        assert_eq!(refs, vec![FavoriteRef::new("s1"), FavoriteRef::new("s2")]);
        assert_eq!(identity.created_at.to_rfc3339(), "2020-02-13T21:46:54.617+00:00");
    }

    #[test]
    fn test_decode_story_without_timestamp() {
        let json = r#"{"story": {
            "storyId": "s7", "title": "T", "author": "Ada",
            "url": "http://x.com", "username": "ada"
        }}"#;

        let story: Story = serde_json::from_str::<StoryResponse>(json)
            .unwrap()
            .story
            .into();
        assert_eq!(story.story_id, "s7");
        assert!(story.created_at.is_none());
    }

    #[test]
    fn test_create_story_body_shape() {
        let story = NewStory {
            author: "Ada".into(),
            title: "T".into(),
            url: "http://x.com".into(),
        };
        let body = serde_json::to_value(CreateStoryRequest {
            token: "tok",
            story: &story,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "token": "tok",
                "story": {"author": "Ada", "title": "T", "url": "http://x.com"}
            })
        );
    }
}
