//! HTTP implementation of [`RemoteService`] for the news JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use hackfeed_core::error::RemoteError;
use hackfeed_core::model::{Credentials, FavoriteRef, Identity, NewStory, Story};
use hackfeed_core::remote::{RemoteResult, RemoteService};

use crate::config::ClientConfig;
use crate::dto::{
    AuthResponse, CreateStoryRequest, ErrorResponse, LoginRequest, LoginUser, SignupRequest,
    SignupUser, StoriesResponse, StoryResponse, TokenRequest, UserResponse,
};

/// Talks to the news API over HTTP with a per-request timeout.
///
/// Transport failures, timeouts included, come back as
/// [`RemoteError::Transport`]; non-success statuses are mapped by code.
#[derive(Clone)]
pub struct HttpRemoteService {
    client: Client,
    base_url: Url,
}

impl HttpRemoteService {
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RemoteError::Transport(format!("invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Transport(format!(
                "API URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> RemoteResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("'{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> RemoteResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, path = url.path(), "News API request");
        Ok(self.client.request(method, url))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                RemoteError::Decode(e.to_string())
            } else {
                transport_error(e)
            }
        })
    }

    async fn execute_empty(&self, request: RequestBuilder) -> RemoteResult<()> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn authenticate(&self, username: &str, password: &str) -> RemoteResult<Identity> {
        let body = LoginRequest {
            user: LoginUser { username, password },
        };
        let response: AuthResponse = self
            .execute(self.request(Method::POST, &["login"])?.json(&body))
            .await?;
        Ok(response.user.into_identity(response.token))
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> RemoteResult<Identity> {
        let body = SignupRequest {
            user: SignupUser {
                username,
                password,
                name,
            },
        };
        let response: AuthResponse = self
            .execute(self.request(Method::POST, &["signup"])?.json(&body))
            .await?;
        Ok(response.user.into_identity(response.token))
    }

    async fn resolve_identity(&self, token: &str, username: &str) -> RemoteResult<Identity> {
        let request = self
            .request(Method::GET, &["users", username])?
            .query(&[("token", token)]);
        let response: UserResponse = self.execute(request).await?;
        Ok(response.user.into_identity(token.to_string()))
    }

    async fn list_stories(&self) -> RemoteResult<Vec<Story>> {
        let response: StoriesResponse = self
            .execute(self.request(Method::GET, &["stories"])?)
            .await?;
        Ok(response.stories.into_iter().map(Story::from).collect())
    }

    async fn create_story(
        &self,
        credentials: &Credentials,
        story: &NewStory,
    ) -> RemoteResult<Story> {
        let body = CreateStoryRequest {
            token: &credentials.token,
            story,
        };
        let response: StoryResponse = self
            .execute(self.request(Method::POST, &["stories"])?.json(&body))
            .await?;
        Ok(response.story.into())
    }

    async fn delete_story(&self, credentials: &Credentials, story_id: &str) -> RemoteResult<()> {
        let body = TokenRequest {
            token: &credentials.token,
        };
        self.execute_empty(
            self.request(Method::DELETE, &["stories", story_id])?
                .json(&body),
        )
        .await
    }

    async fn add_favorite(
        &self,
        credentials: &Credentials,
        story_id: &str,
    ) -> RemoteResult<Vec<FavoriteRef>> {
        self.favorite(Method::POST, credentials, story_id).await
    }

    async fn remove_favorite(
        &self,
        credentials: &Credentials,
        story_id: &str,
    ) -> RemoteResult<Vec<FavoriteRef>> {
        self.favorite(Method::DELETE, credentials, story_id).await
    }
}

impl HttpRemoteService {
    async fn favorite(
        &self,
        method: Method,
        credentials: &Credentials,
        story_id: &str,
    ) -> RemoteResult<Vec<FavoriteRef>> {
        let body = TokenRequest {
            token: &credentials.token,
        };
        let request = self
            .request(
                method,
                &["users", credentials.username.as_str(), "favorites", story_id],
            )?
            .json(&body);
        let response: UserResponse = self.execute(request).await?;
        Ok(response.user.favorite_refs())
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Transport(format!("request timed out: {}", err))
    } else {
        RemoteError::Transport(err.to_string())
    }
}

/// Maps a non-success status to the typed error, preferring the server's
/// own message when the body carries one.
fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|r| r.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(message),
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        StatusCode::CONFLICT => RemoteError::Conflict(message),
        other => RemoteError::Rejected {
            status: other.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> HttpRemoteService {
        HttpRemoteService::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":{"status":401,"message":"Invalid password"}}"#;
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, body),
            RemoteError::Unauthorized("Invalid password".into())
        );
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, ""),
            RemoteError::NotFound(m) if m == "Not Found"
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "{}"),
            RemoteError::Conflict(_)
        ));
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>"),
            RemoteError::Rejected {
                status: 500,
                message: "Internal Server Error".into()
            }
        );
    }

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let remote = service("http://localhost:5000/api/");
        let url = remote.endpoint(&["users", "a b", "favorites", "s1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/users/a%20b/favorites/s1");

        let remote = service("http://localhost:5000");
        assert_eq!(
            remote.endpoint(&["stories"]).unwrap().as_str(),
            "http://localhost:5000/stories"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpRemoteService::new("not a url", Duration::from_secs(1)),
            Err(RemoteError::Transport(_))
        ));
        assert!(HttpRemoteService::new("mailto:a@b.c", Duration::from_secs(1)).is_err());
    }
}
