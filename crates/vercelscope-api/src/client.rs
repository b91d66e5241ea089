use anyhow::{Context, Result};
use serde::Deserialize;

use vercelscope_types::{Deployment, LogEvent, Project};

const DEFAULT_BASE_URL: &str = "https://api.vercel.com";

/// How many deployments to request per listing call
const DEPLOYMENTS_LIMIT: u32 = 100;

/// Query parameters for the deployment events endpoint
#[derive(Clone, Debug, Default)]
pub struct EventsQuery {
    /// Hold the connection open and stream new events as they occur
    pub follow: bool,
    /// Lower-bound timestamp (epoch ms) for resuming a live tail
    pub since: Option<i64>,
}

impl EventsQuery {
    /// Bounded historical fetch: no follow, unbounded page size
    pub fn historical() -> Self {
        Self {
            follow: false,
            since: None,
        }
    }

    /// Live tail resuming after `since` (omitted unless positive)
    pub fn live(since: Option<i64>) -> Self {
        Self {
            follow: true,
            since,
        }
    }

    /// Assemble the query pairs sent to the endpoint
    ///
    /// `since` is dropped entirely unless it is a positive value so the
    /// remote endpoint never receives a meaningless bound.
    pub fn to_pairs(&self, team_id: Option<&str>) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("follow".to_string(), if self.follow { "1" } else { "0" }.to_string()),
            ("limit".to_string(), "-1".to_string()),
        ];

        if let Some(team_id) = team_id {
            pairs.push(("teamId".to_string(), team_id.to_string()));
        }

        if let Some(since) = self.since.filter(|s| *s > 0) {
            pairs.push(("since".to_string(), since.to_string()));
        }

        pairs
    }
}

#[derive(Deserialize)]
struct ProjectsResponse {
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct DeploymentsResponse {
    deployments: Vec<Deployment>,
}

/// Vercel API client
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct VercelClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    team_id: Option<String>,
}

impl VercelClient {
    /// Create a new client with the given bearer credential
    ///
    /// No request timeout is set: the live tail holds its connection open
    /// until cancelled, so only connection establishment is bounded.
    pub fn new(token: String, team_id: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            team_id,
        })
    }

    /// Override the API base URL (used by tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Team identifier this client is scoped to, if any
    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn team_pairs(&self) -> Vec<(String, String)> {
        match &self.team_id {
            Some(team_id) => vec![("teamId".to_string(), team_id.clone())],
            None => Vec::new(),
        }
    }

    /// Check that the bearer credential is accepted by the API
    pub async fn validate_token(&self) -> Result<()> {
        self.http
            .get(self.url("/v2/user"))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach the Vercel API")?
            .error_for_status()
            .context("Token rejected by the Vercel API")?;
        Ok(())
    }

    /// Fetch all projects visible to this credential
    pub async fn get_projects(&self) -> Result<Vec<Project>> {
        let response: ProjectsResponse = self
            .http
            .get(self.url("/v9/projects"))
            .query(&self.team_pairs())
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to fetch projects")?
            .error_for_status()
            .context("Project listing request failed")?
            .json()
            .await
            .context("Failed to decode project listing")?;

        Ok(response.projects)
    }

    /// Fetch recent deployments for a project
    pub async fn get_deployments(&self, project_id: &str) -> Result<Vec<Deployment>> {
        let mut pairs = vec![
            ("projectId".to_string(), project_id.to_string()),
            ("limit".to_string(), DEPLOYMENTS_LIMIT.to_string()),
        ];
        pairs.extend(self.team_pairs());

        let response: DeploymentsResponse = self
            .http
            .get(self.url("/v6/deployments"))
            .query(&pairs)
            .bearer_auth(&self.token)
            .send()
            .await
            .context(format!("Failed to fetch deployments for {}", project_id))?
            .error_for_status()
            .context("Deployment listing request failed")?
            .json()
            .await
            .context("Failed to decode deployment listing")?;

        Ok(response.deployments)
    }

    /// Fetch all historical build log events for a deployment
    ///
    /// Elements that are not JSON objects (or do not fit the event shape)
    /// are filtered out rather than failing the whole batch.
    pub async fn get_deployment_events(&self, uid: &str) -> Result<Vec<LogEvent>> {
        let body: serde_json::Value = self
            .http
            .get(self.url(&format!("/v3/deployments/{}/events", uid)))
            .query(&EventsQuery::historical().to_pairs(self.team_id()))
            .bearer_auth(&self.token)
            .send()
            .await
            .context(format!("Failed to fetch logs for {}", uid))?
            .error_for_status()
            .context("Log events request failed")?
            .json()
            .await
            .context("Failed to decode log events")?;

        let Some(items) = body.as_array() else {
            return Ok(Vec::new());
        };

        let events = items
            .iter()
            .filter(|v| v.is_object())
            .filter_map(|v| match serde_json::from_value(v.clone()) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::debug!("Skipping malformed historical event: {}", e);
                    None
                }
            })
            .collect();

        Ok(events)
    }

    /// Open the live tail for a deployment's build log events
    ///
    /// Returns the raw response; the caller consumes its body incrementally
    /// and drops it to close the connection.
    pub async fn stream_deployment_events(
        &self,
        uid: &str,
        since: Option<i64>,
    ) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(self.url(&format!("/v3/deployments/{}/events", uid)))
            .query(&EventsQuery::live(since).to_pairs(self.team_id()))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/stream+json")
            .send()
            .await
            .context(format!("Failed to open log stream for {}", uid))?
            .error_for_status()
            .context("Log stream request failed")?;

        Ok(response)
    }
}
