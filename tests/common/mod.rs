use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use uuid::Uuid;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/stores-api");
        cmd.env("STORES_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL and JWT_SECRET
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Tests that need a live database skip early when DATABASE_URL is unset.
pub fn db_configured() -> bool {
    if std::env::var("DATABASE_URL").is_ok() {
        true
    } else {
        eprintln!("skipping: DATABASE_URL not set");
        false
    }
}

/// Unique name so reruns against a persistent database don't collide
pub fn unique(name: &str) -> String {
    format!("{}-{}", name, Uuid::new_v4().simple())
}

pub struct TestUser {
    #[allow(dead_code)]
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Register a fresh user and log in, optionally promoting it to admin
/// first. Promotion writes the users row directly since the API has no
/// privilege-granting endpoint.
pub async fn signup(server: &TestServer, admin: bool) -> Result<TestUser> {
    let client = reqwest::Client::new();
    let username = unique("user");
    let password = "hunter2-integration";

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "register failed: {}",
        res.status()
    );

    if admin {
        let url = std::env::var("DATABASE_URL")?;
        let pool = sqlx::postgres::PgPool::connect(&url).await?;
        sqlx::query("UPDATE users SET is_admin = TRUE WHERE username = $1")
            .bind(&username)
            .execute(&pool)
            .await?;
    }

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::OK,
        "login failed: {}",
        res.status()
    );
    let body: serde_json::Value = res.json().await?;

    Ok(TestUser {
        username,
        access_token: body["access_token"]
            .as_str()
            .context("missing access_token")?
            .to_string(),
        refresh_token: body["refresh_token"]
            .as_str()
            .context("missing refresh_token")?
            .to_string(),
    })
}

/// Create a store via the API, returning its id
pub async fn create_store(server: &TestServer, token: &str, name: &str) -> Result<i32> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/store", server.base_url))
        .bearer_auth(token)
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "store create failed: {}",
        res.status()
    );
    let body: serde_json::Value = res.json().await?;
    body["id"].as_i64().map(|v| v as i32).context("missing id")
}
