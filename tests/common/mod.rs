use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

// Cheap cost keeps provisioning fast; verification reads the cost embedded
// in the hash, so the server accepts these credentials unchanged.
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestServer {
    #[allow(dead_code)]
    pub port: u16,
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
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_surgery-api"));
        cmd.env("SURGERY_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
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
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Spawn (once per test binary) and return the shared server, or None when
/// DATABASE_URL is not set so DB-backed suites skip instead of failing.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(None);
    }

    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(Some(server))
}

/// Insert (or rotate) a credential row directly, the way the provisioning
/// CLI would.
pub async fn provision_user(username: &str, password: &str) -> Result<()> {
    let pool = surgery_api::database::connect().await?;
    surgery_api::database::ensure_schema(&pool).await?;
    let hash = surgery_api::auth::password::hash_password_with_cost(password, TEST_BCRYPT_COST)?;
    surgery_api::services::users::upsert(&pool, username, &hash).await?;
    Ok(())
}

/// Exchange credentials for a bearer token via POST /token.
pub async fn login(base_url: &str, username: &str, password: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/token", base_url))
        .form(&[("username", username), ("password", password)])
        .send()
        .await?;

    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    let token = body["access_token"]
        .as_str()
        .context("access_token missing from login response")?
        .to_string();
    Ok(token)
}
