use std::sync::Once;

use blog_core::server::{Server, ServerHandle};
use blog_core::{build_application_state, run};
use blog_server::configuration::{ApplicationProfile, Config};
use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;

pub struct TestApi {
    pub api_address: String,
    pub api_client: reqwest::Client,
    #[allow(dead_code)]
    server_handle: ServerHandle,
}

impl TestApi {
    pub async fn spawn() -> Self {
        Self::init_telemetry();
        let config = Self::get_config();

        let application_state = build_application_state(&config.app)
            .await
            .expect("Failed to build the application state");

        let tcp_listener = config
            .server
            .listener()
            .await
            .expect("Failed to bind the server TCP listener");
        let address = tcp_listener
            .local_addr()
            .expect("The server TCP listener doesn't have a local socket address");
        let server_builder = Server::new().listen(tcp_listener);
        let server_handle = run(server_builder, application_state);

        TestApi {
            api_address: format!("http://{}:{}", config.server.ip, address.port()),
            // Redirects are part of what we are testing: don't follow them.
            api_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to build the HTTP client"),
            server_handle,
        }
    }

    /// Every test server listens on a random port and uses its own
    /// in-memory database, see `configuration/test.yml`.
    fn get_config() -> Config {
        Config::load(Some(ApplicationProfile::Test)).expect("Failed to load test configuration")
    }

    fn init_telemetry() {
        // Initialize the telemetry setup at most once.
        static INIT_TELEMETRY: Once = Once::new();
        INIT_TELEMETRY.call_once(|| {
            // Only enable the telemetry if the `TEST_LOG` environment variable is set.
            if std::env::var("TEST_LOG").is_ok() {
                let subscriber = tracing_subscriber::fmt::Subscriber::builder()
                    .with_env_filter(
                        EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info")),
                    )
                    .finish();
                // We don't redirect panic messages to the `tracing` subsystem because
                // we want to see them in the test output.
                set_global_default(subscriber).expect("Failed to set a `tracing` global subscriber")
            }
        });
    }
}

/// Convenient methods for calling the API under test.
impl TestApi {
    pub async fn get_ping(&self) -> reqwest::Response {
        self.get("/api/ping").await
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", &self.api_address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", &self.api_address, path))
            .form(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_html(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status().as_u16(), 200, "GET {path}");
        response.text().await.expect("Failed to read the response body")
    }

    /// Create an article and return the path it was redirected to.
    pub async fn create_article(&self, title: &str, author: &str, body: &str) -> String {
        let response = self
            .post_form(
                "/articles",
                &[("title", title), ("author", author), ("body", body)],
            )
            .await;
        assert_eq!(response.status().as_u16(), 302);
        location(&response)
    }
}

pub fn location(response: &reqwest::Response) -> String {
    response.headers()["location"]
        .to_str()
        .expect("The location header is not valid UTF-8")
        .to_owned()
}
