//! Hierarchical configuration for the whole process.
use std::env::VarError;
use std::net::SocketAddr;

use anyhow::Context;
use blog_core::configuration::AppConfig;
use blog_core::server::IncomingStream;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};

#[derive(serde::Deserialize, Debug, Clone)]
/// The top-level configuration object, determining the schema
/// we expect to see in the configuration files stored under `blog_server/configuration`.
///
/// It bundles together the app configuration ([`AppConfig`]) and the
/// HTTP server configuration ([`ServerConfig`]).
pub struct Config {
    pub server: ServerConfig,
    #[serde(flatten)]
    pub app: AppConfig,
}

impl Config {
    /// Retrieve the configuration by merging multiple configuration sources.
    ///
    /// # Application profiles
    ///
    /// The desired profile is read from the `APP_PROFILE` environment variable.
    /// `default_profile` is used if the environment variable is not set.
    ///
    /// # Hierarchy
    ///
    /// The configuration sources are:
    ///
    /// 1. `base.yml` - The default values, common to all profiles.
    /// 2. `<profile>.yml` - The values specific to the desired profile.
    /// 3. Environment variables prefixed with `APP_`, using `__` as separator
    ///    for nested keys (e.g. `APP_DATABASE__URL`).
    ///
    /// Later sources override earlier ones.
    pub fn load(default_profile: Option<ApplicationProfile>) -> Result<Config, anyhow::Error> {
        let application_profile = ApplicationProfile::load(default_profile)
            .context("Failed to load the desired application profile")?;

        let configuration_dir = {
            let manifest_dir = env!(
                "CARGO_MANIFEST_DIR",
                "`CARGO_MANIFEST_DIR` was not set. Are you using a custom build system?"
            );
            std::path::Path::new(manifest_dir).join("configuration")
        };

        let base_filepath = configuration_dir.join("base.yml");
        let profile_filename = format!("{}.yml", application_profile.as_str());
        let profile_filepath = configuration_dir.join(profile_filename);

        let figment = Figment::new()
            .merge(Yaml::file(base_filepath))
            .merge(Yaml::file(profile_filepath))
            .merge(Env::prefixed("APP_").split("__"));

        let configuration: Config = figment
            .extract()
            .context("Failed to load hierarchical configuration")?;
        Ok(configuration)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
/// Configuration for the HTTP server.
pub struct ServerConfig {
    /// The port that the server must listen on.
    ///
    /// Set the `APP_SERVER__PORT` environment variable to override its value.
    #[serde(deserialize_with = "serde_aux::field_attributes::deserialize_number_from_string")]
    pub port: u16,
    /// The network interface that the server must be bound to.
    ///
    /// E.g. `0.0.0.0` for listening to incoming requests from
    /// all sources.
    pub ip: std::net::IpAddr,
    /// How long to wait for open connections to be closed when shutting down.
    ///
    /// E.g. `1 minute`.
    #[serde(with = "humantime_serde")]
    pub graceful_shutdown_timeout: std::time::Duration,
}

impl ServerConfig {
    /// Bind a TCP listener according to the specified parameters.
    pub async fn listener(&self) -> Result<IncomingStream, std::io::Error> {
        let addr = SocketAddr::new(self.ip, self.port);
        IncomingStream::bind(addr).await
    }
}

/// The type of environment the application is running in.
///
/// It determines which `<profile>.yml` file is loaded by [`Config::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationProfile {
    /// Used by the integration test suite.
    Test,
    /// Local development.
    Dev,
    /// Deployed environments, exposed to live traffic.
    Prod,
}

impl ApplicationProfile {
    /// Load the application profile from the `APP_PROFILE` environment variable.
    pub fn load(
        default_profile: Option<ApplicationProfile>,
    ) -> Result<ApplicationProfile, anyhow::Error> {
        static PROFILE_ENV_VAR: &str = "APP_PROFILE";

        match (std::env::var(PROFILE_ENV_VAR), default_profile) {
            (Ok(raw_value), _) => raw_value.parse().with_context(|| {
                format!("Failed to parse the `{PROFILE_ENV_VAR}` environment variable")
            }),
            (Err(VarError::NotPresent), Some(default_profile)) => Ok(default_profile),
            (Err(e), _) => Err(anyhow::anyhow!(e).context(format!(
                "Failed to read the `{PROFILE_ENV_VAR}` environment variable"
            ))),
        }
    }

    /// Return the profile as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationProfile::Test => "test",
            ApplicationProfile::Dev => "dev",
            ApplicationProfile::Prod => "prod",
        }
    }
}

impl std::str::FromStr for ApplicationProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(ApplicationProfile::Test),
            "dev" | "development" => Ok(ApplicationProfile::Dev),
            "prod" | "production" => Ok(ApplicationProfile::Prod),
            s => Err(anyhow::anyhow!(
                "`{}` is not a valid application profile.\nValid options are: `test`, `dev`, `prod`.",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApplicationProfile;

    #[test]
    fn profiles_are_case_insensitive() {
        assert_eq!("DEV".parse::<ApplicationProfile>().unwrap(), ApplicationProfile::Dev);
        assert_eq!(
            "Production".parse::<ApplicationProfile>().unwrap(),
            ApplicationProfile::Prod
        );
        assert_eq!("test".parse::<ApplicationProfile>().unwrap(), ApplicationProfile::Test);
    }

    #[test]
    fn unknown_profiles_are_rejected() {
        let err = "staging".parse::<ApplicationProfile>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "`staging` is not a valid application profile.\nValid options are: `test`, `dev`, `prod`."
        );
    }
}
