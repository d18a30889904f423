//! # Service identity resolution.
//!
//! Derives the unique bus client id for a process. The id is either
//! supplied explicitly by the caller or composed as
//! `service__hostToken__randomToken`, where the host token comes from the
//! `HOSTNAME` environment variable (set in container environments) and
//! falls back to `non_docker_env_<random>` outside of one.
//!
//! Resolution never fails and runs exactly once, at construction; the
//! resulting identity is immutable for the process lifetime.

use rand::Rng;

/// Environment variable holding the host identity (set by container runtimes).
pub const HOST_ENV: &str = "HOSTNAME";

/// Environment variable the runtime exports the resolved client id into,
/// so out-of-process collaborators can read it.
pub const CLIENT_ID_ENV: &str = "CLIENT_ID";

/// Immutable identity of a running service instance.
///
/// Created once at process construction and used exactly once to configure
/// the bus connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceIdentity {
    service_name: String,
    client_id: String,
}

impl ServiceIdentity {
    /// Resolves the identity for `service_name`.
    ///
    /// An explicit `client_id` is taken unchanged; otherwise the id is
    /// derived as `service__host__rand(1..=1_000_000)`.
    pub fn resolve(service_name: &str, client_id: Option<&str>) -> Self {
        let client_id = match client_id {
            Some(explicit) => explicit.to_string(),
            None => derive_client_id(service_name),
        };
        Self {
            service_name: service_name.to_string(),
            client_id,
        }
    }

    /// Logical service name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Bus client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Exports the client id into [`CLIENT_ID_ENV`] so collaborators
    /// (including child processes) can read it.
    pub fn export(&self) {
        std::env::set_var(CLIENT_ID_ENV, &self.client_id);
    }
}

/// Composes `service__hostToken__randomToken`.
fn derive_client_id(service_name: &str) -> String {
    let mut rng = rand::rng();
    let host = std::env::var(HOST_ENV)
        .unwrap_or_else(|_| format!("non_docker_env_{}", rng.random_range(1..=1_000_000u32)));
    format!(
        "{}__{}__{}",
        service_name,
        host,
        rng.random_range(1..=1_000_000u32)
    )
}
