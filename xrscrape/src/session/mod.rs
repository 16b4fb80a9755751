//! Sessions: one operation per command family.
//!
//! [`DeviceSession`] drives the router, optionally through a bastion relay,
//! and [`ServerSession`] drives the bastion server itself.

mod builder;
mod device;
mod server;

pub use builder::SessionBuilder;
pub use device::DeviceSession;
pub use server::ServerSession;

use std::sync::LazyLock;

use regex::bytes::Regex;
use secrecy::SecretString;

/// Password prompt of `scp` on both IOS-XR (`Password:`) and Linux (`user@host's password:`).
static PASSWORD_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)password:\s*$").expect("static password prompt pattern")
});

/// One SCP transfer, run on the remote shell.
#[derive(Debug)]
pub struct ScpRequest {
    /// Path on the host the shell runs on.
    pub local_path: String,
    /// Path on the far host.
    pub remote_path: String,
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// VRF for device-side transfers.
    pub vrf: Option<String>,
}

impl ScpRequest {
    pub fn new(
        local_path: impl Into<String>,
        remote_path: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            host: host.into(),
            username: username.into(),
            password,
            vrf: None,
        }
    }

    pub fn with_vrf(mut self, vrf: impl Into<String>) -> Self {
        self.vrf = Some(vrf.into());
        self
    }

    /// `scp user@host:remote [vrf v] local`
    pub(crate) fn download_command(&self) -> String {
        let source = format!("{}@{}:{}", self.username, self.host, self.remote_path);
        match &self.vrf {
            Some(vrf) => format!("scp {source} vrf {vrf} {}", self.local_path),
            None => format!("scp {source} {}", self.local_path),
        }
    }

    /// `scp local user@host:remote`
    pub(crate) fn upload_command(&self) -> String {
        format!(
            "scp {} {}@{}:{}",
            self.local_path, self.username, self.host, self.remote_path
        )
    }
}

/// `base` followed by each package, space-separated.
fn with_packages(base: &str, packages: &[&str], suffix: &str) -> String {
    let mut command = base.to_string();
    for package in packages {
        command.push(' ');
        command.push_str(package);
    }
    command.push(' ');
    command.push_str(suffix);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ScpRequest {
        ScpRequest::new("harddisk:/img.iso", "/srv/img.iso", "10.0.0.5", "ops", "pw".into())
    }

    #[test]
    fn test_download_command() {
        assert_eq!(
            request().download_command(),
            "scp ops@10.0.0.5:/srv/img.iso harddisk:/img.iso"
        );
        assert_eq!(
            request().with_vrf("MGMT").download_command(),
            "scp ops@10.0.0.5:/srv/img.iso vrf MGMT harddisk:/img.iso"
        );
    }

    #[test]
    fn test_upload_command() {
        assert_eq!(
            request().upload_command(),
            "scp harddisk:/img.iso ops@10.0.0.5:/srv/img.iso"
        );
    }

    #[test]
    fn test_password_prompt() {
        assert!(PASSWORD_PROMPT.is_match(b"Password: "));
        assert!(PASSWORD_PROMPT.is_match(b"ops@10.0.0.5's password:"));
        assert!(!PASSWORD_PROMPT.is_match(b"Password accepted\n"));
    }

    #[test]
    fn test_with_packages() {
        assert_eq!(
            with_packages("install remove inactive", &[], "synchronous"),
            "install remove inactive synchronous"
        );
        assert_eq!(
            with_packages("install add source harddisk:", &["a.rpm", "b.rpm"], "synchronous"),
            "install add source harddisk: a.rpm b.rpm synchronous"
        );
    }
}
