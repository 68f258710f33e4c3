//! 🔐 Credentials - who are we, and why does AWS believe us?
//!
//! Two ways in. `Ambient` trusts whatever the environment hands the SDK
//! (env vars, instance profile, ECS task role, the usual suspects).
//! `AssumedRole` starts from a named shared-credentials profile on a laptop and
//! then asks STS to become someone more important. Like a badge upgrade at a conference.
//!
//! 🦆 The duck has read-only access.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_config::sts::AssumeRoleProvider;
use tracing::info;

/// 🏷️ Session name STS stamps on the assumed-role session. Shows up in CloudTrail.
/// Future you, grepping CloudTrail at 3am, will thank present you.
const ASSUMED_ROLE_SESSION_NAME: &str = "tipoff-relay";

/// 🎭 How the sinks get their AWS credentials. Chosen once at startup, then injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// ☁️ Default provider chain. Production mode. No questions asked.
    Ambient,
    /// 💻 Local dev: shared profile → STS AssumeRole → the role's credentials.
    AssumedRole { profile: String, role_arn: String },
}

impl CredentialStrategy {
    /// 🔧 Resolve the strategy into an `SdkConfig` pinned to `region`.
    ///
    /// Nothing here hits the network for `Ambient`; credentials are resolved lazily on first use.
    /// `AssumedRole` builds the STS provider up front. Failures still surface lazily,
    /// on the first `PutRecord`, which the relay logs like any other sink failure.
    pub async fn load_sdk_config(&self, region: &str) -> SdkConfig {
        let the_region = Region::new(region.to_owned());
        match self {
            CredentialStrategy::Ambient => {
                info!("☁️ Using ambient AWS credentials in region {}", region);
                aws_config::defaults(BehaviorVersion::latest())
                    .region(the_region)
                    .load()
                    .await
            }
            CredentialStrategy::AssumedRole { profile, role_arn } => {
                info!(
                    "💻 Using shared profile '{}' to assume role '{}' in region {}",
                    profile, role_arn, region
                );
                let the_base_config = aws_config::defaults(BehaviorVersion::latest())
                    .profile_name(profile)
                    .region(the_region.clone())
                    .load()
                    .await;

                let the_assumed_role = AssumeRoleProvider::builder(role_arn)
                    .session_name(ASSUMED_ROLE_SESSION_NAME)
                    .configure(&the_base_config)
                    .build()
                    .await;

                aws_config::defaults(BehaviorVersion::latest())
                    .region(the_region)
                    .credentials_provider(the_assumed_role)
                    .load()
                    .await
            }
        }
    }
}
