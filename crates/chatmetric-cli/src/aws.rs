use crate::config::CredentialSource;

/// Account and principal behind the configured credentials.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
}

/// Build an `SdkConfig` from a region and credential source.
pub async fn build_aws_config(region: &str, creds: &CredentialSource) -> aws_config::SdkConfig {
    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));

    match creds {
        CredentialSource::Inline {
            access_key_id,
            secret_access_key,
            session_token,
        } => {
            builder = builder.credentials_provider(aws_sdk_sts::config::Credentials::new(
                access_key_id,
                secret_access_key,
                session_token.clone(),
                None,
                "chatmetric-config",
            ));
        }
        CredentialSource::Profile { profile_name } => {
            builder = builder.profile_name(profile_name);
        }
        CredentialSource::DefaultChain => {}
    }

    builder.load().await
}

/// Call STS GetCallerIdentity to validate credentials.
pub async fn validate_credentials(config: &aws_config::SdkConfig) -> eyre::Result<CallerIdentity> {
    let sts = aws_sdk_sts::Client::new(config);
    let resp = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| eyre::eyre!("STS GetCallerIdentity failed: {e}"))?;

    Ok(CallerIdentity {
        account_id: resp.account().unwrap_or_default().to_string(),
        arn: resp.arn().unwrap_or_default().to_string(),
    })
}
