use aws_sdk_s3::Client;

/// Build an S3 client from an already-resolved AWS config.
pub fn build_client(config: &aws_config::SdkConfig) -> Client {
    Client::new(config)
}

/// Build an S3 client from the default credential chain and region.
pub async fn build_default_client() -> Client {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    Client::new(&config)
}
