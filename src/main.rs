use anyhow::Result;
use terraform_provider_buildkite::BuildkiteProvider;
use tf_provider::serve;

#[tokio::main]
async fn main() -> Result<()> {
    serve("buildkite", BuildkiteProvider::default()).await
}
