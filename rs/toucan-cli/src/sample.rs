use anyhow::Context;
use reqwest::Client;
use toucan::{BandwidthSampler, SamplerConfig, TransferListener};
use url::Url;

/// Download each URL in turn, feeding the transfer lifecycle into one bandwidth sampler.
pub async fn sample(config: SamplerConfig, urls: Vec<Url>) -> anyhow::Result<()> {
	let client = Client::builder()
		.user_agent(concat!("toucan/", env!("CARGO_PKG_VERSION")))
		.build()
		.context("failed to build HTTP client")?;

	let mut sampler = BandwidthSampler::from_config(&config);
	if let Some(err) = sampler.error() {
		tracing::warn!(%err, "bandwidth will be counted but not logged");
	}

	tracing::info!(path = %sampler.path().display(), "sampling bandwidth");

	for url in urls {
		sampler.on_transfer_start();
		let res = transfer(&client, &url, &mut sampler).await;
		sampler.on_transfer_end();

		res?;
		tracing::info!(%url, total = sampler.total_bytes(), "transfer complete");
	}

	println!("{}", sampler.path().display());
	Ok(())
}

async fn transfer(client: &Client, url: &Url, sampler: &mut impl TransferListener) -> anyhow::Result<()> {
	let mut response = client
		.get(url.clone())
		.send()
		.await
		.with_context(|| format!("failed to download {url}"))?
		.error_for_status()
		.with_context(|| format!("request for {url} failed"))?;

	while let Some(chunk) = response
		.chunk()
		.await
		.with_context(|| format!("failed to read body from {url}"))?
	{
		sampler.on_bytes_transferred(chunk.len() as u64);
	}

	Ok(())
}
