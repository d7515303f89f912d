use clap::Args;
use geofetch::{GeoFetcher, HttpClient};

#[derive(Clone, Debug, Args)]
pub struct CheckArg {
    /// URL to validate
    pub url: String,
}

impl CheckArg {
    pub fn run<C: HttpClient + 'static>(&self, geo: &GeoFetcher<C>) -> anyhow::Result<()> {
        geo.validate_url(&self.url)?;
        println!("ok: {}", self.url);
        Ok(())
    }
}
