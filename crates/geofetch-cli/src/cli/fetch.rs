use clap::{Args, ValueEnum};
use geofetch::{GeoFetcher, HttpClient};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Output {
    /// One-line description
    #[default]
    Summary,
    /// The parsed document as JSON
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct FetchArg {
    /// URL of a TopoJSON or GeoJSON document
    pub url: String,

    /// Expected SRI digest, e.g. `sha384-<base64>`
    #[arg(long, short = 'i')]
    pub integrity: Option<String>,

    /// Refuse sources without an integrity record
    #[arg(long)]
    pub strict: bool,

    #[arg(long, short = 'o', value_enum, default_value_t)]
    pub output: Output,
}

impl FetchArg {
    pub async fn run<C: HttpClient + 'static>(&self, geo: &GeoFetcher<C>) -> anyhow::Result<()> {
        if let Some(sri) = &self.integrity {
            geo.registry().add_sri(&self.url, sri, true)?;
        }
        if self.strict {
            geo.registry().enable_strict();
        }

        let doc = geo.get_or_fetch(&self.url).await?;
        match self.output {
            Output::Summary => println!("{}: {}", self.url, doc.summary()),
            Output::Json => println!("{}", serde_json::to_string_pretty(&*doc)?),
        }
        Ok(())
    }
}
