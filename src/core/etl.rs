use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("--- Fetching all listings ---");

        let reports = self.pipeline.extract().await?;
        tracing::info!("Polled {} feeds", reports.len());

        let response = self.pipeline.transform(reports).await?;
        tracing::info!("Merged {} unique listings", response.total_listings);

        let output_path = self.pipeline.load(response).await?;
        tracing::info!("--- Done: snapshot saved to {} ---", output_path);

        Ok(output_path)
    }
}
