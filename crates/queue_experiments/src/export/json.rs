use crate::metrics::EpisodeResult;

pub(crate) fn export_to_json_impl(
    results: &[EpisodeResult],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}
