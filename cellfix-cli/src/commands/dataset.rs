//! Dataset command - build shard files.

use std::path::Path;

use cellfix::dataset::{read_entries, ShardWriter};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Pack a JSON entry list into `<out_dir>/<digit>/<file name>` shards.
pub fn pack(runner: &CliRunner, input: &Path, out_dir: &Path) -> Result<(), CliError> {
    runner.log_startup("dataset pack");

    let entries = read_entries(input)?;
    let mut writer = ShardWriter::new().with_file_name(runner.config().dataset.file_name.clone());
    writer.extend(&entries);

    let written = writer.write_to(out_dir)?;
    println!(
        "Packed {} cells ({} entries read) into {} shard file(s):",
        writer.len(),
        entries.len(),
        written.len()
    );
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}
