//! Lookup command - resolve one cell against the dataset.

use cellfix::cell::UniqueCellId;
use cellfix::dataset::CellLocationSource;

use super::common::TechnologyArg;
use crate::error::CliError;
use crate::runner::CliRunner;

pub struct LookupArgs {
    pub tech: TechnologyArg,
    pub cid: u32,
    pub lac: u32,
    pub mcc: u16,
    pub mnc: u16,
}

pub fn run(runner: &CliRunner, args: LookupArgs) -> Result<(), CliError> {
    runner.log_startup("lookup");
    let store = runner.store();
    let cell = UniqueCellId::new(args.tech.into(), args.cid, args.lac, args.mcc, args.mnc);

    let files = store.shard_files(cell.shard_digit())?;
    println!("Cell:   {}", cell);
    println!("Shards: {} file(s) for digit {}", files.len(), cell.shard_digit());

    match store.find(&cell) {
        Some(coords) => println!("Found:  {}", coords),
        None => println!("Not found in dataset"),
    }
    Ok(())
}
