use anyhow::Context;
use std::io::Write;

use sdkforge_core::io::{read_artifact_set, verify_artifact};
use sdkforge_core::SdkForgeError;

use super::super::args::DumpTocArgs;
use crate::exit_codes;

pub fn run(args: DumpTocArgs) -> anyhow::Result<i32> {
    let contents = read_artifact_set(&args.artifacts)?;

    if args.verify {
        for (path, bytes) in &contents.apks {
            let verified = verify_artifact(bytes, None).map_err(|e| {
                SdkForgeError::Signing(anyhow::Error::new(e).context(format!("'{path}'")))
            })?;
            eprintln!(
                "{path}: signature OK (key_id {}, {} entries)",
                verified.key_id, verified.entry_count
            );
        }
    }

    let json = contents.toc.to_json().context("failed to serialize toc")?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&json)?;
    writeln!(stdout)?;
    Ok(exit_codes::EXIT_SUCCESS)
}
