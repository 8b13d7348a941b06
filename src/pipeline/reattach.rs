use super::sibling_temp_file;
use crate::error::{MergeError, Result};
use crate::ffmpeg::Toolchain;
use crate::ffmpeg::process::Invocation;
use std::path::Path;
use tracing::debug;

/// Replace the tags, chapters and cover of an existing output without re-encoding.
///
/// The new file is written next to `output` and renamed over it only on
/// success; on failure the temporary file is removed and `output` is untouched.
pub fn reattach(
    tools: &Toolchain,
    metadata_file: &Path,
    album_art: Option<&Path>,
    output: &Path,
    format: &str,
) -> Result<()> {
    let extension = output
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let temp = sibling_temp_file(output, &extension)?.into_temp_path();

    let mut cmd = tools.ffmpeg_command();
    cmd.set_format(format);
    cmd.add_mapped_input(output, 0);
    cmd.add_metadata_input(metadata_file);
    if let Some(art) = album_art {
        cmd.add_album_art(art, 0);
    }
    cmd.add_args(["-codec", "copy"]);
    cmd.set_output(temp.as_os_str(), true);

    // Dropping `temp` on either error path deletes it.
    Invocation::new(&cmd).capture_stdout(false).run_checked()?;
    temp.persist(output)
        .map_err(|e| MergeError::Io(e.error))?;

    debug!(output = %output.display(), "metadata reattached");
    Ok(())
}
