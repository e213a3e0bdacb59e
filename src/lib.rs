mod compiler;
mod convert;
mod invocation;

use anyhow::{Context, Result};
use log::debug;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::ExitStatus;

pub use compiler::{command, shell_line, Launch};
pub use convert::{Convert, Transcoder};
pub use invocation::{Invocation, InvocationError, BUILD_DIR_DEFINE, CC_DEFINE};

/// Writes the converted copy of the invocation's source into the build
/// directory.
pub fn convert_source(invocation: &Invocation, converter: &impl Convert) -> Result<()> {
    let Invocation { source, build_dir, output, .. } = invocation;

    let bytes = fs::read(source).with_context(|| format!("Failed to read `{source}`."))?;
    let text = String::from_utf8(bytes).with_context(|| format!("`{source}` is not valid UTF-8."))?;

    // Subdirectories of the source path are created, the build directory is not.
    if let Some(parent) = Path::new(output).parent() {
        if Path::new(build_dir).is_dir() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create `{}`.", parent.display()))?;
        }
    }

    let file = File::create(output).with_context(|| format!("Failed to create `{output}`."))?;
    let mut writer = BufWriter::new(file);
    converter
        .convert(&text, &mut writer)
        .with_context(|| format!("Failed to convert `{source}`."))?;
    writer.flush().with_context(|| format!("Failed to write `{output}`."))?;

    debug!("converted {source} ({} bytes) into {output}", text.len());
    Ok(())
}

/// Converts the source named by `args` and runs the real compiler on the copy.
pub fn wrap(args: Vec<String>, converter: &impl Convert, launch: Launch) -> Result<ExitStatus> {
    let invocation = Invocation::parse(args)?;
    debug!(
        "source {}, compiler {}, build directory {}",
        invocation.source, invocation.compiler, invocation.build_dir
    );

    convert_source(&invocation, converter)?;
    compiler::run(&invocation, launch)
}
