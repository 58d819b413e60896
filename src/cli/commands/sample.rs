//! `conftree sample`: sample configuration for a schema document.

use crate::cli::args::SampleArgs;
use crate::error::Result;
use crate::template::SchemaDocument;
use crate::tree::Node;

/// Print a sample configuration with every default filled in.
///
/// Node sets whose names come from the configuration (`names_from`) have
/// no configuration to draw on here and are left out.
///
/// # Errors
///
/// Returns an error if the schema cannot be read or the template cannot be
/// rendered in the requested format.
pub fn run(args: &SampleArgs) -> Result<()> {
    let document = SchemaDocument::from_file(&args.schema)?;
    let template = document.generate(&Node::new("root"))?;
    print!("{}", template.sample(args.format.into())?);
    Ok(())
}
