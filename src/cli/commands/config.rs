//! Configuration commands: `ls`, `get`, `cp`, `rm` and `validate`.
//!
//! Every source is an explicit candidate, so a missing or unreadable file
//! fails the command instead of falling back. Store sources need a live
//! connection, which the binary does not have; they fail with the
//! missing-connection error.

use crate::cli::args::{CpArgs, GetArgs, LoadArgs, LsArgs, RmArgs, ValidateArgs};
use crate::error::{Result, TreeError};
use crate::root::{Root, RootOptions};
use crate::source::Source;
use crate::template::SchemaDocument;

fn load(args: &LoadArgs) -> Result<Root> {
    let mut options = RootOptions::new().source(args.source.clone());
    if let Some(schema) = &args.schema {
        options = options.schema(SchemaDocument::from_file(schema)?.into_generator());
    }
    Root::init(options)
}

/// Print the outline (or the child paths) of a configuration.
///
/// # Errors
///
/// Returns an error if loading or validation fails.
pub fn ls(args: &LsArgs) -> Result<()> {
    let tree = load(&args.load)?.tree();
    if !args.paths {
        println!("{tree}");
        return Ok(());
    }
    if tree.node(&args.under).is_none() {
        return Err(TreeError::NotFound {
            path: args.under.clone(),
        }
        .into());
    }
    let paths = if args.attributes {
        tree.list_attributes(&args.under, true)
    } else {
        tree.list_nodes(&args.under, true)
    };
    for path in paths {
        println!("{path}");
    }
    Ok(())
}

/// Print the plain projection at a path as JSON.
///
/// # Errors
///
/// Returns [`TreeError::NotFound`] if nothing lives at the path.
pub fn get(args: &GetArgs) -> Result<()> {
    let tree = load(&args.load)?.tree();
    let item = tree.get(&args.path).ok_or_else(|| TreeError::NotFound {
        path: args.path.clone(),
    })?;
    println!("{}", serde_json::to_string_pretty(&item.to_json())?);
    Ok(())
}

/// Load, validate and write to a destination file.
///
/// # Errors
///
/// Returns an error if loading fails, the destination exists without
/// `--force`, or the destination format cannot hold the tree.
pub fn cp(args: &CpArgs) -> Result<()> {
    let root = load(&args.load)?;
    let destination = Source::parse(&args.destination);
    root.save(&destination, args.force)?;
    tracing::info!(source = %args.load.source, destination = %destination, "configuration copied");
    Ok(())
}

/// Remove a configuration file.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be removed.
pub fn rm(args: &RmArgs) -> Result<()> {
    let source = Source::parse(&args.source);
    source.remove(None)?;
    tracing::info!(source = %source, "configuration removed");
    Ok(())
}

/// Validate a configuration against a schema document.
///
/// # Errors
///
/// Returns the first validation failure.
pub fn validate(args: &ValidateArgs, quiet: bool) -> Result<()> {
    load(&LoadArgs {
        source: args.source.clone(),
        schema: Some(args.schema.clone()),
    })?;
    if !quiet {
        println!("{} is valid", args.source);
    }
    Ok(())
}
